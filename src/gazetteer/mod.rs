//! Gazetteer assembly and the end-to-end build.

mod assemble;

pub use assemble::{assemble, explode, Assembly};

use tracing::info;

use crate::config::BuildConfig;
use crate::error::{Result, SchemaOverflow};
use crate::models::{GazetteerRow, GazetteerSchema, RawPlace, RawPolygon, Region};
use crate::pip::{RegionIndex, SpatialResolver};
use crate::place::PlaceNormalizer;
use crate::region::RegionNormalizer;

/// Output of a complete build.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    pub schema: GazetteerSchema,
    pub regions: Vec<Region>,
    pub rows: Vec<GazetteerRow>,
    pub overflow: SchemaOverflow,
}

/// Run the whole engine on in-memory polygon and place tables.
///
/// Fails without partial output on any geometry, id or lookup error.
pub fn build_gazetteer(
    polygons: Vec<RawPolygon>,
    places: Vec<RawPlace>,
    config: &BuildConfig,
) -> Result<Gazetteer> {
    info!("Building gazetteer");

    let regions = RegionNormalizer::new(config)?.build(polygons)?;
    let places = PlaceNormalizer::new(config).normalize(places);

    let index = RegionIndex::build(&regions);
    let resolved = SpatialResolver::new(&index).resolve(places)?;
    let Assembly { rows, overflow } = assemble(&resolved, &regions, config.columns)?;

    Ok(Gazetteer {
        schema: GazetteerSchema::new(config.columns),
        regions,
        rows,
        overflow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GazetteerError;
    use crate::models::region::{COUNTRY_LEVEL, REGION_LEVEL, SUBREGION_LEVEL};
    use geo::{polygon, MultiPolygon};

    fn rect(min: (f64, f64), max: (f64, f64)) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min.0, y: min.1),
            (x: max.0, y: min.1),
            (x: max.0, y: max.1),
            (x: min.0, y: max.1),
            (x: min.0, y: min.1),
        ]])
    }

    fn polygon_record(
        country: &str,
        region: &str,
        subregion: &str,
        geometry: MultiPolygon<f64>,
    ) -> RawPolygon {
        let mut record = RawPolygon::new(geometry);
        record.country_code = Some("ITA".to_string());
        record.levels[COUNTRY_LEVEL].name = Some(country.to_string());
        record.levels[REGION_LEVEL].name = Some(region.to_string());
        record.levels[SUBREGION_LEVEL].name = Some(subregion.to_string());
        record
    }

    fn italy() -> Vec<RawPolygon> {
        let mut bari = polygon_record("Italy", "Apulia", "Bari", rect((16.0, 40.5), (17.0, 41.5)));
        bari.levels[REGION_LEVEL].variants = Some("Pouilles|Apulien".to_string());
        vec![
            bari,
            polygon_record("Italy", "Apulia", "Lecce", rect((17.0, 39.8), (18.5, 40.5))),
            polygon_record("Italy", "Lazio", "Roma", rect((12.0, 41.5), (13.0, 42.5))),
            polygon_record("Antarctica", "?", "", rect((0.0, -89.0), (10.0, -80.0))),
        ]
    }

    fn city(id: i64, name: &str, alternates: Option<&str>, lat: f64, lon: f64) -> RawPlace {
        RawPlace {
            id,
            name: name.to_string(),
            ascii_name: Some(name.to_string()),
            alternate_names: alternates.map(str::to_string),
            latitude: lat,
            longitude: lon,
        }
    }

    fn config() -> BuildConfig {
        BuildConfig {
            compute_centroids: false,
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_apulia_renamed_to_puglia() {
        let places = vec![city(3182351, "Bari", Some("Bari,Barium"), 41.1, 16.8)];
        let gazetteer = build_gazetteer(italy(), places, &config()).unwrap();

        assert_eq!(gazetteer.rows.len(), 1);
        let row = &gazetteer.rows[0];
        assert_eq!(row.get("region_region_name").unwrap(), "Puglia");
        assert_eq!(row.get("region_country_name").unwrap(), "Italy");
        assert_eq!(row.get("place_alt1").unwrap(), "Barium");
        assert_eq!(row.get("region_region_alt0").unwrap(), "Apulien");

        // the two Apulia sub-polygons dissolve into one region
        let puglia: Vec<&Region> = gazetteer.regions.iter().filter(|r| r.region() == "Puglia").collect();
        assert_eq!(puglia.len(), 1);
        assert_eq!(row.region_id, puglia[0].id);
        assert!(gazetteer.regions.iter().all(|r| r.country() != "Antarctica"));
    }

    #[test]
    fn test_default_config_fills_centroid_columns() {
        let places = vec![city(3182351, "Bari", None, 41.1, 16.8)];
        let gazetteer = build_gazetteer(italy(), places, &BuildConfig::default()).unwrap();

        assert!(gazetteer.regions.iter().all(|r| r.centroid.is_some()));
        let row = &gazetteer.rows[0];
        let lat = row.get("region_latitude").unwrap().as_f64().unwrap();
        let lon = row.get("region_longitude").unwrap().as_f64().unwrap();
        // Puglia spans 39.8..41.5 N and 16..18.5 E
        assert!(lat > 39.8 && lat < 41.5, "lat {}", lat);
        assert!(lon > 16.0 && lon < 18.5, "lon {}", lon);
        assert_eq!(row.get("region_region_name").unwrap(), "Puglia");
    }

    #[test]
    fn test_region_ids_stable_across_reruns() {
        let places = || vec![city(1, "Bari", None, 41.1, 16.8), city(2, "Roma", None, 41.9, 12.5)];
        let first = build_gazetteer(italy(), places(), &config()).unwrap();
        let second = build_gazetteer(italy(), places(), &config()).unwrap();
        let ids = |g: &Gazetteer| g.rows.iter().map(|r| r.region_id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_ne!(first.rows[0].region_id, first.rows[1].region_id);
    }

    #[test]
    fn test_offshore_city_gets_coastal_region() {
        // Just off the Lecce coast, east of every polygon.
        let places = vec![city(9, "Otranto Offshore", None, 40.1, 18.6)];
        let gazetteer = build_gazetteer(italy(), places, &config()).unwrap();
        let row = &gazetteer.rows[0];
        assert_eq!(row.get("region_region_name").unwrap(), "Puglia");
    }

    #[test]
    fn test_rows_match_schema() {
        let places = vec![city(1, "Bari", Some("a,b,c,d,e,f,g,h,i,j,k,l"), 41.1, 16.8)];
        let gazetteer = build_gazetteer(italy(), places, &config()).unwrap();
        let names: Vec<String> = gazetteer.rows[0].fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, gazetteer.schema.columns());
        assert_eq!(gazetteer.overflow.place_rows, 1);
    }

    #[test]
    fn test_overlapping_config_aborts() {
        let mut config = config();
        config.level0_countries.insert("Italy".to_string());
        config.level2_countries.insert("Italy".to_string());
        let result = build_gazetteer(italy(), vec![], &config);
        assert!(matches!(result, Err(GazetteerError::OverlappingAggregation(_))));
    }
}
