//! Equal-area centroids for dissolved regions.

use geo::{BoundingRect, Centroid as _, Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};
use std::str::FromStr;
use tracing::info;

use crate::error::{GazetteerError, Result};
use crate::models::region::{Centroid, Region};

/// Geographic CRS shared by polygons and points, identified by EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// PROJ.4 definition of this CRS (degrees are converted to radians in code).
    pub fn proj4(&self) -> Result<&'static str> {
        match self.epsg {
            4326 => Ok("+proj=longlat +datum=WGS84 +no_defs +type=crs"),
            4269 | 4937 => Ok("+proj=longlat +datum=NAD83 +no_defs +type=crs"),
            other => Err(GazetteerError::UnsupportedCrs(format!("EPSG:{}", other))),
        }
    }
}

impl FromStr for Crs {
    type Err = GazetteerError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s
            .trim()
            .strip_prefix("EPSG:")
            .or_else(|| s.trim().strip_prefix("epsg:"))
            .ok_or_else(|| GazetteerError::UnsupportedCrs(s.to_string()))?;
        let epsg = code
            .parse()
            .map_err(|_| GazetteerError::UnsupportedCrs(s.to_string()))?;
        let crs = Crs { epsg };
        crs.proj4()?;
        Ok(crs)
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn build_proj(definition: &str) -> Result<Proj> {
    Proj::from_proj_string(definition).map_err(|e| {
        GazetteerError::Geometry(format!("failed to build projection {definition}: {e}"))
    })
}

/// Equal-area projection centered on the middle of the geometry's bounding box.
fn centered_proj(geometry: &MultiPolygon<f64>, equal_area_proj: &str) -> Result<Proj> {
    let rect = geometry
        .bounding_rect()
        .ok_or_else(|| GazetteerError::Geometry("centroid of an empty geometry".to_string()))?;
    let center = rect.center();
    build_proj(&format!(
        "{} +lat_0={} +lon_0={}",
        equal_area_proj, center.y, center.x
    ))
}

fn centroid_of(geometry: &MultiPolygon<f64>, source: &Proj, equal_area_proj: &str) -> Result<Centroid> {
    let equal_area = centered_proj(geometry, equal_area_proj)?;

    let projected = geometry.try_map_coords(|coord: Coord<f64>| {
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(source, &equal_area, &mut point)
            .map_err(|e| GazetteerError::Geometry(format!("forward projection failed: {e}")))?;
        Ok::<_, GazetteerError>(Coord {
            x: point.0,
            y: point.1,
        })
    })?;

    let center = projected
        .centroid()
        .ok_or_else(|| GazetteerError::Geometry("centroid of an empty geometry".to_string()))?;

    let mut point = (center.x(), center.y(), 0.0);
    transform(&equal_area, source, &mut point)
        .map_err(|e| GazetteerError::Geometry(format!("inverse projection failed: {e}")))?;

    Ok(Centroid {
        lat: round6(point.1.to_degrees()),
        lon: round6(point.0.to_degrees()),
    })
}

/// Attach an area-weighted centroid to every region.
///
/// Each geometry is projected to `equal_area_proj` centered on its own
/// bounding box (`+lat_0`/`+lon_0` are appended), the centroid is taken in
/// the projected plane and projected back, then rounded to 6 decimals.
pub fn compute_centroid(regions: Vec<Region>, crs: &Crs, equal_area_proj: &str) -> Result<Vec<Region>> {
    info!("Computing centroids for {} regions...", regions.len());

    let source = build_proj(crs.proj4()?)?;
    build_proj(equal_area_proj)?;

    regions
        .into_iter()
        .map(|region| {
            let centroid = centroid_of(&region.geometry, &source, equal_area_proj)?;
            Ok(Region {
                centroid: Some(centroid),
                ..region
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::models::region::{AggregationLevel, RegionId, RegionKey};
    use geo::polygon;

    fn region(geometry: MultiPolygon<f64>) -> Region {
        Region {
            id: RegionId(1000),
            key: RegionKey {
                country: "Italy".to_string(),
                region: "Puglia".to_string(),
                subregion: None,
            },
            level: AggregationLevel::Default,
            country_code: None,
            region_code: None,
            region_type: None,
            names: Default::default(),
            geometry,
            centroid: None,
        }
    }

    #[test]
    fn test_parse_crs() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap().epsg(), 4326);
        assert_eq!("epsg:4269".parse::<Crs>().unwrap().epsg(), 4269);
        assert!(matches!(
            "EPSG:3857".parse::<Crs>(),
            Err(GazetteerError::UnsupportedCrs(_))
        ));
        assert!("WGS84".parse::<Crs>().is_err());
    }

    #[test]
    fn test_centroid_of_symmetric_square() {
        let square = MultiPolygon::new(vec![polygon![
            (x: 10.0, y: -1.0),
            (x: 12.0, y: -1.0),
            (x: 12.0, y: 1.0),
            (x: 10.0, y: 1.0),
            (x: 10.0, y: -1.0),
        ]]);
        let config = BuildConfig::default();
        let crs: Crs = config.crs.parse().unwrap();
        let regions = compute_centroid(vec![region(square)], &crs, &config.equal_area_proj).unwrap();
        let centroid = regions[0].centroid.unwrap();
        assert!((centroid.lon - 11.0).abs() < 1e-6);
        assert!(centroid.lat.abs() < 1e-6);
    }

    #[test]
    fn test_default_projection_is_available() {
        let config = BuildConfig::default();
        assert!(build_proj(&config.equal_area_proj).is_ok());
    }

    #[test]
    fn test_high_latitude_centroid_is_area_weighted() {
        // Rings of latitude shrink towards the pole, so the area-weighted
        // centre of a 60..62 band sits south of the planar midpoint 61.
        let band = MultiPolygon::new(vec![polygon![
            (x: 24.0, y: 60.0),
            (x: 26.0, y: 60.0),
            (x: 26.0, y: 62.0),
            (x: 24.0, y: 62.0),
            (x: 24.0, y: 60.0),
        ]]);
        let config = BuildConfig::default();
        let crs: Crs = config.crs.parse().unwrap();
        let regions = compute_centroid(vec![region(band)], &crs, &config.equal_area_proj).unwrap();
        let centroid = regions[0].centroid.unwrap();

        assert!(centroid.lat > 60.98 && centroid.lat < 60.999, "lat {}", centroid.lat);
        assert!((centroid.lon - 25.0).abs() < 1e-3, "lon {}", centroid.lon);
        assert_eq!(centroid.lat, round6(centroid.lat));
        assert_eq!(centroid.lon, round6(centroid.lon));
    }

    #[test]
    fn test_centroid_is_rounded() {
        assert_eq!(round6(41.123456789), 41.123457);
        assert_eq!(round6(-0.0000004), 0.0);
    }
}
