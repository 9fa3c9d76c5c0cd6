//! Attach each place to the region that owns it.

use rayon::prelude::*;
use tracing::{debug, info};

use super::RegionIndex;
use crate::error::{GazetteerError, Result};
use crate::models::{Place, Resolution, ResolvedPlace};

/// Two-phase resolver: containment first, nearest region as fallback.
pub struct SpatialResolver<'i, 'r> {
    index: &'i RegionIndex<'r>,
}

impl<'i, 'r> SpatialResolver<'i, 'r> {
    pub fn new(index: &'i RegionIndex<'r>) -> Self {
        Self { index }
    }

    /// Resolve a single place. Containment is authoritative; the nearest
    /// region is only consulted when no region contains the place.
    pub fn resolve_one(&self, place: Place) -> Result<ResolvedPlace> {
        if !(place.longitude.is_finite() && place.latitude.is_finite()) {
            return Err(GazetteerError::Geometry(format!(
                "place {} has non-finite coordinates",
                place.id
            )));
        }

        if let Some(region_id) = self.index.containing(place.longitude, place.latitude) {
            return Ok(ResolvedPlace {
                place,
                region_id,
                resolution: Resolution::Contained,
            });
        }

        let region_id = self
            .index
            .nearest(place.longitude, place.latitude)
            .ok_or(GazetteerError::EmptyRegionSet(place.id))?;
        debug!(
            "Place {} ({}) outside all regions, using nearest region {}",
            place.id, place.name, region_id
        );

        Ok(ResolvedPlace {
            place,
            region_id,
            resolution: Resolution::Nearest,
        })
    }

    /// Resolve all places in parallel. Output order matches input order.
    pub fn resolve(&self, places: Vec<Place>) -> Result<Vec<ResolvedPlace>> {
        info!(
            "Resolving {} places against {} regions...",
            places.len(),
            self.index.len()
        );

        let resolved: Vec<ResolvedPlace> = places
            .into_par_iter()
            .map(|place| self.resolve_one(place))
            .collect::<Result<_>>()?;

        let fallback = resolved
            .iter()
            .filter(|r| r.resolution == Resolution::Nearest)
            .count();
        info!(
            "Resolved {} places ({} by containment, {} by nearest region)",
            resolved.len(),
            resolved.len() - fallback,
            fallback
        );

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregationLevel, Region, RegionId, RegionKey};
    use geo::{polygon, MultiPolygon};

    fn region(id: u32, geometry: MultiPolygon<f64>) -> Region {
        Region {
            id: RegionId(id),
            key: RegionKey {
                country: "Testland".to_string(),
                region: format!("R{}", id),
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

    fn rect(min: (f64, f64), max: (f64, f64)) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min.0, y: min.1),
            (x: max.0, y: min.1),
            (x: max.0, y: max.1),
            (x: min.0, y: max.1),
            (x: min.0, y: min.1),
        ]])
    }

    fn place(id: i64, lon: f64, lat: f64) -> Place {
        Place {
            id,
            name: format!("P{}", id),
            ascii_name: None,
            alternates: None,
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_containment_beats_closer_centroid() {
        // Point sits just inside the large square, right next to a tiny
        // square whose centroid is much closer than the large one's.
        let regions = vec![
            region(1000, rect((0.0, 0.0), (10.0, 10.0))),
            region(1001, rect((10.05, 4.9), (10.2, 5.1))),
        ];
        let index = RegionIndex::build(&regions);
        let resolver = SpatialResolver::new(&index);
        let resolved = resolver.resolve_one(place(1, 9.99, 5.0)).unwrap();
        assert_eq!(resolved.region_id, RegionId(1000));
        assert_eq!(resolved.resolution, Resolution::Contained);
    }

    #[test]
    fn test_offshore_place_falls_back_to_nearest() {
        let regions = vec![
            region(1000, rect((0.0, 0.0), (1.0, 1.0))),
            region(1001, rect((3.0, 0.0), (4.0, 1.0))),
        ];
        let index = RegionIndex::build(&regions);
        let resolver = SpatialResolver::new(&index);
        let resolved = resolver.resolve_one(place(1, 1.2, 0.5)).unwrap();
        assert_eq!(resolved.region_id, RegionId(1000));
        assert_eq!(resolved.resolution, Resolution::Nearest);
    }

    #[test]
    fn test_every_place_gets_an_existing_region() {
        let regions = vec![
            region(1000, rect((0.0, 0.0), (1.0, 1.0))),
            region(1001, rect((3.0, 0.0), (4.0, 1.0))),
            region(1002, rect((0.0, 3.0), (1.0, 4.0))),
        ];
        let index = RegionIndex::build(&regions);
        let resolver = SpatialResolver::new(&index);

        let places: Vec<Place> = (0..200)
            .map(|i| place(i, (i % 20) as f64 * 0.25 - 0.5, (i / 20) as f64 * 0.5 - 0.5))
            .collect();
        let resolved = resolver.resolve(places).unwrap();
        assert_eq!(resolved.len(), 200);
        for (i, r) in resolved.iter().enumerate() {
            assert_eq!(r.place.id, i as i64);
            assert!(regions.iter().any(|region| region.id == r.region_id));
        }
    }

    #[test]
    fn test_resolution_independent_of_order_and_batching() {
        let regions = vec![
            region(1000, rect((0.0, 0.0), (1.0, 1.0))),
            region(1001, rect((2.0, 0.0), (3.0, 1.0))),
        ];
        let index = RegionIndex::build(&regions);
        let resolver = SpatialResolver::new(&index);

        let places: Vec<Place> = (0..50).map(|i| place(i, i as f64 * 0.07 - 0.5, 1.5)).collect();
        let all = resolver.resolve(places.clone()).unwrap();

        let mut reversed = places.clone();
        reversed.reverse();
        let mut reversed = resolver.resolve(reversed).unwrap();
        reversed.reverse();

        let batched: Vec<ResolvedPlace> = places
            .chunks(7)
            .flat_map(|chunk| resolver.resolve(chunk.to_vec()).unwrap())
            .collect();

        assert_eq!(all, reversed);
        assert_eq!(all, batched);
    }

    #[test]
    fn test_empty_region_set_is_fatal() {
        let regions: Vec<Region> = vec![];
        let index = RegionIndex::build(&regions);
        let resolver = SpatialResolver::new(&index);
        assert!(matches!(
            resolver.resolve_one(place(7, 0.0, 0.0)),
            Err(GazetteerError::EmptyRegionSet(7))
        ));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let regions = vec![region(1000, rect((0.0, 0.0), (1.0, 1.0)))];
        let index = RegionIndex::build(&regions);
        let resolver = SpatialResolver::new(&index);
        assert!(matches!(
            resolver.resolve_one(place(1, f64::NAN, 0.0)),
            Err(GazetteerError::Geometry(_))
        ));
    }
}
