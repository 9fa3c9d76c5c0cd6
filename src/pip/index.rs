//! Spatial index for fast region lookups.

use geo::{BoundingRect, Distance, Euclidean, Intersects, MultiPolygon, Point};
use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};
use tracing::{info, warn};

use crate::models::{Region, RegionId};

/// Wrapper for R-tree indexing of region geometries
#[derive(Debug, Clone)]
pub struct IndexedRegion<'a> {
    pub id: RegionId,
    pub geometry: &'a MultiPolygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for IndexedRegion<'_> {
    /// Squared distance to the bounding box, a lower bound on the true distance.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope.distance_2(point)
    }
}

impl<'a> IndexedRegion<'a> {
    pub fn new(region: &'a Region) -> Option<Self> {
        let rect = region.geometry.bounding_rect()?;
        Some(Self {
            id: region.id,
            geometry: &region.geometry,
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        })
    }

    /// Planar distance from the point to the region, zero inside.
    fn distance(&self, point: &Point<f64>) -> f64 {
        Euclidean.distance(point, self.geometry)
    }
}

/// Immutable spatial index borrowing the geometries of a region set.
pub struct RegionIndex<'a> {
    tree: RTree<IndexedRegion<'a>>,
}

impl<'a> RegionIndex<'a> {
    /// Build spatial index from regions
    pub fn build(regions: &'a [Region]) -> Self {
        info!("Building spatial index for {} regions...", regions.len());

        let indexed: Vec<IndexedRegion<'a>> = regions
            .iter()
            .filter_map(|region| {
                let indexed = IndexedRegion::new(region);
                if indexed.is_none() {
                    warn!("Region {} has no bounding box, not indexed", region.id);
                }
                indexed
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());

        Self { tree }
    }

    /// Lowest id among regions whose closed area contains the point.
    pub fn containing(&self, lon: f64, lat: f64) -> Option<RegionId> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        // Use R-tree to get candidates via envelope intersection, then filter with exact containment
        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ir| ir.geometry.intersects(&point))
            .map(|ir| ir.id)
            .min()
    }

    /// Region at minimal distance from the point, ties broken by lowest id.
    ///
    /// Candidates are visited in order of bounding-box distance; the search
    /// stops once a box is farther than the best exact distance found.
    pub fn nearest(&self, lon: f64, lat: f64) -> Option<RegionId> {
        let point = Point::new(lon, lat);
        let mut best: Option<(f64, RegionId)> = None;

        for (candidate, box_distance_2) in self.tree.nearest_neighbor_iter_with_distance_2(&[lon, lat]) {
            if let Some((best_distance, _)) = best {
                if box_distance_2 > best_distance * best_distance {
                    break;
                }
            }

            let distance = candidate.distance(&point);
            best = match best {
                Some((d, id)) if d < distance || (d == distance && id < candidate.id) => Some((d, id)),
                _ => Some((distance, candidate.id)),
            };
        }

        best.map(|(_, id)| id)
    }

    /// Get total number of indexed regions
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
