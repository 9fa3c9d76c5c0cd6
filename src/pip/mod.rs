//! Point-in-Polygon (PIP) region lookup.
//!
//! Indexes dissolved region geometries in an R-tree and attaches places
//! to the region containing them, or to the nearest one.

mod index;
mod resolver;

pub use index::{IndexedRegion, RegionIndex};
pub use resolver::SpatialResolver;
