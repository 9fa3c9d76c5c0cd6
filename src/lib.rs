//! Gazetteer - builds a flat place/region table from administrative
//! boundary polygons and a populated-places list.
//!
//! This library provides the engine used by the `build-gazetteer` binary.

pub mod config;
pub mod error;
pub mod gazetteer;
pub mod models;
pub mod pip;
pub mod place;
pub mod region;

pub use config::BuildConfig;
pub use error::{GazetteerError, Result, SchemaOverflow};
pub use gazetteer::{build_gazetteer, Gazetteer};
pub use models::{GazetteerRow, GazetteerSchema, Place, RawPlace, RawPolygon, Region, RegionId};
pub use pip::{RegionIndex, SpatialResolver};
pub use place::PlaceNormalizer;
pub use region::RegionNormalizer;
