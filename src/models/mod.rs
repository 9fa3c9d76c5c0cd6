//! Core data models for the gazetteer build.

pub mod place;
pub mod region;
pub mod row;

pub use place::{Place, RawPlace, Resolution, ResolvedPlace};
pub use region::{
    AdminNames, AggregationLevel, Centroid, CleanPolygon, LevelNames, RawPolygon, Region,
    RegionId, RegionKey, ADMIN_LEVELS,
};
pub use row::{ColumnWidths, GazetteerRow, GazetteerSchema, RegionLevelColumns};
