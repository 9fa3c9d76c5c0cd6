//! Error types for the gazetteer build.

use thiserror::Error;

use crate::models::{RegionId, RegionKey};

/// Fatal build errors. Any of these aborts the build with no output.
#[derive(Error, Debug)]
pub enum GazetteerError {
    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("region id {id} assigned to both {first} and {second}")]
    DuplicateRegionId {
        id: RegionId,
        first: RegionKey,
        second: RegionKey,
    },

    #[error("place {place_id} resolved to region {region_id}, which does not exist")]
    MissingRegion { place_id: i64, region_id: RegionId },

    #[error("country {0:?} is configured for both level-0 aggregation and level-2 decomposition")]
    OverlappingAggregation(String),

    #[error("polygon record {0} has no country name")]
    MissingCountry(usize),

    #[error("cannot resolve place {0}: the region set is empty")]
    EmptyRegionSet(i64),

    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

pub type Result<T> = std::result::Result<T, GazetteerError>;

/// Non-fatal report of rows whose alternate names exceeded the column budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaOverflow {
    /// Rows with place alternates truncated
    pub place_rows: usize,
    /// Rows with at least one region level's alternates truncated
    pub region_rows: usize,
}

impl SchemaOverflow {
    pub fn is_empty(&self) -> bool {
        self.place_rows == 0 && self.region_rows == 0
    }
}
