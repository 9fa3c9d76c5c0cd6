//! Populated place types.

use super::RegionId;

/// A populated place row as delivered by the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlace {
    pub id: i64,
    pub name: String,
    pub ascii_name: Option<String>,
    /// Comma-delimited alternate names
    pub alternate_names: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// A normalized place.
///
/// `alternates` is `None` when the source field was missing, and
/// `Some(vec![])` when it was present but held no names.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub ascii_name: Option<String>,
    pub alternates: Option<Vec<String>>,
    pub latitude: f64,
    pub longitude: f64,
}

/// How a place's region was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The place lies inside the region
    Contained,
    /// The place lies outside every region; the closest one was used
    Nearest,
}

/// A place attached to its owning region.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlace {
    pub place: Place,
    pub region_id: RegionId,
    pub resolution: Resolution,
}
