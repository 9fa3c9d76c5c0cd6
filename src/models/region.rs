//! Administrative polygon types, raw and dissolved.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Number of GADM naming levels (country = 0 ... level 5).
pub const ADMIN_LEVELS: usize = 6;

/// Level index of the country name.
pub const COUNTRY_LEVEL: usize = 0;
/// Level index of the first-order region name.
pub const REGION_LEVEL: usize = 1;
/// Level index of the second-order region name.
pub const SUBREGION_LEVEL: usize = 2;

/// Column label for each naming level in the gazetteer output.
pub fn level_label(level: usize) -> &'static str {
    match level {
        0 => "country",
        1 => "region",
        2 => "subregion",
        3 => "level3",
        4 => "level4",
        _ => "level5",
    }
}

/// Names carried by a raw polygon at one administrative level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminNames {
    /// `NAME_n`
    pub name: Option<String>,
    /// `NL_NAME_n`, the name in the local script
    pub local_name: Option<String>,
    /// `VARNAME_n`, pipe- or comma-delimited alternate spellings
    pub variants: Option<String>,
}

/// A polygon row as delivered by the reader, before any cleaning.
#[derive(Debug, Clone)]
pub struct RawPolygon {
    /// `GID_0`
    pub country_code: Option<String>,
    /// Names indexed by admin level, 0 being the country.
    pub levels: [AdminNames; ADMIN_LEVELS],
    /// `HASC_1`
    pub region_code: Option<String>,
    /// `ENGTYPE_1`
    pub region_type: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl RawPolygon {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            country_code: None,
            levels: Default::default(),
            region_code: None,
            region_type: None,
            geometry,
        }
    }

    pub fn country(&self) -> Option<&str> {
        self.levels[COUNTRY_LEVEL].name.as_deref()
    }
}

/// A polygon after normalization: country and region names are guaranteed.
#[derive(Debug, Clone)]
pub struct CleanPolygon {
    pub country: String,
    pub region: String,
    pub country_code: Option<String>,
    /// Full naming hierarchy; `levels[0].name` and `levels[1].name` mirror
    /// `country` and `region`.
    pub levels: [AdminNames; ADMIN_LEVELS],
    pub region_code: Option<String>,
    pub region_type: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl CleanPolygon {
    pub fn subregion(&self) -> Option<&str> {
        self.levels[SUBREGION_LEVEL].name.as_deref()
    }
}

/// Surrogate identifier of a dissolved region, stable for a given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grouping key of a dissolved region.
///
/// The derived ordering (country, then region, then subregion with absent
/// first) is the ordering ids are assigned in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey {
    pub country: String,
    pub region: String,
    pub subregion: Option<String>,
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subregion {
            Some(sub) => write!(f, "{}/{}/{}", self.country, self.region, sub),
            None => write!(f, "{}/{}", self.country, self.region),
        }
    }
}

/// How a region's polygons were grouped during dissolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationLevel {
    /// One polygon per country
    #[serde(rename = "country-dissolved")]
    CountryDissolved,
    /// One polygon per (country, region, subregion)
    #[serde(rename = "subregion-decomposed")]
    SubregionDecomposed,
    /// One polygon per (country, region)
    #[serde(rename = "default")]
    Default,
}

impl AggregationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationLevel::CountryDissolved => "country-dissolved",
            AggregationLevel::SubregionDecomposed => "subregion-decomposed",
            AggregationLevel::Default => "default",
        }
    }

    /// Deepest naming level that is part of the grouping key.
    pub fn key_depth(&self) -> usize {
        match self {
            AggregationLevel::CountryDissolved => COUNTRY_LEVEL,
            AggregationLevel::Default => REGION_LEVEL,
            AggregationLevel::SubregionDecomposed => SUBREGION_LEVEL,
        }
    }
}

impl fmt::Display for AggregationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of a dissolved region at one level.
///
/// `alternates` is an ordered set so rendering is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelNames {
    pub name: Option<String>,
    pub local_name: Option<String>,
    pub alternates: BTreeSet<String>,
}

/// Representative point of a region, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
}

/// A dissolved administrative region.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub key: RegionKey,
    pub level: AggregationLevel,
    pub country_code: Option<String>,
    /// `HASC_1`, when every member agrees
    pub region_code: Option<String>,
    /// `ENGTYPE_1`, when every member agrees
    pub region_type: Option<String>,
    pub names: [LevelNames; ADMIN_LEVELS],
    pub geometry: MultiPolygon<f64>,
    pub centroid: Option<Centroid>,
}

impl Region {
    pub fn country(&self) -> &str {
        &self.key.country
    }

    pub fn region(&self) -> &str {
        &self.key.region
    }

    pub fn subregion(&self) -> Option<&str> {
        self.key.subregion.as_deref()
    }
}
