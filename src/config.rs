//! Static build configuration.

use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::{GazetteerError, Result};
pub use crate::models::ColumnWidths;

/// Replacement written into a record whose level-1 name equals a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetadataPatch {
    /// Country the patch is scoped to
    pub country: String,
    /// Raw level-1 name identifying the broken record
    pub sentinel: String,
    pub name: String,
    pub local_name: String,
    pub code: String,
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// CRS shared by polygons and points, e.g. `EPSG:4326`
    pub crs: String,
    /// Countries dropped outright
    pub excluded_countries: BTreeSet<String>,
    /// Attribute values treated as missing
    pub placeholders: Vec<String>,
    /// Countries dissolved to a single polygon
    pub level0_countries: BTreeSet<String>,
    /// Countries decomposed to (region, subregion)
    pub level2_countries: BTreeSet<String>,
    pub metadata_patches: Vec<MetadataPatch>,
    /// Wrong level-1 name -> corrected name
    pub region_renames: BTreeMap<String, String>,
    pub columns: ColumnWidths,
    pub compute_centroids: bool,
    /// PROJ.4 definition of the equal-area projection used for centroids,
    /// without `+lat_0`/`+lon_0`: each region gets its own projection center
    pub equal_area_proj: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            crs: "EPSG:4326".to_string(),
            excluded_countries: ["Antarctica", "Caspian Sea"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            placeholders: ["", "?", "n.a."].iter().map(|s| s.to_string()).collect(),
            level0_countries: BTreeSet::new(),
            level2_countries: BTreeSet::new(),
            metadata_patches: vec![MetadataPatch {
                country: "Ukraine".to_string(),
                sentinel: "?".to_string(),
                name: "Kiev City".to_string(),
                local_name: "Київ".to_string(),
                code: "UA.KC".to_string(),
                kind: "Independent City".to_string(),
            }],
            region_renames: [("Apulia", "Puglia"), ("Sicily", "Sicilia")]
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            columns: ColumnWidths::default(),
            compute_centroids: true,
            equal_area_proj: "+proj=laea +datum=WGS84 +units=m +no_defs".to_string(),
        }
    }
}

impl BuildConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: BuildConfig = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Level-0 and level-2 country sets must be disjoint.
    pub fn validate(&self) -> Result<()> {
        match self.level0_countries.intersection(&self.level2_countries).next() {
            Some(country) => Err(GazetteerError::OverlappingAggregation(country.clone())),
            None => Ok(()),
        }
    }
}
