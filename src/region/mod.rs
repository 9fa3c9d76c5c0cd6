//! Region normalization: cleaning raw GADM-style polygons and dissolving
//! them into the administrative hierarchy places are attached to.

mod centroid;
mod corrections;
mod dissolve;
mod normalize;

pub use centroid::{compute_centroid, Crs};
pub use corrections::{apply_metadata_patch, rename_region};
pub use dissolve::{dissolve, VariantSplitter, REGION_ID_BASE};
pub use normalize::{normalize, Placeholders};

use crate::config::BuildConfig;
use crate::error::Result;
use crate::models::{CleanPolygon, RawPolygon, Region};

/// Region pipeline bound to one build configuration.
pub struct RegionNormalizer<'a> {
    config: &'a BuildConfig,
    crs: Crs,
}

impl<'a> RegionNormalizer<'a> {
    pub fn new(config: &'a BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            crs: config.crs.parse()?,
        })
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn normalize(&self, raw: Vec<RawPolygon>) -> Result<Vec<CleanPolygon>> {
        normalize(raw, self.config)
    }

    pub fn dissolve(&self, cleaned: Vec<CleanPolygon>) -> Result<Vec<Region>> {
        dissolve(
            cleaned,
            &self.config.level0_countries,
            &self.config.level2_countries,
        )
    }

    pub fn compute_centroid(&self, regions: Vec<Region>) -> Result<Vec<Region>> {
        compute_centroid(regions, &self.crs, &self.config.equal_area_proj)
    }

    /// Normalize, dissolve and, when enabled, attach centroids.
    pub fn build(&self, raw: Vec<RawPolygon>) -> Result<Vec<Region>> {
        let regions = self.dissolve(self.normalize(raw)?)?;
        if self.config.compute_centroids {
            self.compute_centroid(regions)
        } else {
            Ok(regions)
        }
    }
}
