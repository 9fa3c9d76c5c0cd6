//! Place normalization for Geonames-style point records.

use tracing::info;

use crate::config::BuildConfig;
use crate::models::{Place, RawPlace};
use crate::region::Placeholders;

/// Split a comma-delimited alternate-names field, dropping empty fragments.
pub fn split_alternates(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct PlaceNormalizer {
    placeholders: Placeholders,
}

impl PlaceNormalizer {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            placeholders: Placeholders::new(&config.placeholders),
        }
    }

    /// Clean one record. Identity, names and coordinates pass through; the
    /// alternate-names field is split, with missing or placeholder values
    /// kept distinct from an empty list.
    pub fn normalize_one(&self, raw: RawPlace) -> Place {
        let alternates = self
            .placeholders
            .scrub(raw.alternate_names)
            .map(|names| {
                split_alternates(&names)
                    .into_iter()
                    .filter(|name| !self.placeholders.contains(name))
                    .collect()
            });

        Place {
            id: raw.id,
            name: raw.name,
            ascii_name: raw.ascii_name,
            alternates,
            latitude: raw.latitude,
            longitude: raw.longitude,
        }
    }

    pub fn normalize(&self, raw: Vec<RawPlace>) -> Vec<Place> {
        info!("Normalizing {} places...", raw.len());
        let places: Vec<Place> = raw.into_iter().map(|p| self.normalize_one(p)).collect();
        let missing = places.iter().filter(|p| p.alternates.is_none()).count();
        info!("{} places have no alternate names", missing);
        places
    }
}
