//! Attribute cleaning for raw polygon records.

use hashbrown::HashSet;
use tracing::{debug, info};

use super::corrections::{apply_metadata_patch, rename_region};
use super::dissolve::VariantSplitter;
use crate::config::BuildConfig;
use crate::error::{GazetteerError, Result};
use crate::models::region::{AdminNames, CleanPolygon, RawPolygon, COUNTRY_LEVEL, REGION_LEVEL};

/// Set of attribute values that mean "no data".
#[derive(Debug, Clone)]
pub struct Placeholders {
    values: HashSet<String>,
}

impl Placeholders {
    pub fn new(values: &[String]) -> Self {
        Self {
            values: values.iter().map(|v| v.trim().to_string()).collect(),
        }
    }

    /// Trim a value and map placeholders to `None`.
    pub fn scrub(&self, value: Option<String>) -> Option<String> {
        let value = value?;
        let trimmed = value.trim();
        if self.values.contains(trimmed) {
            None
        } else if trimmed.len() == value.len() {
            Some(value)
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Whether a single, already split value is a placeholder.
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value.trim())
    }

    /// Drop placeholder fragments from a delimited variants field, rejoined
    /// with `|`. A field left with no fragments becomes `None`.
    pub fn scrub_variants(&self, value: Option<String>, splitter: &VariantSplitter) -> Option<String> {
        let value = self.scrub(value)?;
        let kept: Vec<&str> = splitter.split(&value).filter(|part| !self.contains(part)).collect();
        if kept.is_empty() {
            None
        } else {
            Some(kept.join("|"))
        }
    }

    fn scrub_names(&self, names: AdminNames, splitter: &VariantSplitter) -> AdminNames {
        AdminNames {
            name: self.scrub(names.name),
            local_name: self.scrub(names.local_name),
            variants: self.scrub_variants(names.variants, splitter),
        }
    }
}

#[derive(Debug, Default)]
struct NormalizeStats {
    excluded: usize,
    patched: usize,
    backfilled: usize,
    renamed: usize,
}

/// Drop, patch, scrub, back-fill and rename raw polygon records.
///
/// Steps run in a fixed order: excluded countries are dropped by exact
/// name, metadata patches are matched against raw values, placeholders are
/// scrubbed from every attribute, regionless records take their country
/// name, and the rename table is applied to level-1 names.
pub fn normalize(raw: Vec<RawPolygon>, config: &BuildConfig) -> Result<Vec<CleanPolygon>> {
    info!("Normalizing {} polygon records...", raw.len());

    let placeholders = Placeholders::new(&config.placeholders);
    let splitter = VariantSplitter::new();
    let mut stats = NormalizeStats::default();

    let mut cleaned = Vec::with_capacity(raw.len());
    for (index, polygon) in raw.into_iter().enumerate() {
        if polygon
            .country()
            .map_or(false, |country| config.excluded_countries.contains(country))
        {
            stats.excluded += 1;
            continue;
        }

        let (polygon, patch) = apply_metadata_patch(polygon, &config.metadata_patches);
        if let Some(patch) = patch {
            debug!("Patched record {} of {} as {}", index, patch.country, patch.name);
            stats.patched += 1;
        }

        let RawPolygon {
            country_code,
            levels,
            region_code,
            region_type,
            geometry,
        } = polygon;

        let mut levels = levels.map(|names| placeholders.scrub_names(names, &splitter));

        let country = levels[COUNTRY_LEVEL]
            .name
            .clone()
            .ok_or(GazetteerError::MissingCountry(index))?;

        let region = match levels[REGION_LEVEL].name.take() {
            Some(region) => region,
            None => {
                stats.backfilled += 1;
                country.clone()
            }
        };
        let corrected = rename_region(region.clone(), &config.region_renames);
        if corrected != region {
            stats.renamed += 1;
        }
        levels[REGION_LEVEL].name = Some(corrected.clone());

        cleaned.push(CleanPolygon {
            country,
            region: corrected,
            country_code: placeholders.scrub(country_code),
            levels,
            region_code: placeholders.scrub(region_code),
            region_type: placeholders.scrub(region_type),
            geometry,
        });
    }

    info!(
        "Normalized {} records ({} excluded, {} patched, {} back-filled, {} renamed)",
        cleaned.len(),
        stats.excluded,
        stats.patched,
        stats.backfilled,
        stats.renamed
    );

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::SUBREGION_LEVEL;
    use geo::MultiPolygon;

    fn raw(country: Option<&str>, region: Option<&str>) -> RawPolygon {
        let mut p = RawPolygon::new(MultiPolygon::new(vec![]));
        p.levels[COUNTRY_LEVEL].name = country.map(str::to_string);
        p.levels[REGION_LEVEL].name = region.map(str::to_string);
        p
    }

    #[test]
    fn test_excluded_countries_dropped() {
        let config = BuildConfig::default();
        let cleaned = normalize(
            vec![raw(Some("Antarctica"), None), raw(Some("Italy"), Some("Lazio"))],
            &config,
        )
        .unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].country, "Italy");
    }

    #[test]
    fn test_placeholders_become_absent() {
        let config = BuildConfig::default();
        let mut record = raw(Some("Italy"), Some("Lazio"));
        record.levels[SUBREGION_LEVEL].name = Some("n.a.".to_string());
        record.levels[REGION_LEVEL].local_name = Some("  ".to_string());
        record.levels[REGION_LEVEL].variants = Some("?".to_string());
        record.country_code = Some(" ITA ".to_string());

        let cleaned = normalize(vec![record], &config).unwrap();
        let clean = &cleaned[0];
        assert_eq!(clean.subregion(), None);
        assert_eq!(clean.levels[REGION_LEVEL].local_name, None);
        assert_eq!(clean.levels[REGION_LEVEL].variants, None);
        assert_eq!(clean.country_code.as_deref(), Some("ITA"));
    }

    #[test]
    fn test_regionless_record_takes_country_name() {
        let config = BuildConfig::default();
        let cleaned = normalize(vec![raw(Some("Monaco"), Some(""))], &config).unwrap();
        assert_eq!(cleaned[0].region, "Monaco");
        assert_eq!(cleaned[0].levels[REGION_LEVEL].name.as_deref(), Some("Monaco"));
    }

    #[test]
    fn test_patch_runs_before_scrubbing() {
        let config = BuildConfig::default();
        let cleaned = normalize(vec![raw(Some("Ukraine"), Some("?"))], &config).unwrap();
        assert_eq!(cleaned[0].region, "Kiev City");
        assert_eq!(cleaned[0].region_code.as_deref(), Some("UA.KC"));
    }

    #[test]
    fn test_renames_applied() {
        let config = BuildConfig::default();
        let cleaned = normalize(vec![raw(Some("Italy"), Some("Apulia"))], &config).unwrap();
        assert_eq!(cleaned[0].region, "Puglia");
    }

    #[test]
    fn test_variant_placeholder_fragments_dropped() {
        let config = BuildConfig::default();
        let mut record = raw(Some("Italy"), Some("Apulia"));
        record.levels[REGION_LEVEL].variants = Some("?|Pouilles, n.a.".to_string());
        record.levels[SUBREGION_LEVEL].variants = Some("?|n.a.".to_string());

        let cleaned = normalize(vec![record], &config).unwrap();
        assert_eq!(cleaned[0].levels[REGION_LEVEL].variants.as_deref(), Some("Pouilles"));
        assert_eq!(cleaned[0].levels[SUBREGION_LEVEL].variants, None);
    }

    #[test]
    fn test_missing_country_reports_input_position() {
        let config = BuildConfig::default();
        let result = normalize(
            vec![
                raw(Some("Antarctica"), None),
                raw(Some("Italy"), Some("Lazio")),
                raw(Some("n.a."), Some("Lazio")),
            ],
            &config,
        );
        assert!(matches!(result, Err(GazetteerError::MissingCountry(2))));
    }

    #[test]
    fn test_missing_country_is_fatal() {
        let config = BuildConfig::default();
        let result = normalize(vec![raw(Some("?"), Some("Lazio"))], &config);
        assert!(matches!(result, Err(GazetteerError::MissingCountry(0))));
    }
}
