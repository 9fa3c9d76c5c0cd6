//! Data-driven fixes for known defects in the source polygons.

use std::collections::BTreeMap;

use crate::config::MetadataPatch;
use crate::models::region::{RawPolygon, COUNTRY_LEVEL, REGION_LEVEL};

/// Apply the first patch matching this record, if any.
///
/// A patch matches when the record's country equals `patch.country` and its
/// raw level-1 name equals `patch.sentinel`. Matching is done on raw values,
/// so it must run before placeholder scrubbing.
pub fn apply_metadata_patch(
    mut polygon: RawPolygon,
    patches: &[MetadataPatch],
) -> (RawPolygon, Option<&MetadataPatch>) {
    let patch = patches.iter().find(|patch| {
        polygon.levels[COUNTRY_LEVEL].name.as_deref() == Some(patch.country.as_str())
            && polygon.levels[REGION_LEVEL].name.as_deref() == Some(patch.sentinel.as_str())
    });

    if let Some(patch) = patch {
        let region = &mut polygon.levels[REGION_LEVEL];
        region.name = Some(patch.name.clone());
        region.local_name = Some(patch.local_name.clone());
        polygon.region_code = Some(patch.code.clone());
        polygon.region_type = Some(patch.kind.clone());
    }

    (polygon, patch)
}

/// Replace a historically wrong region name with its corrected spelling.
pub fn rename_region(name: String, renames: &BTreeMap<String, String>) -> String {
    match renames.get(&name) {
        Some(corrected) => corrected.clone(),
        None => name,
    }
}
