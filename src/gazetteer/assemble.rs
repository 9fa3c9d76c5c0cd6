//! Join resolved places to their regions and explode name lists into
//! fixed-width columns.

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::error::{GazetteerError, Result, SchemaOverflow};
use crate::models::{
    ColumnWidths, GazetteerRow, Region, RegionId, RegionLevelColumns, ResolvedPlace,
};

/// Spread `values` over exactly `width` columns.
///
/// Missing lists yield all-absent columns. Returns whether values were
/// dropped to fit.
pub fn explode<'a, I>(values: Option<I>, width: usize) -> (Vec<Option<String>>, bool)
where
    I: IntoIterator<Item = &'a String>,
{
    let mut columns: Vec<Option<String>> = Vec::with_capacity(width);
    let mut truncated = false;
    if let Some(values) = values {
        for value in values {
            if columns.len() == width {
                truncated = true;
                break;
            }
            columns.push(Some(value.clone()));
        }
    }
    columns.resize(width, None);
    (columns, truncated)
}

/// Region half of a row, computed once per region.
struct RegionColumns<'a> {
    region: &'a Region,
    levels: Vec<RegionLevelColumns>,
    truncated: bool,
}

impl<'a> RegionColumns<'a> {
    fn new(region: &'a Region, width: usize) -> Self {
        let mut truncated = false;
        let levels = region
            .names
            .iter()
            .map(|names| {
                let (alternates, cut) = explode(Some(&names.alternates), width);
                truncated |= cut;
                RegionLevelColumns {
                    name: names.name.clone(),
                    local_name: names.local_name.clone(),
                    alternates,
                }
            })
            .collect();
        Self {
            region,
            levels,
            truncated,
        }
    }
}

/// Rows produced by [`assemble`] plus the truncation report.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub rows: Vec<GazetteerRow>,
    pub overflow: SchemaOverflow,
}

/// Build one row per resolved place.
pub fn assemble(
    resolved: &[ResolvedPlace],
    regions: &[Region],
    widths: ColumnWidths,
) -> Result<Assembly> {
    info!(
        "Assembling gazetteer from {} places and {} regions...",
        resolved.len(),
        regions.len()
    );

    let by_id: HashMap<RegionId, &Region> = regions.iter().map(|r| (r.id, r)).collect();
    let mut columns_by_id: HashMap<RegionId, RegionColumns> = HashMap::new();
    let mut overflow = SchemaOverflow::default();
    let mut rows = Vec::with_capacity(resolved.len());

    for item in resolved {
        let place = &item.place;
        let region = by_id
            .get(&item.region_id)
            .copied()
            .ok_or(GazetteerError::MissingRegion {
                place_id: place.id,
                region_id: item.region_id,
            })?;
        let region_columns = columns_by_id
            .entry(item.region_id)
            .or_insert_with(|| RegionColumns::new(region, widths.max_region_alt_per_level));

        let (place_alternates, place_truncated) =
            explode(place.alternates.as_ref(), widths.max_place_alt);
        if place_truncated {
            overflow.place_rows += 1;
            debug!(
                "Place {} has {} alternate names, keeping {}",
                place.id,
                place.alternates.as_ref().map_or(0, Vec::len),
                widths.max_place_alt
            );
        }
        if region_columns.truncated {
            overflow.region_rows += 1;
        }

        let region = region_columns.region;
        rows.push(GazetteerRow {
            place_id: place.id,
            place_name: place.name.clone(),
            place_ascii_name: place.ascii_name.clone(),
            place_latitude: place.latitude,
            place_longitude: place.longitude,
            place_alternates,
            region_id: region.id,
            region_level: region.level,
            region_country_code: region.country_code.clone(),
            region_region_code: region.region_code.clone(),
            region_region_type: region.region_type.clone(),
            region_levels: region_columns.levels.clone(),
            region_centroid: region.centroid,
        });
    }

    if overflow.place_rows > 0 {
        warn!(
            "{} rows had more place alternate names than {} columns; extra names dropped",
            overflow.place_rows, widths.max_place_alt
        );
    }
    if overflow.region_rows > 0 {
        warn!(
            "{} rows had more region alternate names than {} columns per level; extra names dropped",
            overflow.region_rows, widths.max_region_alt_per_level
        );
    }
    info!("Assembled {} rows", rows.len());

    Ok(Assembly { rows, overflow })
}
