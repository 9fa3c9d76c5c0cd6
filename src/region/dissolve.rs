//! Dissolve cleaned polygons into one region per grouping key.

use geo::{unary_union, CoordsIter, MultiPolygon};
use hashbrown::HashMap;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info};

use crate::error::{GazetteerError, Result};
use crate::models::region::{
    AggregationLevel, CleanPolygon, LevelNames, Region, RegionId, RegionKey, ADMIN_LEVELS,
    COUNTRY_LEVEL, REGION_LEVEL, SUBREGION_LEVEL,
};

/// Offset added to every region id so none collides with a sentinel id.
pub const REGION_ID_BASE: u32 = 1000;

/// Splits `VARNAME` fields, which use either `|` or `,` between spellings.
#[derive(Debug, Clone)]
pub struct VariantSplitter {
    separator: Regex,
}

impl VariantSplitter {
    pub fn new() -> Self {
        Self {
            separator: Regex::new(r"\s*[|,]\s*").expect("static separator pattern"),
        }
    }

    pub fn split<'a>(&'a self, value: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.separator
            .split(value.trim())
            .filter(|part| !part.is_empty())
    }
}

impl Default for VariantSplitter {
    fn default() -> Self {
        Self::new()
    }
}

struct Group {
    level: AggregationLevel,
    members: Vec<CleanPolygon>,
}

fn group_key(
    polygon: &CleanPolygon,
    level0: &BTreeSet<String>,
    level2: &BTreeSet<String>,
) -> (AggregationLevel, RegionKey) {
    if level0.contains(&polygon.country) {
        (
            AggregationLevel::CountryDissolved,
            RegionKey {
                country: polygon.country.clone(),
                region: polygon.country.clone(),
                subregion: None,
            },
        )
    } else if level2.contains(&polygon.country) {
        (
            AggregationLevel::SubregionDecomposed,
            RegionKey {
                country: polygon.country.clone(),
                region: polygon.region.clone(),
                subregion: polygon.subregion().map(str::to_string),
            },
        )
    } else {
        (
            AggregationLevel::Default,
            RegionKey {
                country: polygon.country.clone(),
                region: polygon.region.clone(),
                subregion: None,
            },
        )
    }
}

/// Merge polygons into regions.
///
/// Countries in `level0` collapse to one region each, countries in `level2`
/// split into (region, subregion) pairs, every other country groups by
/// region. Ids are dense, assigned in key order from [`REGION_ID_BASE`].
pub fn dissolve(
    cleaned: Vec<CleanPolygon>,
    level0: &BTreeSet<String>,
    level2: &BTreeSet<String>,
) -> Result<Vec<Region>> {
    if let Some(country) = level0.intersection(level2).next() {
        return Err(GazetteerError::OverlappingAggregation(country.clone()));
    }

    info!("Dissolving {} polygons...", cleaned.len());

    let mut groups: BTreeMap<RegionKey, Group> = BTreeMap::new();
    for polygon in cleaned {
        let (level, key) = group_key(&polygon, level0, level2);
        groups
            .entry(key)
            .or_insert_with(|| Group {
                level,
                members: Vec::new(),
            })
            .members
            .push(polygon);
    }

    let keyed = assign_ids(groups)?;

    let splitter = VariantSplitter::new();
    let regions: Vec<Region> = keyed
        .into_par_iter()
        .map(|(id, key, group)| build_region(id, key, group, &splitter))
        .collect::<Result<_>>()?;

    let mut per_level: BTreeMap<&'static str, usize> = BTreeMap::new();
    for region in &regions {
        *per_level.entry(region.level.as_str()).or_default() += 1;
    }
    info!("Dissolved into {} regions", regions.len());
    for (level, count) in &per_level {
        info!("  {}: {} regions", level, count);
    }

    Ok(regions)
}

/// Number the groups in key order and check the mapping is injective.
fn assign_ids(groups: BTreeMap<RegionKey, Group>) -> Result<Vec<(RegionId, RegionKey, Group)>> {
    let mut seen: HashMap<RegionId, RegionKey> = HashMap::with_capacity(groups.len());
    let mut keyed = Vec::with_capacity(groups.len());

    for (offset, (key, group)) in groups.into_iter().enumerate() {
        let id = RegionId(REGION_ID_BASE + offset as u32);
        if let Some(first) = seen.insert(id, key.clone()) {
            return Err(GazetteerError::DuplicateRegionId {
                id,
                first,
                second: key,
            });
        }
        keyed.push((id, key, group));
    }

    Ok(keyed)
}

/// The value shared by every member, if they all agree.
fn common<'a>(mut values: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    let first = values.next()??;
    values.all(|v| v == Some(first)).then(|| first.to_string())
}

fn build_region(
    id: RegionId,
    key: RegionKey,
    group: Group,
    splitter: &VariantSplitter,
) -> Result<Region> {
    let members = &group.members;
    let depth = group.level.key_depth();

    let mut names: [LevelNames; ADMIN_LEVELS] = Default::default();
    for (level, names) in names.iter_mut().enumerate() {
        names.name = match level {
            COUNTRY_LEVEL => Some(key.country.clone()),
            REGION_LEVEL => Some(key.region.clone()),
            SUBREGION_LEVEL if depth >= SUBREGION_LEVEL => key.subregion.clone(),
            _ => common(members.iter().map(|m| m.levels[level].name.as_deref())),
        };
        names.local_name = common(members.iter().map(|m| m.levels[level].local_name.as_deref()));

        let Some(name) = names.name.as_deref() else {
            continue;
        };
        let mut alternates: BTreeSet<String> = members
            .iter()
            .filter_map(|m| m.levels[level].variants.as_deref())
            .flat_map(|variants| splitter.split(variants))
            .map(str::to_string)
            .collect();
        if group.level == AggregationLevel::CountryDissolved && level == REGION_LEVEL {
            alternates.extend(members.iter().map(|m| m.region.clone()));
        }
        alternates.remove(name);
        names.alternates = alternates;
    }

    let (region_code, region_type) = if depth >= REGION_LEVEL {
        (
            common(members.iter().map(|m| m.region_code.as_deref())),
            common(members.iter().map(|m| m.region_type.as_deref())),
        )
    } else {
        (None, None)
    };

    let geometry = union_members(&key, members)?;
    debug!("Region {} ({}): {} members", id, key, members.len());

    Ok(Region {
        id,
        level: group.level,
        country_code: common(members.iter().map(|m| m.country_code.as_deref())),
        region_code,
        region_type,
        names,
        geometry,
        centroid: None,
        key,
    })
}

fn validate_geometry(key: &RegionKey, geometry: &MultiPolygon<f64>) -> Result<()> {
    if geometry.0.is_empty() {
        return Err(GazetteerError::Geometry(format!(
            "{} has a member with empty geometry",
            key
        )));
    }
    if !geometry
        .coords_iter()
        .all(|c| c.x.is_finite() && c.y.is_finite())
    {
        return Err(GazetteerError::Geometry(format!(
            "{} has a member with non-finite coordinates",
            key
        )));
    }
    Ok(())
}

/// Union all member geometries of one group.
fn union_members(key: &RegionKey, members: &[CleanPolygon]) -> Result<MultiPolygon<f64>> {
    for member in members {
        validate_geometry(key, &member.geometry)?;
    }

    let merged = if let [single] = members {
        single.geometry.clone()
    } else {
        panic::catch_unwind(AssertUnwindSafe(|| {
            unary_union(members.iter().map(|m| &m.geometry))
        }))
        .map_err(|_| {
            GazetteerError::Geometry(format!(
                "failed to union {} polygons of {}",
                members.len(),
                key
            ))
        })?
    };

    if merged.0.is_empty() {
        return Err(GazetteerError::Geometry(format!(
            "{} dissolved to an empty geometry",
            key
        )));
    }
    Ok(merged)
}
