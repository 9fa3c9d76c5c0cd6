use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use geo::{LineString, MultiPolygon, Polygon};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::info;

use gazetteer::models::region::COUNTRY_LEVEL;
use gazetteer::models::{RawPlace, RawPolygon};

/// Open a file, transparently decompressing `.gz`.
pub fn open(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    })
}

/// Load the Geonames cities table.
pub fn load_places(path: &Path) -> Result<Vec<RawPlace>> {
    info!("Loading places from {}", path.display());
    let places = parse_places(open(path)?)?;
    info!("Loaded {} places", places.len());
    Ok(places)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse Geonames rows: tab-separated, no header, no quoting.
///
/// Only the first six columns are used:
/// geonameid, name, asciiname, alternatenames, latitude, longitude.
pub fn parse_places<R: Read>(reader: R) -> Result<Vec<RawPlace>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut places = Vec::new();
    for (line, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed place row {}", line + 1))?;
        if record.len() < 6 {
            bail!("Place row {} has {} columns, expected at least 6", line + 1, record.len());
        }

        let id = record[0]
            .parse::<i64>()
            .with_context(|| format!("Bad geonameid on row {}", line + 1))?;
        let latitude = record[4]
            .parse::<f64>()
            .with_context(|| format!("Bad latitude for place {}", id))?;
        let longitude = record[5]
            .parse::<f64>()
            .with_context(|| format!("Bad longitude for place {}", id))?;

        places.push(RawPlace {
            id,
            name: record[1].to_string(),
            ascii_name: non_empty(&record[2]),
            alternate_names: non_empty(&record[3]),
            latitude,
            longitude,
        });
    }
    Ok(places)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeoJsonGeometry {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

/// One polygon line: GADM attribute columns next to a GeoJSON geometry.
#[derive(Debug, Deserialize)]
struct PolygonLine {
    geometry: GeoJsonGeometry,
    #[serde(flatten)]
    attributes: HashMap<String, Value>,
}

impl PolygonLine {
    fn attribute(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn ring(coords: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    coords
        .into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok((*x, *y)),
            _ => bail!("Position with fewer than two coordinates"),
        })
        .collect::<Result<Vec<(f64, f64)>>>()
        .map(LineString::from)
}

fn polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>> {
    let mut rings = rings.into_iter().map(ring);
    let exterior = match rings.next() {
        Some(exterior) => exterior?,
        None => bail!("Polygon without an exterior ring"),
    };
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn multi_polygon(geometry: GeoJsonGeometry) -> Result<MultiPolygon<f64>> {
    let polygons = match geometry {
        GeoJsonGeometry::Polygon(rings) => vec![polygon(rings)?],
        GeoJsonGeometry::MultiPolygon(parts) => parts
            .into_iter()
            .map(polygon)
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(MultiPolygon::new(polygons))
}

fn raw_polygon(line: PolygonLine) -> Result<RawPolygon> {
    let mut record = RawPolygon::new(MultiPolygon::new(vec![]));
    record.country_code = line.attribute("GID_0");
    record.region_code = line.attribute("HASC_1");
    record.region_type = line.attribute("ENGTYPE_1");
    for (level, names) in record.levels.iter_mut().enumerate() {
        names.name = match level {
            COUNTRY_LEVEL => line
                .attribute("COUNTRY")
                .or_else(|| line.attribute("NAME_0")),
            _ => line.attribute(&format!("NAME_{}", level)),
        };
        names.local_name = line.attribute(&format!("NL_NAME_{}", level));
        names.variants = line.attribute(&format!("VARNAME_{}", level));
    }
    record.geometry = multi_polygon(line.geometry)?;
    Ok(record)
}

/// Parse line-delimited polygon records. Blank lines are skipped.
pub fn parse_polygons<R: BufRead>(reader: R, pb: &ProgressBar) -> Result<Vec<RawPolygon>> {
    let mut polygons = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        pb.inc(1);
        let line = line.with_context(|| format!("Failed to read polygon line {}", number + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: PolygonLine = serde_json::from_str(&line)
            .with_context(|| format!("Malformed polygon record on line {}", number + 1))?;
        let record = raw_polygon(parsed)
            .with_context(|| format!("Bad geometry on polygon line {}", number + 1))?;
        polygons.push(record);
    }
    Ok(polygons)
}

/// Load the administrative polygon table.
pub fn load_polygons(path: &Path) -> Result<Vec<RawPolygon>> {
    info!("Loading polygons from {}", path.display());
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} polygon lines ({per_sec})")?,
    );
    let polygons = parse_polygons(BufReader::new(open(path)?), &pb)?;
    pb.finish_and_clear();
    info!("Loaded {} polygon records", polygons.len());
    Ok(polygons)
}
