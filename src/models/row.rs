//! Flat gazetteer output rows and their column layout.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;

use super::region::{level_label, AggregationLevel, Centroid, RegionId, ADMIN_LEVELS};

/// Fixed widths of the exploded alternate-name columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnWidths {
    pub max_place_alt: usize,
    pub max_region_alt_per_level: usize,
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self {
            max_place_alt: 10,
            max_region_alt_per_level: 5,
        }
    }
}

fn place_alt_column(k: usize) -> String {
    format!("place_alt{}", k)
}

fn region_name_column(level: usize) -> String {
    format!("region_{}_name", level_label(level))
}

fn region_local_name_column(level: usize) -> String {
    format!("region_{}_local_name", level_label(level))
}

fn region_alt_column(level: usize, k: usize) -> String {
    format!("region_{}_alt{}", level_label(level), k)
}

/// Column layout of a gazetteer build. Depends only on the configured widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GazetteerSchema {
    widths: ColumnWidths,
    columns: Vec<String>,
}

impl GazetteerSchema {
    pub fn new(widths: ColumnWidths) -> Self {
        let mut columns: Vec<String> = [
            "place_id",
            "place_name",
            "place_ascii_name",
            "place_latitude",
            "place_longitude",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        columns.extend((0..widths.max_place_alt).map(place_alt_column));
        columns.extend(
            [
                "region_id",
                "region_level",
                "region_country_code",
                "region_region_code",
                "region_region_type",
            ]
                .iter()
                .map(|c| c.to_string()),
        );
        for level in 0..ADMIN_LEVELS {
            columns.push(region_name_column(level));
            columns.push(region_local_name_column(level));
            columns.extend((0..widths.max_region_alt_per_level).map(|k| region_alt_column(level, k)));
        }
        columns.push("region_latitude".to_string());
        columns.push("region_longitude".to_string());

        Self { widths, columns }
    }

    pub fn widths(&self) -> ColumnWidths {
        self.widths
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Region columns for one naming level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionLevelColumns {
    pub name: Option<String>,
    pub local_name: Option<String>,
    /// Exactly `max_region_alt_per_level` entries
    pub alternates: Vec<Option<String>>,
}

/// One gazetteer record: a place and the naming hierarchy of its region.
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerRow {
    pub place_id: i64,
    pub place_name: String,
    pub place_ascii_name: Option<String>,
    pub place_latitude: f64,
    pub place_longitude: f64,
    /// Exactly `max_place_alt` entries
    pub place_alternates: Vec<Option<String>>,
    pub region_id: RegionId,
    pub region_level: AggregationLevel,
    pub region_country_code: Option<String>,
    pub region_region_code: Option<String>,
    pub region_region_type: Option<String>,
    /// One entry per admin level
    pub region_levels: Vec<RegionLevelColumns>,
    pub region_centroid: Option<Centroid>,
}

fn text(value: &Option<String>) -> Value {
    value.as_ref().map_or(Value::Null, |s| Value::String(s.clone()))
}

fn float(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

impl GazetteerRow {
    /// Column name and value pairs, in schema order.
    pub fn fields(&self) -> Vec<(String, Value)> {
        let mut fields = vec![
            ("place_id".to_string(), Value::from(self.place_id)),
            ("place_name".to_string(), Value::String(self.place_name.clone())),
            ("place_ascii_name".to_string(), text(&self.place_ascii_name)),
            ("place_latitude".to_string(), float(self.place_latitude)),
            ("place_longitude".to_string(), float(self.place_longitude)),
        ];
        for (k, alt) in self.place_alternates.iter().enumerate() {
            fields.push((place_alt_column(k), text(alt)));
        }
        fields.push(("region_id".to_string(), Value::from(self.region_id.0)));
        fields.push((
            "region_level".to_string(),
            Value::String(self.region_level.as_str().to_string()),
        ));
        fields.push(("region_country_code".to_string(), text(&self.region_country_code)));
        fields.push(("region_region_code".to_string(), text(&self.region_region_code)));
        fields.push(("region_region_type".to_string(), text(&self.region_region_type)));
        for (level, columns) in self.region_levels.iter().enumerate() {
            fields.push((region_name_column(level), text(&columns.name)));
            fields.push((region_local_name_column(level), text(&columns.local_name)));
            for (k, alt) in columns.alternates.iter().enumerate() {
                fields.push((region_alt_column(level, k), text(alt)));
            }
        }
        let (lat, lon) = match self.region_centroid {
            Some(c) => (float(c.lat), float(c.lon)),
            None => (Value::Null, Value::Null),
        };
        fields.push(("region_latitude".to_string(), lat));
        fields.push(("region_longitude".to_string(), lon));
        fields
    }

    /// Look up a single column by name.
    pub fn get(&self, column: &str) -> Option<Value> {
        self.fields()
            .into_iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Values rendered as text for delimited output; absent values are empty.
    pub fn to_record(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .map(|(_, value)| match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()
    }
}

impl Serialize for GazetteerRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in &fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
