use std::collections::BTreeMap;

use serde::{
    de,
    ser::{SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};

use crate::error::{ElementDefect, ValidationError};

/// Running `name -> checked` state aggregated from a group of toggles.
pub type AggregateMap = BTreeMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToggleRecord {
    pub name: String,
    pub checked: bool,
}

impl ToggleRecord {
    pub fn new(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            checked,
        }
    }

    fn to_value(&self) -> Value {
        let mut entry = Map::with_capacity(1);
        entry.insert(self.name.clone(), Value::Bool(self.checked));
        Value::Object(entry)
    }
}

impl Serialize for ToggleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.checked)?;
        map.end()
    }
}

/// Ordered list of toggle records. Order defines render order and row identity;
/// names are not required to be unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ToggleList(Vec<ToggleRecord>);

impl ToggleList {
    pub fn new(records: Vec<ToggleRecord>) -> Self {
        Self(records)
    }

    /// Validates an untyped value as a whole. Any defective element rejects the
    /// entire candidate.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let Value::Array(items) = value else {
            return Err(ValidationError::NotASequence {
                found: value_kind(value),
            });
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let record = record_from_element(item)
                .map_err(|defect| ValidationError::InvalidElement { index, defect })?;
            records.push(record);
        }

        Ok(Self(records))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToggleRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(ToggleRecord::to_value).collect())
    }

    /// JSON text of the list, as mirrored in a `value` attribute.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

fn record_from_element(item: &Value) -> Result<ToggleRecord, ElementDefect> {
    let Value::Object(entries) = item else {
        return Err(ElementDefect::NotAnObject {
            found: value_kind(item),
        });
    };

    let mut first: Option<(Option<u32>, &String, bool)> = None;
    for (key, value) in entries {
        let Value::Bool(checked) = value else {
            return Err(ElementDefect::NonBooleanEntry { key: key.clone() });
        };
        let index = array_index(key);
        let precedes = match (&first, index) {
            (None, _) => true,
            (Some((Some(current), _, _)), Some(index)) => index < *current,
            (Some((None, _, _)), Some(_)) => true,
            (Some(_), None) => false,
        };
        if precedes {
            first = Some((index, key, *checked));
        }
    }

    first
        .map(|(_, name, checked)| ToggleRecord::new(name.clone(), checked))
        .ok_or(ElementDefect::NoEntries)
}

/// Keys that are canonical array indices enumerate first, in ascending
/// numeric order; all other keys follow in insertion order.
fn array_index(key: &str) -> Option<u32> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Vec<ToggleRecord>> for ToggleList {
    fn from(records: Vec<ToggleRecord>) -> Self {
        Self(records)
    }
}

impl FromIterator<ToggleRecord> for ToggleList {
    fn from_iter<I: IntoIterator<Item = ToggleRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ToggleList {
    type Item = &'a ToggleRecord;
    type IntoIter = std::slice::Iter<'a, ToggleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for ToggleList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for record in &self.0 {
            seq.serialize_element(record)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ToggleList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(de::Error::custom)
    }
}

/// One `(name, colorHex)` row delivered by an external source, encoded on the
/// wire as `["<name>", "<colorHex>"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct TogglePair {
    pub name: String,
    pub color: String,
}

impl TogglePair {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

impl From<(String, String)> for TogglePair {
    fn from((name, color): (String, String)) -> Self {
        Self { name, color }
    }
}

impl From<TogglePair> for (String, String) {
    fn from(pair: TogglePair) -> Self {
        (pair.name, pair.color)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
