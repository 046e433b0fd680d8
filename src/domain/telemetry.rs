// Time-series result models
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One row of a result table.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub time: Option<DateTime<Utc>>,
    pub value: FieldValue,
    pub tags: BTreeMap<String, String>,
}

impl Observation {
    pub fn new(time: Option<DateTime<Utc>>, value: FieldValue) -> Self {
        Self {
            time,
            value,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }
}

/// One result table as returned by the store, rows in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub observations: Vec<Observation>,
}

impl Table {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub time: Option<DateTime<Utc>>,
    pub tag: Option<String>,
    pub value: FieldValue,
}

/// Tag-keyed export: `["Time", tag1, tag2, ..]` then one row per timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WideTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MachineData {
    Records { records: Vec<Record> },
    Wide(WideTable),
}
