// Caller-facing request payloads
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Either a single node code or a list of codes of the same kind.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NodeSelection {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Records,
    Wide,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineDataRequest {
    pub nodes: NodeSelection,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub property: String,
    #[serde(default = "default_true")]
    pub summary: bool,
    #[serde(default)]
    pub aggregate: bool,
    #[serde(default = "default_aggregate_fn")]
    pub aggregate_fn: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub allow_unsynchronized_multi_node: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CycleRequest {
    pub machine: String,
    pub variable: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

fn default_true() -> bool {
    true
}

fn default_aggregate_fn() -> String {
    "mean".to_string()
}
