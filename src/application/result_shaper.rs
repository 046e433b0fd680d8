// Flattening and pivoting of query result tables
use crate::domain::error::ValidationError;
use crate::domain::node::NodeCode;
use crate::domain::telemetry::{Record, Table, WideTable};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const TIME_COLUMN: &str = "Time";
const WIDE_TIME_FORMAT: &str = "%y-%m-%dT%H:%M:%S%.6f";

/// Every observation of every table, in arrival order.
pub fn to_record_list(tag_name: &str, tables: &[Table]) -> Vec<Record> {
    let records: Vec<Record> = tables
        .iter()
        .flat_map(|table| table.observations.iter())
        .map(|obs| Record {
            time: obs.time,
            tag: obs.tags.get(tag_name).cloned(),
            value: obs.value.clone(),
        })
        .collect();
    tracing::info!("Found {} results", records.len());
    records
}

/// Pivots observations into one row per timestamp with one column per tag value.
/// Cells without an observation stay empty.
pub fn to_wide_table(
    nodes: &[NodeCode],
    tags: &[String],
    tables: &[Table],
) -> Result<WideTable, ValidationError> {
    let tag_name = nodes.first().ok_or(ValidationError::NoNodes)?.resolve()?.tag_name;

    let mut header = Vec::with_capacity(tags.len() + 1);
    header.push(TIME_COLUMN.to_string());
    header.extend(tags.iter().cloned());

    let column_of: HashMap<&str, usize> = tags
        .iter()
        .enumerate()
        .map(|(i, tag)| (tag.as_str(), i + 1))
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row_of: HashMap<DateTime<Utc>, usize> = HashMap::new();

    for obs in tables.iter().flat_map(|table| table.observations.iter()) {
        let Some(time) = obs.time else {
            tracing::debug!("Skipping observation without a timestamp");
            continue;
        };
        let row = *row_of.entry(time).or_insert_with(|| {
            let mut cells = vec![String::new(); header.len()];
            cells[0] = time.format(WIDE_TIME_FORMAT).to_string();
            rows.push(cells);
            rows.len() - 1
        });

        match obs.tags.get(tag_name).and_then(|t| column_of.get(t.as_str())) {
            Some(&col) => rows[row][col] = obs.value.to_string(),
            None => tracing::debug!(
                "Dropping observation at {} with undeclared {} tag",
                time,
                tag_name
            ),
        }
    }

    tracing::info!("Found {} results", rows.len());
    Ok(WideTable { header, rows })
}
