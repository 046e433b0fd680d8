// Decoder for Flux annotated CSV responses
use crate::domain::error::ConnectionError;
use crate::domain::telemetry::{FieldValue, Observation, Table};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Columns every Flux table carries that are not tags.
const RESERVED_COLUMNS: [&str; 3] = ["", "result", "table"];

/// Splits a response body into tables, keyed by `(result, table)` in arrival order.
pub fn decode_tables(body: &str) -> Result<Vec<Table>, ConnectionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut tables: Vec<Table> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut section = Section::default();

    for row in reader.records() {
        let row = row.map_err(|e| ConnectionError::Decode(e.to_string()))?;
        let first = row.get(0).unwrap_or_default();

        if row.len() == 1 && first.is_empty() {
            section = Section::default();
            continue;
        }
        if first.starts_with('#') {
            section.annotate(first, row.iter().map(str::to_string).collect());
            continue;
        }
        if section.header.is_none() {
            section.header = Some(row.iter().map(str::to_string).collect());
            continue;
        }
        let Some(header) = section.header.as_ref() else {
            continue;
        };

        if let Some(col) = header.iter().position(|h| h == "error") {
            let message = row.get(col).unwrap_or_default();
            if !message.is_empty() {
                return Err(ConnectionError::Decode(format!("query failed: {}", message)));
            }
        }

        let cell = |name: &str| -> Option<String> {
            let col = header.iter().position(|h| h == name)?;
            let raw = row.get(col).unwrap_or_default();
            if raw.is_empty() {
                section.defaults.get(col).filter(|d| !d.is_empty()).cloned()
            } else {
                Some(raw.to_string())
            }
        };

        let key = (
            cell("result").unwrap_or_default(),
            cell("table").unwrap_or_default(),
        );
        let time = match cell("_time") {
            Some(raw) => Some(parse_time(&raw)?),
            None => None,
        };
        let value = match cell("_value") {
            Some(raw) => section.parse_value(header, &raw),
            None => continue,
        };

        let mut observation = Observation::new(time, value);
        for (col, name) in header.iter().enumerate() {
            if RESERVED_COLUMNS.contains(&name.as_str()) || name.starts_with('_') {
                continue;
            }
            if let Some(tag) = row.get(col).filter(|v| !v.is_empty()) {
                observation.tags.insert(name.clone(), tag.to_string());
            }
        }

        let slot = *index.entry(key).or_insert_with(|| {
            tables.push(Table::default());
            tables.len() - 1
        });
        tables[slot].observations.push(observation);
    }

    tracing::debug!("Decoded {} tables", tables.len());
    Ok(tables)
}

#[derive(Debug, Default)]
struct Section {
    datatypes: Vec<String>,
    defaults: Vec<String>,
    header: Option<Vec<String>>,
}

impl Section {
    fn annotate(&mut self, annotation: &str, row: Vec<String>) {
        match annotation {
            "#datatype" => {
                // a new annotation block starts a new result section
                *self = Section {
                    datatypes: row,
                    ..Section::default()
                };
            }
            "#default" => self.defaults = row,
            _ => {}
        }
    }

    fn parse_value(&self, header: &[String], raw: &str) -> FieldValue {
        let datatype = header
            .iter()
            .position(|h| h == "_value")
            .and_then(|col| self.datatypes.get(col))
            .map(String::as_str);

        let numeric = match datatype {
            Some("double") | Some("long") | Some("unsignedLong") | None => raw.parse::<f64>().ok(),
            Some(_) => None,
        };
        match numeric {
            Some(v) => FieldValue::Number(v),
            None => FieldValue::Text(raw.to_string()),
        }
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, ConnectionError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ConnectionError::Decode(format!("invalid _time '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const GROUPED: &str = "\
#datatype,string,long,dateTime:RFC3339,double,string,string
#group,false,false,true,false,false,false
#default,_result,,,,,
,result,table,_time,_value,Axis,Node
,,0,2024-11-10T00:00:00Z,1.5,X,A1-ROB
,,0,2024-11-10T00:00:00Z,2.5,Y,A1-ROB
,,1,2024-11-10T00:00:01.25Z,3,X,A1-ROB
";

    #[test]
    fn test_decode_grouped_tables() {
        let tables = decode_tables(GROUPED).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].observations.len(), 2);

        let first = &tables[0].observations[0];
        assert_eq!(first.time, Some(Utc.with_ymd_and_hms(2024, 11, 10, 0, 0, 0).unwrap()));
        assert_eq!(first.value, FieldValue::Number(1.5));
        assert_eq!(first.tags.get("Axis").map(String::as_str), Some("X"));
        assert_eq!(first.tags.get("Node").map(String::as_str), Some("A1-ROB"));
        assert!(!first.tags.contains_key("result"));

        let later = &tables[1].observations[0];
        assert_eq!(later.value, FieldValue::Number(3.0));
        assert_eq!(
            later.time.unwrap().timestamp_millis(),
            Utc.with_ymd_and_hms(2024, 11, 10, 0, 0, 1).unwrap().timestamp_millis() + 250
        );
    }

    #[test]
    fn test_decode_tag_values() {
        let body = "\
#datatype,string,long,string
#group,false,false,false
#default,_result,,
,result,table,_value
,,0,X
,,0,Y
,,0,1
";
        let tables = decode_tables(body).unwrap();
        assert_eq!(tables.len(), 1);
        let values: Vec<String> = tables[0]
            .observations
            .iter()
            .map(|o| o.value.to_string())
            .collect();
        assert_eq!(values, vec!["X", "Y", "1"]);
        assert_eq!(tables[0].observations[2].value, FieldValue::Text("1".to_string()));
    }

    #[test]
    fn test_empty_body_has_no_tables() {
        assert!(decode_tables("").unwrap().is_empty());
        assert!(decode_tables("\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_plain_csv_without_annotations() {
        let body = "\
,result,table,_time,_value
,_result,0,2024-11-10T00:00:00Z,5
,_result,0,2024-11-10T00:00:01Z,6
";
        let tables = decode_tables(body).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].observations[1].value, FieldValue::Number(6.0));
    }

    #[test]
    fn test_error_table() {
        let body = "\
#datatype,string,string
#group,true,true
#default,,
,error,reference
,failed to compile query,897
";
        assert!(matches!(decode_tables(body), Err(ConnectionError::Decode(_))));
    }

    #[test]
    fn test_invalid_time() {
        let body = ",result,table,_time,_value\n,_result,0,yesterday,5\n";
        assert!(matches!(decode_tables(body), Err(ConnectionError::Decode(_))));
    }
}
