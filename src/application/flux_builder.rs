// Flux query construction
use crate::application::window::select_window;
use crate::domain::error::ValidationError;
use crate::domain::node::{NodeCode, NodeKind};
use crate::domain::query::{DataQuery, TimeRange};
use crate::infrastructure::config::StoreConfig;

#[derive(Debug, Clone)]
pub struct FluxQueryBuilder {
    store: StoreConfig,
}

impl FluxQueryBuilder {
    pub fn new(store: StoreConfig) -> Self {
        Self { store }
    }

    /// Temperature is never summarised, so it always reads the raw bucket.
    pub fn select_bucket(&self, kind: Option<NodeKind>, use_summary_bucket: bool) -> &str {
        if !use_summary_bucket || kind == Some(NodeKind::Temperature) {
            &self.store.raw_bucket
        } else {
            &self.store.summary_bucket
        }
    }

    pub fn build(&self, query: &DataQuery) -> Result<String, ValidationError> {
        let first = query.nodes.first().ok_or(ValidationError::NoNodes)?;
        let bucket = self.select_bucket(Some(query.kind), query.use_summary_bucket);
        let resolved = first.resolve()?;
        let (start, stop) = query.range.flux_bounds();

        let mut stages = vec![
            format!("from(bucket: {})", flux_string(bucket)),
            format!("|> range(start: {}, stop: {})", start, stop),
            format!(
                "|> filter(fn: (r) => r[\"_measurement\"] == {})",
                flux_string(resolved.measurement)
            ),
            format!(
                "|> filter(fn: (r) => {})",
                disjunction("r[\"Node\"]", query.nodes.iter().map(NodeCode::as_str))
            ),
        ];

        if !query.tags.is_empty() {
            let column = format!("r[{}]", flux_string(resolved.tag_name));
            stages.push(format!(
                "|> filter(fn: (r) => {})",
                disjunction(&column, query.tags.values().iter().map(String::as_str))
            ));
        }

        stages.push(format!(
            "|> filter(fn: (r) => r[\"_field\"] == {})",
            flux_string(query.property.field_name())
        ));

        if query.aggregation.enabled {
            let window = select_window(
                query.range.duration_seconds(),
                self.store.max_points,
                &self.store.interval_ladder,
            );
            tracing::debug!(window_seconds = window.as_seconds(), "Selected aggregation window");
            stages.push(format!(
                "|> aggregateWindow(every: {}, fn: {}, createEmpty: false)",
                window,
                query.aggregation.function.as_str()
            ));
        }

        stages.push("|> drop(columns: [\"_start\", \"_stop\", \"_field\"])".to_string());
        stages.push("|> group(columns: [\"_time\"])".to_string());

        let flux = stages.join("\n");
        tracing::debug!("Built data query:\n{}", flux);
        Ok(flux)
    }

    /// Distinct values of the node's tag, for wide exports without an explicit tag list.
    pub fn build_tag_query(
        &self,
        nodes: &[NodeCode],
        use_summary_bucket: bool,
    ) -> Result<String, ValidationError> {
        let first = nodes.first().ok_or(ValidationError::NoNodes)?;
        let bucket = self.select_bucket(first.kind(), use_summary_bucket);
        let resolved = first.resolve()?;

        let flux = format!(
            "import \"influxdata/influxdb/schema\"\n\
             schema.tagValues(bucket: {}, tag: {}, predicate: (r) => {})",
            flux_string(bucket),
            flux_string(resolved.tag_name),
            disjunction("r.Node", nodes.iter().map(NodeCode::as_str))
        );
        tracing::debug!("Built tag query:\n{}", flux);
        Ok(flux)
    }

    /// Raw counter samples of one cycle-monitoring node.
    pub fn build_cycle_query(&self, node: &str, variable: &str, range: &TimeRange) -> String {
        let (start, stop) = range.flux_bounds();
        let flux = [
            format!("from(bucket: {})", flux_string(&self.store.raw_bucket)),
            format!("|> range(start: {}, stop: {})", start, stop),
            format!(
                "|> filter(fn: (r) => r[\"_measurement\"] == {})",
                flux_string(&self.store.cycle_measurement)
            ),
            format!("|> filter(fn: (r) => r[\"Node\"] == {})", flux_string(node)),
            format!("|> filter(fn: (r) => r[\"_field\"] == {})", flux_string(variable)),
        ]
        .join("\n");
        tracing::debug!("Built cycle query:\n{}", flux);
        flux
    }
}

/// Quoted Flux string literal. Escapes `\`, `"` and the `${` interpolation opener.
pub fn flux_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '$' if chars.peek() == Some(&'{') => quoted.push_str("\\$"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn disjunction<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> String {
    values
        .map(|v| format!("{} == {}", column, flux_string(v)))
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Property;
    use crate::domain::query::{AggregateFn, AggregationSpec, TagFilter};
    use chrono::DateTime;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::new(
            DateTime::parse_from_rfc3339(start).unwrap(),
            DateTime::parse_from_rfc3339(end).unwrap(),
        )
        .unwrap()
    }

    fn query(nodes: &[&str], property: Property) -> DataQuery {
        let nodes: Vec<NodeCode> = nodes.iter().map(|n| NodeCode::new(n)).collect();
        DataQuery {
            kind: nodes[0].kind().unwrap(),
            nodes,
            range: range("2024-11-10T00:00:00+00:00", "2024-11-10T03:00:00+00:00"),
            property,
            use_summary_bucket: true,
            aggregation: AggregationSpec::disabled(),
            tags: TagFilter::default(),
        }
    }

    fn builder() -> FluxQueryBuilder {
        FluxQueryBuilder::new(StoreConfig::default())
    }

    #[test]
    fn test_single_node_query() {
        let flux = builder().build(&query(&["A1-ROB"], Property::Max)).unwrap();
        let expected = [
            "from(bucket: \"Machines_Summary\")",
            "|> range(start: 2024-11-10T00:00:00+00:00, stop: 2024-11-10T03:00:00+00:00)",
            "|> filter(fn: (r) => r[\"_measurement\"] == \"Acceleration\")",
            "|> filter(fn: (r) => r[\"Node\"] == \"A1-ROB\")",
            "|> filter(fn: (r) => r[\"_field\"] == \"Max\")",
            "|> drop(columns: [\"_start\", \"_stop\", \"_field\"])",
            "|> group(columns: [\"_time\"])",
        ]
        .join("\n");
        assert_eq!(flux, expected);
    }

    #[test]
    fn test_multi_node_disjunction() {
        let flux = builder()
            .build(&query(&["C1-CIN", "C2-GEI"], Property::Mean))
            .unwrap();
        assert!(flux.contains(
            "|> filter(fn: (r) => r[\"Node\"] == \"C1-CIN\" or r[\"Node\"] == \"C2-GEI\")"
        ));
        assert!(flux.contains("r[\"_measurement\"] == \"Current\""));
    }

    #[test]
    fn test_tag_filter_only_when_present() {
        let without = builder().build(&query(&["A1-ROB"], Property::Max)).unwrap();
        assert!(!without.contains("r[\"Axis\"]"));

        let mut q = query(&["A1-ROB"], Property::Max);
        q.tags = TagFilter::new(vec!["Z".to_string(), "X".to_string()]);
        let with = builder().build(&q).unwrap();
        assert_eq!(with.matches("r[\"Axis\"]").count(), 2);
        assert!(with.contains("|> filter(fn: (r) => r[\"Axis\"] == \"Z\" or r[\"Axis\"] == \"X\")"));
    }

    #[test]
    fn test_bucket_selection() {
        let b = builder();
        assert_eq!(b.select_bucket(Some(NodeKind::Acceleration), true), "Machines_Summary");
        assert_eq!(b.select_bucket(Some(NodeKind::Acceleration), false), "Machines");
        assert_eq!(b.select_bucket(Some(NodeKind::Temperature), true), "Machines");
        assert_eq!(b.select_bucket(Some(NodeKind::Temperature), false), "Machines");

        let flux = b.build(&query(&["T1-GEI"], Property::Value)).unwrap();
        assert!(flux.starts_with("from(bucket: \"Machines\")"));
        assert!(flux.contains("r[\"_field\"] == \"value\""));
    }

    #[test]
    fn test_aggregate_window_clause() {
        let mut q = query(&["A1-ROB"], Property::Max);
        q.aggregation = AggregationSpec::with(AggregateFn::Max);
        let flux = builder().build(&q).unwrap();
        assert!(flux.contains("|> aggregateWindow(every: 5s, fn: max, createEmpty: false)"));

        let field = flux.find("_field\"] ==").unwrap();
        let window = flux.find("aggregateWindow").unwrap();
        let drop = flux.find("|> drop").unwrap();
        assert!(field < window && window < drop);
    }

    #[test]
    fn test_store_config_is_respected() {
        let store = StoreConfig {
            summary_bucket: "Summary_B".to_string(),
            max_points: 100,
            ..StoreConfig::default()
        };
        let mut q = query(&["A1-ROB"], Property::Min);
        q.aggregation = AggregationSpec::with(AggregateFn::Min);
        let flux = FluxQueryBuilder::new(store).build(&q).unwrap();
        assert!(flux.starts_with("from(bucket: \"Summary_B\")"));
        // 10800s / 100 = 108s = 1.8m
        assert!(flux.contains("every: 2m"));
    }

    #[test]
    fn test_reserved_node_has_no_measurement() {
        let nodes = vec![NodeCode::new("1-XYZ")];
        let mut q = query(&["A1-ROB"], Property::Max);
        q.nodes = nodes;
        assert!(matches!(
            builder().build(&q),
            Err(ValidationError::UnknownNodeKind(_))
        ));
    }

    #[test]
    fn test_tag_query() {
        let nodes = vec![NodeCode::new("A1-ROB"), NodeCode::new("A2-GEI")];
        let flux = builder().build_tag_query(&nodes, true).unwrap();
        assert_eq!(
            flux,
            "import \"influxdata/influxdb/schema\"\n\
             schema.tagValues(bucket: \"Machines_Summary\", tag: \"Axis\", \
             predicate: (r) => r.Node == \"A1-ROB\" or r.Node == \"A2-GEI\")"
        );

        let temp = builder()
            .build_tag_query(&[NodeCode::new("T1-GEI")], true)
            .unwrap();
        assert!(temp.contains("bucket: \"Machines\", tag: \"Name\""));
    }

    #[test]
    fn test_cycle_query() {
        let flux = builder().build_cycle_query(
            "B1-CIN",
            "R20",
            &range("2024-11-10T00:00:00+00:00", "2024-11-10T02:59:00+00:00"),
        );
        assert!(flux.starts_with("from(bucket: \"Machines\")"));
        assert!(flux.contains("r[\"_measurement\"] == \"BFC\""));
        assert!(flux.contains("r[\"Node\"] == \"B1-CIN\""));
        assert!(flux.contains("r[\"_field\"] == \"R20\""));
        assert!(!flux.contains("group("));
    }

    #[test]
    fn test_bucket_follows_query_kind() {
        let mut q = query(&["A1-ROB"], Property::Max);
        q.kind = NodeKind::Temperature;
        let flux = builder().build(&q).unwrap();
        assert!(flux.starts_with("from(bucket: \"Machines\")"));
    }

    #[test]
    fn test_flux_string_escaping() {
        assert_eq!(flux_string("A1-ROB"), "\"A1-ROB\"");
        assert_eq!(flux_string("X\"Y"), "\"X\\\"Y\"");
        assert_eq!(flux_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(flux_string("${x}"), "\"\\${x}\"");
        assert_eq!(flux_string("cost $5 {net}"), "\"cost $5 {net}\"");
    }

    #[test]
    fn test_quoted_tag_cannot_add_stages() {
        let mut q = query(&["A1-ROB"], Property::Max);
        q.tags = TagFilter::new(vec![
            "X\") |> drop(columns: [\"Axis\"]) |> filter(fn: (r) => r[\"Axis\"] == \"Y".to_string(),
        ]);
        let flux = builder().build(&q).unwrap();

        assert_eq!(flux.lines().count(), 8);
        assert!(flux.contains(
            "|> filter(fn: (r) => r[\"Axis\"] == \"X\\\") |> drop(columns: [\\\"Axis\\\"]) \
             |> filter(fn: (r) => r[\\\"Axis\\\"] == \\\"Y\")"
        ));
        assert!(!flux.contains("|> drop(columns: [\"Axis\"])"));
    }

    #[test]
    fn test_cycle_query_escapes_values() {
        let flux = builder().build_cycle_query(
            "B1-CIN\"",
            "R20\") |> yield(name: \"${x}",
            &range("2024-11-10T00:00:00+00:00", "2024-11-10T02:59:00+00:00"),
        );
        assert_eq!(flux.lines().count(), 5);
        assert!(flux.contains("r[\"Node\"] == \"B1-CIN\\\"\")"));
        assert!(flux.contains("r[\"_field\"] == \"R20\\\") |> yield(name: \\\"\\${x}\")"));
        assert!(!flux.contains("|> yield(name: \"${x}"));
    }
}
