// Typed query parameters
use super::error::ValidationError;
use super::node::{NodeCode, NodeKind, Property};
use chrono::{DateTime, FixedOffset, SecondsFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeRange {
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::EndBeforeStart {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn duration_seconds(&self) -> f64 {
        let span = self.end - self.start;
        span.num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or_else(|| span.num_seconds() as f64)
    }

    /// `range(start: .., stop: ..)` arguments, keeping the caller's offset.
    pub fn flux_bounds(&self) -> (String, String) {
        (
            self.start.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            self.end.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Min,
    Max,
    Mean,
}

impl AggregateFn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "mean" => Some(Self::Mean),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSpec {
    pub enabled: bool,
    pub function: AggregateFn,
}

impl AggregationSpec {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            function: AggregateFn::Mean,
        }
    }

    pub fn with(function: AggregateFn) -> Self {
        Self {
            enabled: true,
            function,
        }
    }
}

/// Tag values to restrict a query to, kept in caller order. Empty means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter(Vec<String>);

impl TagFilter {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

/// A validated data query. Only built through request validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    pub nodes: Vec<NodeCode>,
    pub kind: NodeKind,
    pub range: TimeRange,
    pub property: Property,
    pub use_summary_bucket: bool,
    pub aggregation: AggregationSpec,
    pub tags: TagFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = TimeRange::new(at("2024-11-10T02:00:00Z"), at("2024-11-10T00:00:00Z"));
        assert!(matches!(err, Err(ValidationError::EndBeforeStart { .. })));
        assert!(TimeRange::new(at("2024-11-10T00:00:00Z"), at("2024-11-10T00:00:00Z")).is_ok());
    }

    #[test]
    fn test_duration_and_bounds() {
        let range = TimeRange::new(
            at("2024-11-10T00:00:00+00:00"),
            at("2024-11-10T02:59:00.250+00:00"),
        )
        .unwrap();
        assert_eq!(range.duration_seconds(), 10_740.25);

        let (start, stop) = range.flux_bounds();
        assert_eq!(start, "2024-11-10T00:00:00+00:00");
        assert_eq!(stop, "2024-11-10T02:59:00.250+00:00");
    }

    #[test]
    fn test_aggregate_names() {
        assert_eq!(AggregateFn::from_name("max"), Some(AggregateFn::Max));
        assert_eq!(AggregateFn::from_name("median"), None);
        assert_eq!(AggregateFn::Mean.as_str(), "mean");
    }
}
