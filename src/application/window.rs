// Aggregation window selection for a point budget
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowUnit {
    Seconds,
    Minutes,
}

impl WindowUnit {
    fn suffix(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Minutes => "m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationWindow {
    pub every: u32,
    pub unit: WindowUnit,
}

impl AggregationWindow {
    pub fn as_seconds(&self) -> u64 {
        match self.unit {
            WindowUnit::Seconds => self.every as u64,
            WindowUnit::Minutes => self.every as u64 * 60,
        }
    }
}

/// Flux duration literal, e.g. `5s` or `2m`.
impl fmt::Display for AggregationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.every, self.unit.suffix())
    }
}

/// Picks the smallest ladder step strictly above `duration / budget`,
/// switching to minutes once the rough interval exceeds 60 seconds.
///
/// When no step is large enough the smallest step (1) is returned. For very
/// long ranges that yields more points than the budget allows.
pub fn select_window(duration_seconds: f64, point_budget: u32, ladder: &[u32]) -> AggregationWindow {
    let mut rough = duration_seconds / point_budget.max(1) as f64;
    let mut unit = WindowUnit::Seconds;
    if rough > 60.0 {
        rough /= 60.0;
        unit = WindowUnit::Minutes;
    }

    let every = match ladder.iter().copied().find(|step| rough < *step as f64) {
        Some(step) => step,
        None => {
            tracing::warn!(
                rough_interval = rough,
                unit = unit.suffix(),
                "no aggregation step exceeds the rough interval, falling back to 1"
            );
            1
        }
    };

    AggregationWindow { every, unit }
}
