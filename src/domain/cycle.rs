// Production cycle segmentation
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cycle {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(rename = "cycleDuration")]
    pub duration_seconds: f64,
    #[serde(rename = "cycleID")]
    pub cycle_id: f64,
}

/// Emits one cycle wherever a nonzero counter advances by exactly one.
///
/// Only indices `1..n-1` are start candidates: the first and last samples
/// never open a cycle.
pub fn segment_cycles(samples: &[CounterSample]) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    for i in 1..samples.len().saturating_sub(1) {
        let current = samples[i];
        let next = samples[i + 1];
        if current.value != 0.0 && next.value - current.value == 1.0 {
            cycles.push(Cycle {
                start: current.time,
                end: next.time,
                duration_seconds: seconds_between(current.time, next.time),
                cycle_id: current.value,
            });
        }
    }
    cycles
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let span = end - start;
    span.num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| span.num_seconds() as f64)
}
