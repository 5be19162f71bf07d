use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Timing entry describing a single stage of a correction run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Aggregated timing trace of a run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn with_total(total_ms: f64) -> Self {
        Self {
            total_ms,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Records the time since `start` under `label` and returns a fresh instant.
    pub fn lap(&mut self, label: impl Into<String>, start: Instant) -> Instant {
        self.push(label, elapsed_ms(start));
        Instant::now()
    }

    /// Appends the stages of `other`, leaving `total_ms` alone.
    pub fn extend(&mut self, other: &TimingBreakdown) {
        self.stages.extend(other.stages.iter().cloned());
    }
}

#[inline]
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_serialize_camel_case() {
        let mut timing = TimingBreakdown::with_total(3.5);
        timing.push("classify", 1.25);
        let json = serde_json::to_value(&timing).unwrap();
        assert_eq!(json["totalMs"], 3.5);
        assert_eq!(json["stages"][0]["label"], "classify");
        assert_eq!(json["stages"][0]["elapsedMs"], 1.25);
    }

    #[test]
    fn lap_and_extend() {
        let mut a = TimingBreakdown::default();
        let next = a.lap("detect", Instant::now());
        assert!(next.elapsed().as_secs_f64() >= 0.0);
        let mut b = TimingBreakdown::with_total(1.0);
        b.extend(&a);
        assert_eq!(b.stages.len(), 1);
        assert_eq!(b.total_ms, 1.0);
    }
}
