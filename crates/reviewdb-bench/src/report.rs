//! Benchmark results.

use std::fmt::Write;

use serde_json::{json, Map, Value};

use crate::harness::Phase;

/// One backend's result for one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendTiming {
    pub backend: String,
    /// Total for insertion, mean for the other phases.
    pub seconds: f64,
    pub samples: usize,
    pub failures: usize,
}

/// Both backends' results for one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub baseline: BackendTiming,
    pub candidate: BackendTiming,
}

impl PhaseReport {
    /// How much faster the candidate is than the baseline, in percent.
    pub fn percent_difference(&self) -> Option<f64> {
        percent_difference(self.baseline.seconds, self.candidate.seconds)
    }

    /// e.g. `sled is 42.10% faster` or `sled is 3.00% slower`. A tie reads
    /// as slower.
    pub fn verdict(&self) -> String {
        match self.percent_difference() {
            Some(pct) if pct > 0.0 => {
                format!("{} is {:.2}% faster", self.candidate.backend, pct)
            }
            Some(pct) => format!("{} is {:.2}% slower", self.candidate.backend, pct.abs()),
            None => format!(
                "no comparison, {} reported zero time",
                self.baseline.backend
            ),
        }
    }
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub insertion: PhaseReport,
    pub reading: PhaseReport,
    pub search: PhaseReport,
}

impl BenchReport {
    pub fn phases(&self) -> [&PhaseReport; 3] {
        [&self.insertion, &self.reading, &self.search]
    }

    pub fn phase(&self, phase: Phase) -> &PhaseReport {
        match phase {
            Phase::Insertion => &self.insertion,
            Phase::Reading => &self.reading,
            Phase::Search => &self.search,
        }
    }

    /// Result object keyed by phase, each mapping backend name to seconds.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for report in self.phases() {
            let mut timings = Map::new();
            for timing in [&report.baseline, &report.candidate] {
                timings.insert(timing.backend.clone(), json!(timing.seconds));
            }
            root.insert(report.phase.name().to_string(), Value::Object(timings));
        }
        Value::Object(root)
    }

    /// Human-readable comparison, one line per phase.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for report in self.phases() {
            let _ = writeln!(
                out,
                "{:<10} {}: {:.6}s  {}: {:.6}s  ({})",
                report.phase.name(),
                report.baseline.backend,
                report.baseline.seconds,
                report.candidate.backend,
                report.candidate.seconds,
                report.verdict()
            );
        }
        out
    }
}

/// `((baseline - candidate) / baseline) * 100`; positive when the candidate
/// is faster. `None` when the baseline is zero.
pub fn percent_difference(baseline: f64, candidate: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    Some((baseline - candidate) / baseline * 100.0)
}
