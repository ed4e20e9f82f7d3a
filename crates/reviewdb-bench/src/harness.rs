//! Benchmark harness.
//!
//! Runs the insertion, reading and search phases one after another against a
//! baseline and a candidate backend, then aggregates the samples into a
//! [`BenchReport`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reviewdb_core::Candidates;

use crate::backends::BackendAdapter;
use crate::config::BenchConfig;
use crate::error::{BackendError, BenchError, Result};
use crate::report::{BackendTiming, BenchReport, PhaseReport};
use crate::workload::WorkloadGenerator;

/// A timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Insertion,
    Reading,
    Search,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Insertion, Phase::Reading, Phase::Search];

    /// Key used in the result object.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Insertion => "insertion",
            Phase::Reading => "reading",
            Phase::Search => "search",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the harness is in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    Idle,
    Generating,
    Running(Phase),
    Aggregating,
    Done,
}

/// Successful samples and failure count for one backend in one phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseSamples {
    samples: Vec<Duration>,
    failures: usize,
}

impl PhaseSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a successful sample, or count a failure.
    pub fn record(&mut self, outcome: std::result::Result<Duration, BackendError>) -> bool {
        match outcome {
            Ok(elapsed) => {
                self.samples.push(elapsed);
                true
            }
            Err(_) => {
                self.failures += 1;
                false
            }
        }
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    pub fn successes(&self) -> usize {
        self.samples.len()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Sum of successful samples.
    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    /// Arithmetic mean of successful samples; `None` without any.
    pub fn mean(&self) -> Option<Duration> {
        let n = u32::try_from(self.samples.len()).ok().filter(|n| *n > 0)?;
        Some(self.total() / n)
    }
}

/// Samples for both backends in one phase.
#[derive(Debug, Default)]
struct PhaseRun {
    baseline: PhaseSamples,
    candidate: PhaseSamples,
}

/// Drives a comparison between two backends.
///
/// Both adapters are owned by the harness and released when it is dropped.
pub struct BenchmarkHarness {
    baseline: Box<dyn BackendAdapter>,
    candidate: Box<dyn BackendAdapter>,
    candidates: Arc<Candidates>,
    config: BenchConfig,
    state: HarnessState,
}

impl BenchmarkHarness {
    /// `baseline` is the reference backend for percentage comparisons.
    pub fn new(
        baseline: Box<dyn BackendAdapter>,
        candidate: Box<dyn BackendAdapter>,
        candidates: Arc<Candidates>,
        config: BenchConfig,
    ) -> Self {
        Self {
            baseline,
            candidate,
            candidates,
            config,
            state: HarnessState::Idle,
        }
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn baseline(&self) -> &dyn BackendAdapter {
        self.baseline.as_ref()
    }

    pub fn candidate(&self) -> &dyn BackendAdapter {
        self.candidate.as_ref()
    }

    /// Run every phase and aggregate the results.
    pub fn run(&mut self) -> Result<BenchReport> {
        self.transition(HarnessState::Generating);
        let generator = WorkloadGenerator::new(self.candidates.clone(), self.config.seed)?;
        let workload = generator.pairs(self.config.reviews);
        tracing::info!(records = workload.len(), seed = self.config.seed, "workload generated");

        self.transition(HarnessState::Running(Phase::Insertion));
        let insertion = self.run_phase(Phase::Insertion, |backend| {
            vec![backend.insert_batch(&workload)]
        });

        // Keys and terms are drawn once so both backends see the same sequence.
        self.transition(HarnessState::Running(Phase::Reading));
        let keys = self.draw_keys();
        let reading = self.run_phase(Phase::Reading, |backend| {
            keys.iter().map(|&key| backend.query_by_key(key)).collect()
        });

        self.transition(HarnessState::Running(Phase::Search));
        let terms = self.draw_terms();
        let limit = self.config.search_limit;
        let search = self.run_phase(Phase::Search, |backend| {
            terms
                .iter()
                .map(|term| backend.text_search(term, limit))
                .collect()
        });

        self.transition(HarnessState::Aggregating);
        let report = BenchReport {
            insertion: self.aggregate(Phase::Insertion, &insertion)?,
            reading: self.aggregate(Phase::Reading, &reading)?,
            search: self.aggregate(Phase::Search, &search)?,
        };

        self.transition(HarnessState::Done);
        Ok(report)
    }

    fn transition(&mut self, next: HarnessState) {
        tracing::debug!(from = ?self.state, to = ?next, "harness state");
        self.state = next;
    }

    /// Run `op` against the baseline, then the candidate.
    fn run_phase<F>(&mut self, phase: Phase, mut op: F) -> PhaseRun
    where
        F: FnMut(&mut dyn BackendAdapter) -> Vec<std::result::Result<Duration, BackendError>>,
    {
        tracing::info!(phase = %phase, "phase started");
        let mut run = PhaseRun::default();
        for (backend, samples) in [
            (self.baseline.as_mut(), &mut run.baseline),
            (self.candidate.as_mut(), &mut run.candidate),
        ] {
            let name = backend.name().to_string();
            for outcome in op(backend) {
                if let Err(e) = &outcome {
                    tracing::warn!(phase = %phase, backend = %name, error = %e, "sample dropped");
                }
                samples.record(outcome);
            }
            tracing::info!(
                phase = %phase,
                backend = %name,
                samples = samples.successes(),
                failures = samples.failures(),
                "phase finished"
            );
        }
        run
    }

    fn aggregate(&self, phase: Phase, run: &PhaseRun) -> Result<PhaseReport> {
        Ok(PhaseReport {
            phase,
            baseline: timing(phase, self.baseline.name(), &run.baseline)?,
            candidate: timing(phase, self.candidate.name(), &run.candidate)?,
        })
    }

    fn draw_keys(&self) -> Vec<i64> {
        let ids = &self.candidates.user_ids;
        if ids.is_empty() {
            return Vec::new();
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(1));
        (0..self.config.queries)
            .map(|_| ids[rng.gen_range(0..ids.len())])
            .collect()
    }

    fn draw_terms(&self) -> Vec<String> {
        let terms = &self.config.search_terms;
        if terms.is_empty() {
            return Vec::new();
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(2));
        (0..self.config.queries)
            .map(|_| terms[rng.gen_range(0..terms.len())].clone())
            .collect()
    }
}

/// Insertion reports the raw total; other phases report the mean.
fn timing(phase: Phase, backend: &str, samples: &PhaseSamples) -> Result<BackendTiming> {
    let elapsed = match phase {
        Phase::Insertion if samples.successes() > 0 => Some(samples.total()),
        Phase::Insertion => None,
        Phase::Reading | Phase::Search => samples.mean(),
    };
    let elapsed = elapsed.ok_or_else(|| BenchError::NoSamples {
        phase,
        backend: backend.to_string(),
    })?;
    Ok(BackendTiming {
        backend: backend.to_string(),
        seconds: elapsed.as_secs_f64(),
        samples: samples.successes(),
        failures: samples.failures(),
    })
}
