//! Synthetic time-series generation.
//!
//! Every step emits one sample per series, all sharing the step's timestamp,
//! then moves the clock one minute back. Each series keeps its own running
//! value, advanced by its [`DeltaPolicy`] after every emitted sample.

mod policy;

use crate::types::Sample;

pub use policy::DeltaPolicy;

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Seconds between two consecutive steps.
pub const STEP_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub label: String,
    #[serde(flatten)]
    pub policy: DeltaPolicy,
}

impl SeriesSpec {
    pub fn new<T: Into<String>>(label: T, policy: DeltaPolicy) -> Self {
        Self {
            label: label.into(),
            policy,
        }
    }
}

/// Series `A` walks by whole steps in `[-10, 10]`, series `B` only climbs.
pub fn default_series() -> Vec<SeriesSpec> {
    vec![
        SeriesSpec::new("A", DeltaPolicy::BoundedWalk { bound: 10 }),
        SeriesSpec::new("B", DeltaPolicy::NonNegative { max: 1.0 }),
    ]
}

/// Generation state carried from one emitted sample to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    pub next_id: u64,
    pub timestamp: i64,
    /// Running value per series, in series order.
    pub values: Vec<f64>,
}

impl Accumulator {
    pub fn new(start: i64, series: usize) -> Self {
        Self {
            next_id: 0,
            timestamp: start,
            values: vec![0.0; series],
        }
    }

    /// Emits the current sample of series `index` and advances that series.
    pub fn emit<R: Rng + ?Sized>(
        mut self,
        index: usize,
        spec: &SeriesSpec,
        rng: &mut R,
    ) -> (Sample, Accumulator) {
        let sample = Sample {
            id: self.next_id,
            timestamp: self.timestamp,
            series_label: spec.label.clone(),
            value: self.values[index],
        };

        self.next_id += 1;
        self.values[index] += spec.policy.delta(rng);
        (sample, self)
    }

    pub fn next_step(self) -> Accumulator {
        Accumulator {
            timestamp: self.timestamp - STEP_SECS,
            ..self
        }
    }
}

/// Lazy sequence of `steps * series.len()` samples.
#[derive(Debug)]
pub struct TimeSeries<R> {
    series: Vec<SeriesSpec>,
    state: Option<Accumulator>,
    steps_left: u64,
    cursor: usize,
    rng: R,
}

/// Starts a fresh sequence at the current wall-clock time.
pub fn generate(steps: u64, series: Vec<SeriesSpec>) -> TimeSeries<StdRng> {
    TimeSeries::with_rng(steps, series, Utc::now(), StdRng::from_os_rng())
}

impl<R: Rng> TimeSeries<R> {
    pub fn with_rng(steps: u64, series: Vec<SeriesSpec>, start: DateTime<Utc>, rng: R) -> Self {
        let state = Accumulator::new(start.timestamp(), series.len());
        let steps_left = if series.is_empty() { 0 } else { steps };

        Self {
            series,
            state: Some(state),
            steps_left,
            cursor: 0,
            rng,
        }
    }

    /// Samples still to come, or `None` when the count does not fit in `u64`.
    pub fn remaining(&self) -> Option<u64> {
        self.steps_left
            .checked_mul(self.series.len() as u64)
            .map(|total| total.saturating_sub(self.cursor as u64))
    }
}

impl<R: Rng> Iterator for TimeSeries<R> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.steps_left == 0 {
            return None;
        }

        let state = self.state.take()?;
        let (sample, mut state) = state.emit(self.cursor, &self.series[self.cursor], &mut self.rng);

        self.cursor += 1;
        if self.cursor == self.series.len() {
            self.cursor = 0;
            self.steps_left -= 1;
            state = state.next_step();
        }

        self.state = Some(state);
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining().and_then(|n| usize::try_from(n).ok());
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}
