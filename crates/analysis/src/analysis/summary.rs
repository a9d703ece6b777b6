//! Extinction statistics
//!
//! Summaries are computed from stored trajectories, so one batch can be
//! analysed at any quasi-extinction threshold, not only the one it was run
//! with. The batch's extinction criterion is always used.

use crate::analysis::envelope::{EnvelopePoint, trajectory_envelope};
use crate::analysis::utils::{mean, median};
use pvasim_sim::base::PopulationState;
use pvasim_sim::simulation::{ExtinctionCriterion, ReplicateBatch};
use serde::{Deserialize, Serialize};

/// Aggregate outcome of a replicate batch.
///
/// `mean_extinction_time` and `median_extinction_time` are computed only over
/// replicates that reached quasi-extinction; replicates that persisted to the
/// horizon are excluded, not counted at the horizon. Both are `None` when no
/// replicate went extinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub n_replicates: usize,
    pub n_extinct: usize,
    pub q_threshold: u64,
    pub criterion: ExtinctionCriterion,
    pub years: usize,
    pub master_seed: u64,
    pub cancelled: bool,
    /// Fraction of replicates that reached the threshold, 0.0 for an empty
    /// batch
    pub extinction_probability: f64,
    pub mean_extinction_time: Option<f64>,
    pub median_extinction_time: Option<f64>,
    /// Mean total population at the horizon across all replicates
    pub mean_final_population: f64,
    pub trajectory_envelope: Vec<EnvelopePoint>,
    /// Fraction of replicates extinct at or before each step
    pub cumulative_extinction: Vec<f64>,
}

/// Extinction probability at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPoint {
    pub q_threshold: u64,
    pub extinction_probability: f64,
}

/// Count of extinction times in `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: usize,
    pub upper: usize,
    pub count: usize,
}

/// Summarize `batch` at `q_threshold`.
pub fn summarize(batch: &ReplicateBatch, q_threshold: u64) -> Summary {
    let times = extinction_times(batch, q_threshold);
    let extinct: Vec<f64> = times.iter().flatten().map(|&t| t as f64).collect();

    let finals: Vec<f64> = batch
        .trajectories
        .iter()
        .map(|t| t.final_state().map_or(0, PopulationState::total) as f64)
        .collect();

    Summary {
        n_replicates: batch.len(),
        n_extinct: extinct.len(),
        q_threshold,
        criterion: batch.criterion,
        years: batch.years,
        master_seed: batch.master_seed,
        cancelled: batch.cancelled,
        extinction_probability: probability(extinct.len(), batch.len()),
        mean_extinction_time: (!extinct.is_empty()).then(|| mean(&extinct)),
        median_extinction_time: median(&extinct),
        mean_final_population: mean(&finals),
        trajectory_envelope: trajectory_envelope(batch),
        cumulative_extinction: cumulative_from_times(&times, batch.years),
    }
}

/// Fraction of replicates extinct at or before each step `0..=years`.
pub fn cumulative_extinction(batch: &ReplicateBatch, q_threshold: u64) -> Vec<f64> {
    cumulative_from_times(&extinction_times(batch, q_threshold), batch.years)
}

/// Extinction probability for each threshold, in the order given.
pub fn extinction_risk_curve(batch: &ReplicateBatch, thresholds: &[u64]) -> Vec<RiskPoint> {
    thresholds
        .iter()
        .map(|&q_threshold| {
            let extinct = extinction_times(batch, q_threshold)
                .iter()
                .filter(|t| t.is_some())
                .count();
            RiskPoint {
                q_threshold,
                extinction_probability: probability(extinct, batch.len()),
            }
        })
        .collect()
}

/// Histogram of extinction times over `bins` equal-width bins covering steps
/// `0..=years`. Persisting replicates are not counted.
pub fn extinction_histogram(
    batch: &ReplicateBatch,
    q_threshold: u64,
    bins: usize,
) -> Vec<HistogramBin> {
    if bins == 0 {
        return Vec::new();
    }
    let span = batch.years + 1;
    let width = span.div_ceil(bins).max(1);

    let mut histogram: Vec<HistogramBin> = (0..span.div_ceil(width))
        .map(|i| HistogramBin {
            lower: i * width,
            upper: ((i + 1) * width).min(span),
            count: 0,
        })
        .collect();

    for time in extinction_times(batch, q_threshold).into_iter().flatten() {
        if let Some(bin) = histogram.get_mut(time / width) {
            bin.count += 1;
        }
    }
    histogram
}

fn extinction_times(batch: &ReplicateBatch, q_threshold: u64) -> Vec<Option<usize>> {
    batch
        .trajectories
        .iter()
        .map(|t| t.first_time_at_or_below(q_threshold, batch.criterion))
        .collect()
}

fn cumulative_from_times(times: &[Option<usize>], years: usize) -> Vec<f64> {
    let mut counts = vec![0usize; years + 1];
    for &time in times.iter().flatten() {
        if let Some(count) = counts.get_mut(time) {
            *count += 1;
        }
    }
    let mut running = 0;
    counts
        .into_iter()
        .map(|count| {
            running += count;
            probability(running, times.len())
        })
        .collect()
}

#[inline]
fn probability(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
