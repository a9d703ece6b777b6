//! Trajectory envelopes
//!
//! Per-step mean and percentiles of total population across replicates.

use crate::analysis::utils::{mean, percentile_sorted};
use pvasim_sim::simulation::ReplicateBatch;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Distribution of total population across replicates at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    pub step: usize,
    pub mean: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Calculate the envelope of total population for every step.
///
/// Percentiles use linear interpolation between order statistics. Returns an
/// empty vector for an empty batch.
pub fn trajectory_envelope(batch: &ReplicateBatch) -> Vec<EnvelopePoint> {
    if batch.is_empty() {
        return Vec::new();
    }

    let totals: Vec<Vec<u64>> = batch.trajectories.iter().map(|t| t.totals()).collect();
    let steps = totals.iter().map(Vec::len).min().unwrap_or(0);

    (0..steps)
        .into_par_iter()
        .map(|step| {
            let mut values: Vec<f64> = totals.iter().map(|row| row[step] as f64).collect();
            values.sort_by(f64::total_cmp);
            EnvelopePoint {
                step,
                mean: mean(&values),
                p5: percentile_sorted(&values, 5.0),
                p25: percentile_sorted(&values, 25.0),
                p50: percentile_sorted(&values, 50.0),
                p75: percentile_sorted(&values, 75.0),
                p95: percentile_sorted(&values, 95.0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvasim_sim::simulation::SimulationBuilder;

    #[test]
    fn test_deterministic_envelope_is_flat() {
        let batch = SimulationBuilder::new()
            .years(10)
            .replicates(4)
            .seed(42)
            .symmetric_rates(vec![0.6, 0.7, 0.5], vec![0.0, 1.0, 2.0])
            .initial_population(vec![20, 20, 0], vec![20, 20, 0])
            .deterministic()
            .build()
            .unwrap()
            .run();

        let envelope = trajectory_envelope(&batch);
        assert_eq!(envelope.len(), 11);
        assert_eq!(envelope[0].mean, 80.0);
        assert_eq!(envelope[10].p50, 149.0);
        for point in &envelope {
            assert_eq!(point.p5, point.p95);
            assert_eq!(point.mean, point.p50);
        }
    }

    #[test]
    fn test_envelope_ordered() {
        let batch = SimulationBuilder::new()
            .years(25)
            .replicates(30)
            .seed(8)
            .symmetric_rates(vec![0.5, 0.7, 0.6], vec![0.0, 1.2, 1.0])
            .initial_population(vec![15, 10, 5], vec![15, 10, 5])
            .environmental_noise(0.2, 0.3)
            .build()
            .unwrap()
            .run();

        for point in trajectory_envelope(&batch) {
            assert!(point.p5 <= point.p25);
            assert!(point.p25 <= point.p50);
            assert!(point.p50 <= point.p75);
            assert!(point.p75 <= point.p95);
        }
    }
}
