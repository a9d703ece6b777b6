//! Per-replicate population trajectories.

use crate::base::PopulationState;
use crate::simulation::ExtinctionCriterion;
use serde::{Deserialize, Serialize};

/// Snapshots of one replicate, index 0 being the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationTrajectory {
    replicate: usize,
    seed: u64,
    states: Vec<PopulationState>,
    extinction_time: Option<usize>,
    catastrophe_steps: Vec<usize>,
    clamped_rates: usize,
}

impl PopulationTrajectory {
    /// Assemble a trajectory and detect its quasi-extinction time.
    pub fn new(
        replicate: usize,
        seed: u64,
        states: Vec<PopulationState>,
        catastrophe_steps: Vec<usize>,
        clamped_rates: usize,
        q_threshold: u64,
        criterion: ExtinctionCriterion,
    ) -> Self {
        let extinction_time = first_time_at_or_below(&states, q_threshold, criterion);
        Self {
            replicate,
            seed,
            states,
            extinction_time,
            catastrophe_steps,
            clamped_rates,
        }
    }

    /// Index of the replicate within its batch.
    #[inline]
    pub fn replicate(&self) -> usize {
        self.replicate
    }

    /// Seed of this replicate's sampler.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn states(&self) -> &[PopulationState] {
        &self.states
    }

    /// Number of projected steps.
    #[inline]
    pub fn years(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    /// First step whose monitored count was at or below the threshold the
    /// trajectory was recorded with.
    #[inline]
    pub fn extinction_time(&self) -> Option<usize> {
        self.extinction_time
    }

    #[inline]
    pub fn is_extinct(&self) -> bool {
        self.extinction_time.is_some()
    }

    /// Steps (1-based) in which a catastrophe fired.
    #[inline]
    pub fn catastrophe_steps(&self) -> &[usize] {
        &self.catastrophe_steps
    }

    /// Environmental draws that were clamped into range.
    #[inline]
    pub fn clamped_rates(&self) -> usize {
        self.clamped_rates
    }

    pub fn initial_state(&self) -> Option<&PopulationState> {
        self.states.first()
    }

    pub fn final_state(&self) -> Option<&PopulationState> {
        self.states.last()
    }

    /// Total population at each step.
    pub fn totals(&self) -> Vec<u64> {
        self.states.iter().map(PopulationState::total).collect()
    }

    /// Recompute the extinction time for another threshold or criterion.
    pub fn first_time_at_or_below(
        &self,
        q_threshold: u64,
        criterion: ExtinctionCriterion,
    ) -> Option<usize> {
        first_time_at_or_below(&self.states, q_threshold, criterion)
    }
}

fn first_time_at_or_below(
    states: &[PopulationState],
    q_threshold: u64,
    criterion: ExtinctionCriterion,
) -> Option<usize> {
    states
        .iter()
        .position(|state| criterion.monitored(state) <= q_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(totals: &[(u64, u64)]) -> Vec<PopulationState> {
        totals
            .iter()
            .map(|&(f, m)| PopulationState::new(vec![f], vec![m]).unwrap())
            .collect()
    }

    #[test]
    fn test_extinction_time_detected() {
        let t = PopulationTrajectory::new(
            0,
            1,
            states(&[(10, 10), (6, 6), (3, 2), (0, 0)]),
            vec![],
            0,
            5,
            ExtinctionCriterion::Total,
        );
        assert_eq!(t.extinction_time(), Some(2));
        assert_eq!(t.years(), 3);
        assert_eq!(t.totals(), vec![20, 12, 5, 0]);
    }

    #[test]
    fn test_extinction_at_step_zero() {
        let t = PopulationTrajectory::new(
            0,
            1,
            states(&[(0, 0), (0, 0)]),
            vec![],
            0,
            0,
            ExtinctionCriterion::Total,
        );
        assert_eq!(t.extinction_time(), Some(0));
    }

    #[test]
    fn test_never_extinct() {
        let t = PopulationTrajectory::new(
            3,
            7,
            states(&[(10, 10), (12, 11)]),
            vec![1],
            2,
            5,
            ExtinctionCriterion::Total,
        );
        assert!(!t.is_extinct());
        assert_eq!(t.replicate(), 3);
        assert_eq!(t.catastrophe_steps(), &[1]);
        assert_eq!(t.clamped_rates(), 2);
    }

    #[test]
    fn test_limiting_sex_criterion() {
        let t = PopulationTrajectory::new(
            0,
            1,
            states(&[(20, 10), (30, 4), (40, 1)]),
            vec![],
            0,
            5,
            ExtinctionCriterion::LimitingSex,
        );
        assert_eq!(t.extinction_time(), Some(1));
        assert_eq!(t.first_time_at_or_below(5, ExtinctionCriterion::Total), None);
        assert_eq!(t.first_time_at_or_below(1, ExtinctionCriterion::LimitingSex), Some(2));
    }
}
