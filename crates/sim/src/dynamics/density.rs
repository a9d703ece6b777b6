//! Density dependence through a carrying capacity.
//!
//! The capacity is enforced once per step, after catastrophes, on the
//! survivors of the step and the recruits born in it. Three strategies are
//! available; all of them guarantee that the resulting total never exceeds
//! the limit.

use crate::base::{PopulationState, Sex};
use crate::dynamics::StochasticSampler;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// How individuals are removed once the limit is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStrategy {
    /// Scale every age class of both sexes down to the limit.
    #[default]
    Proportional,
    /// Remove the excess starting from the oldest age class.
    Ceiling,
    /// Only recruits that fit under the limit are kept; survivors are
    /// scaled proportionally if they alone exceed it.
    FertilitySuppression,
}

impl CapacityStrategy {
    pub const ALL: [CapacityStrategy; 3] = [
        CapacityStrategy::Proportional,
        CapacityStrategy::Ceiling,
        CapacityStrategy::FertilitySuppression,
    ];
}

/// A carrying capacity and the strategy used to enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryingCapacity {
    limit: u64,
    #[serde(default)]
    strategy: CapacityStrategy,
}

impl CarryingCapacity {
    /// Create a capacity. The limit must be positive.
    pub fn new(limit: u64, strategy: CapacityStrategy) -> Result<Self, ConfigurationError> {
        if limit == 0 {
            return Err(ConfigurationError::NotPositive("carrying_capacity"));
        }
        Ok(Self { limit, strategy })
    }

    /// Proportional capacity.
    pub fn proportional(limit: u64) -> Result<Self, ConfigurationError> {
        Self::new(limit, CapacityStrategy::Proportional)
    }

    #[inline]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    #[inline]
    pub fn strategy(&self) -> CapacityStrategy {
        self.strategy
    }

    /// Combine survivors and recruits into the next state, enforcing the
    /// limit.
    pub fn enforce(
        &self,
        mut survivors: PopulationState,
        mut recruits: PopulationState,
        sampler: &mut StochasticSampler,
    ) -> PopulationState {
        match self.strategy {
            CapacityStrategy::Proportional => {
                survivors.merge(&recruits);
                thin_state(&mut survivors, self.limit, sampler);
            }
            CapacityStrategy::Ceiling => {
                survivors.merge(&recruits);
                self.truncate_oldest_first(&mut survivors, sampler);
            }
            CapacityStrategy::FertilitySuppression => {
                let occupied = survivors.total();
                if occupied >= self.limit {
                    thin_state(&mut survivors, self.limit, sampler);
                    thin_state(&mut recruits, 0, sampler);
                } else {
                    thin_state(&mut recruits, self.limit - occupied, sampler);
                }
                survivors.merge(&recruits);
            }
        }
        survivors
    }

    fn truncate_oldest_first(&self, state: &mut PopulationState, sampler: &mut StochasticSampler) {
        let mut excess = state.total().saturating_sub(self.limit);
        for age in (0..state.age_classes()).rev() {
            if excess == 0 {
                break;
            }
            let (females, males) = state.class(age);
            let class_total = females.saturating_add(males);
            let removed = excess.min(class_total);
            let mut pair = [females, males];
            sampler.thin(&mut pair, class_total - removed);
            state.counts_mut(Sex::Female)[age] = pair[0];
            state.counts_mut(Sex::Male)[age] = pair[1];
            excess -= removed;
        }
    }
}

/// Thin a whole state (all classes, both sexes) to at most `keep`.
fn thin_state(state: &mut PopulationState, keep: u64, sampler: &mut StochasticSampler) {
    if state.total() <= keep {
        return;
    }
    let n = state.age_classes();
    let mut flat: Vec<u64> = state
        .females()
        .iter()
        .chain(state.males())
        .copied()
        .collect();
    sampler.thin(&mut flat, keep);
    state.counts_mut(Sex::Female).copy_from_slice(&flat[..n]);
    state.counts_mut(Sex::Male).copy_from_slice(&flat[n..]);
}
