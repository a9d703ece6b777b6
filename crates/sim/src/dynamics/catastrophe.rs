//! Catastrophic mortality events.
//!
//! A catastrophe is a rare event that, when it fires, removes the same
//! fraction of every age class of both sexes. It is checked once per step
//! after survival and reproduction and before the carrying capacity.

use crate::base::{PopulationState, Sex};
use crate::dynamics::StochasticSampler;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Probability and severity of a catastrophe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatastropheModel {
    /// Probability that the event occurs in a given step.
    probability: f64,
    /// Fraction of individuals removed when it occurs.
    mortality: f64,
}

impl CatastropheModel {
    /// Create a validated catastrophe model.
    pub fn new(probability: f64, mortality: f64) -> Result<Self, ConfigurationError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigurationError::InvalidProbability(
                "catastrophe_prob",
                probability,
            ));
        }
        if !(0.0..=1.0).contains(&mortality) {
            return Err(ConfigurationError::InvalidProbability(
                "catastrophe_mort",
                mortality,
            ));
        }
        Ok(Self {
            probability,
            mortality,
        })
    }

    #[inline]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    #[inline]
    pub fn mortality(&self) -> f64 {
        self.mortality
    }

    /// Whether the model can ever change the population.
    pub fn is_active(&self) -> bool {
        self.probability > 0.0 && self.mortality > 0.0
    }

    /// Draw whether the catastrophe occurs this step.
    pub fn maybe_trigger(&self, sampler: &mut StochasticSampler) -> bool {
        sampler.bernoulli(self.probability)
    }

    /// Remove the mortality fraction from every class of `state`.
    ///
    /// Each count keeps `1 - mortality` of its individuals using the same
    /// rounding or binomial rule as ordinary survival, so a count never drops
    /// below zero or rises above its original value.
    pub fn apply(&self, state: &mut PopulationState, sampler: &mut StochasticSampler) {
        let survival = 1.0 - self.mortality;
        for sex in Sex::BOTH {
            for count in state.counts_mut(sex) {
                *count = sampler.sample_demographic_survivors(*count, survival);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::NoiseConfig;

    #[test]
    fn test_validation() {
        assert!(CatastropheModel::new(0.1, 0.5).is_ok());
        assert_eq!(
            CatastropheModel::new(1.5, 0.5).unwrap_err(),
            ConfigurationError::InvalidProbability("catastrophe_prob", 1.5)
        );
        assert_eq!(
            CatastropheModel::new(0.1, -0.1).unwrap_err(),
            ConfigurationError::InvalidProbability("catastrophe_mort", -0.1)
        );
    }

    #[test]
    fn test_is_active() {
        assert!(CatastropheModel::new(0.1, 0.5).unwrap().is_active());
        assert!(!CatastropheModel::new(0.0, 0.5).unwrap().is_active());
        assert!(!CatastropheModel::new(0.3, 0.0).unwrap().is_active());
    }

    #[test]
    fn test_trigger_extremes() {
        let mut sampler = StochasticSampler::from_seed(1, NoiseConfig::full());
        let always = CatastropheModel::new(1.0, 0.5).unwrap();
        let never = CatastropheModel::new(0.0, 0.5).unwrap();
        for _ in 0..100 {
            assert!(always.maybe_trigger(&mut sampler));
            assert!(!never.maybe_trigger(&mut sampler));
        }
    }

    #[test]
    fn test_apply_deterministic_halves() {
        let mut sampler = StochasticSampler::from_seed(1, NoiseConfig::deterministic());
        let model = CatastropheModel::new(1.0, 0.5).unwrap();
        let mut state = PopulationState::new(vec![0, 10], vec![0, 10]).unwrap();
        model.apply(&mut state, &mut sampler);
        assert_eq!(state.females(), &[0, 5]);
        assert_eq!(state.males(), &[0, 5]);
    }

    #[test]
    fn test_apply_total_mortality() {
        let mut sampler = StochasticSampler::from_seed(1, NoiseConfig::full());
        let model = CatastropheModel::new(1.0, 1.0).unwrap();
        let mut state = PopulationState::new(vec![30, 12, 4], vec![25, 9, 1]).unwrap();
        model.apply(&mut state, &mut sampler);
        assert!(state.is_empty());
    }

    #[test]
    fn test_apply_never_increases() {
        let mut sampler = StochasticSampler::from_seed(8, NoiseConfig::full());
        let model = CatastropheModel::new(1.0, 0.3).unwrap();
        let original = PopulationState::new(vec![40, 22, 7], vec![38, 20, 3]).unwrap();
        let mut state = original.clone();
        model.apply(&mut state, &mut sampler);
        for sex in Sex::BOTH {
            for (after, before) in state.counts(sex).iter().zip(original.counts(sex)) {
                assert!(after <= before);
            }
        }
    }
}
