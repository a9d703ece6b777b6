//! One annual projection step.
//!
//! The step executes in a fixed order:
//!
//! 1. perturb survival and fertility (environmental noise)
//! 2. draw survivors per age class and sex
//! 3. age survivors by one class
//! 4. recruit newborns into class 0
//! 5. catastrophe
//! 6. carrying capacity
//!
//! Every random draw goes through the replicate's [`StochasticSampler`], so
//! the sequence of draws, and therefore the trajectory, is fully determined
//! by the replicate seed.

use crate::base::{PopulationState, RateKind, Sex, StepRates, VitalRates};
use crate::dynamics::StochasticSampler;
use crate::simulation::{DynamicsConfig, MatingSystem, OldestClass};

/// Result of a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Population at the end of the step.
    pub state: PopulationState,
    /// Whether a catastrophe fired during the step.
    pub catastrophe: bool,
}

/// The single-step transition for a fixed set of rates and dynamics.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionStep<'a> {
    rates: &'a VitalRates,
    dynamics: &'a DynamicsConfig,
}

impl<'a> ProjectionStep<'a> {
    /// Both arguments are expected to be validated already.
    pub fn new(rates: &'a VitalRates, dynamics: &'a DynamicsConfig) -> Self {
        Self { rates, dynamics }
    }

    /// Advance `state` by one step and return the next state.
    ///
    /// `state` must have as many age classes as the rates.
    pub fn advance(&self, state: &PopulationState, sampler: &mut StochasticSampler) -> PopulationState {
        self.step(state, sampler).state
    }

    /// Advance `state` by one step, reporting whether a catastrophe occurred.
    pub fn step(&self, state: &PopulationState, sampler: &mut StochasticSampler) -> StepOutcome {
        debug_assert_eq!(state.age_classes(), self.rates.age_classes());
        let step_rates = self.perturb_rates(sampler);
        let mut survivors = self.age_survivors(state, &step_rates, sampler);
        let mut recruits = self.recruit(&survivors, &step_rates, sampler);

        let mut catastrophe = false;
        if let Some(model) = &self.dynamics.catastrophe {
            if model.maybe_trigger(sampler) {
                catastrophe = true;
                model.apply(&mut survivors, sampler);
                model.apply(&mut recruits, sampler);
            }
        }

        let state = match &self.dynamics.carrying_capacity {
            Some(capacity) => capacity.enforce(survivors, recruits, sampler),
            None => {
                survivors.merge(&recruits);
                survivors
            }
        };

        StepOutcome { state, catastrophe }
    }

    /// Draw this step's rates.
    ///
    /// Draw order is female survival, male survival, female fertility, male
    /// fertility, each over all age classes in order.
    pub fn perturb_rates(&self, sampler: &mut StochasticSampler) -> StepRates {
        let mut step_rates = StepRates::from_base(self.rates);
        let sd_survival = self.rates.env_sd_survival;
        let sd_fertility = self.rates.env_sd_fertility;

        for rate in step_rates
            .female_survival
            .iter_mut()
            .chain(step_rates.male_survival.iter_mut())
        {
            *rate = sampler.sample_environmental_rate(*rate, sd_survival, RateKind::Survival);
        }
        for rate in step_rates
            .female_fertility
            .iter_mut()
            .chain(step_rates.male_fertility.iter_mut())
        {
            *rate = sampler.sample_environmental_rate(*rate, sd_fertility, RateKind::Fertility);
        }

        step_rates
    }

    /// Survival followed by aging.
    fn age_survivors(
        &self,
        state: &PopulationState,
        step_rates: &StepRates,
        sampler: &mut StochasticSampler,
    ) -> PopulationState {
        let n = state.age_classes();
        let mut aged = PopulationState::empty(n);

        for sex in Sex::BOTH {
            let survival = step_rates.survival(sex);
            let next = aged.counts_mut(sex);
            for (age, &count) in state.counts(sex).iter().enumerate() {
                let survivors = sampler.sample_demographic_survivors(count, survival[age]);
                if age + 1 < n {
                    next[age + 1] = next[age + 1].saturating_add(survivors);
                } else if self.dynamics.oldest_class == OldestClass::Accumulate {
                    next[age] = next[age].saturating_add(survivors);
                }
            }
        }

        aged
    }

    /// Newborns of this step, all in class 0.
    fn recruit(
        &self,
        aged: &PopulationState,
        step_rates: &StepRates,
        sampler: &mut StochasticSampler,
    ) -> PopulationState {
        let n = aged.age_classes();
        let mut recruits = PopulationState::empty(n);

        if self.dynamics.mating_system == MatingSystem::MateLimited && !self.has_breeding_males(aged) {
            return recruits;
        }

        let min_age = self.dynamics.min_breeding_age;
        let fertility = step_rates.fertility(Sex::Female);
        let mut births = 0u64;
        for (age, &females) in aged.females().iter().enumerate().skip(min_age) {
            if fertility[age] > 0.0 {
                births = births.saturating_add(sampler.sample_offspring(females, fertility[age]));
            }
        }

        let (females, males) = sampler.split_offspring(births, self.dynamics.male_birth_proportion);
        recruits.counts_mut(Sex::Female)[0] = females;
        recruits.counts_mut(Sex::Male)[0] = males;
        recruits
    }

    fn has_breeding_males(&self, aged: &PopulationState) -> bool {
        aged.males()
            .iter()
            .zip(self.rates.fertility(Sex::Male))
            .skip(self.dynamics.min_breeding_age)
            .any(|(&count, &fertility)| count > 0 && fertility > 0.0)
    }
}
