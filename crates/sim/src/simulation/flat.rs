//! Flat configuration records.
//!
//! A flat record names every option at the top level (`years`,
//! `initial_females`, `catastrophe_prob`, `demo_noise_enabled`, ...). Options
//! that are absent keep their built-in default. [`Configuration::parse_json`]
//! accepts either this form or the nested one.

use crate::dynamics::{CapacityStrategy, CarryingCapacity, CatastropheModel};
use crate::errors::ConfigurationError;
use crate::simulation::{Configuration, ExtinctionCriterion, MatingSystem, OldestClass};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level keys that mark the nested form.
const NESTED_SECTIONS: [&str; 5] = ["execution", "rates", "initial", "dynamics", "extinction"];

/// Every option named at the top level.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlatConfig {
    pub years: Option<usize>,
    pub n_sim: Option<usize>,
    pub seed: Option<u64>,
    pub parallel: Option<bool>,
    pub female_survival: Option<Vec<f64>>,
    pub male_survival: Option<Vec<f64>>,
    pub female_fertility: Option<Vec<f64>>,
    pub male_fertility: Option<Vec<f64>>,
    pub initial_females: Option<Vec<u64>>,
    pub initial_males: Option<Vec<u64>>,
    pub q_threshold: Option<u64>,
    pub extinction_criterion: Option<ExtinctionCriterion>,
    /// `null` or absent disables the capacity
    pub carrying_capacity: Option<u64>,
    pub capacity_strategy: Option<CapacityStrategy>,
    pub catastrophe_prob: Option<f64>,
    pub catastrophe_mort: Option<f64>,
    pub env_sd_survival: Option<f64>,
    pub env_sd_fertility: Option<f64>,
    pub demo_noise_enabled: Option<bool>,
    pub env_noise_enabled: Option<bool>,
    pub oldest_class: Option<OldestClass>,
    pub mating_system: Option<MatingSystem>,
    pub min_breeding_age: Option<usize>,
    pub male_birth_proportion: Option<f64>,
    /// Keys this record does not recognize
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl FlatConfig {
    /// Apply the options that are present on top of `config`.
    pub fn apply_to(&self, config: &mut Configuration) -> Result<(), ConfigurationError> {
        for key in self.unknown.keys() {
            tracing::warn!(key = %key, "ignoring unrecognized configuration option");
        }

        let execution = &mut config.execution;
        if let Some(years) = self.years {
            execution.years = years;
        }
        if let Some(n_sim) = self.n_sim {
            execution.n_sim = n_sim;
        }
        if self.seed.is_some() {
            execution.seed = self.seed;
        }
        if let Some(parallel) = self.parallel {
            execution.parallel = parallel;
        }

        let rates = &mut config.rates;
        for (value, target) in [
            (&self.female_survival, &mut rates.female_survival),
            (&self.male_survival, &mut rates.male_survival),
            (&self.female_fertility, &mut rates.female_fertility),
            (&self.male_fertility, &mut rates.male_fertility),
        ] {
            if let Some(values) = value {
                target.clone_from(values);
            }
        }
        if let Some(sd) = self.env_sd_survival {
            rates.env_sd_survival = sd;
        }
        if let Some(sd) = self.env_sd_fertility {
            rates.env_sd_fertility = sd;
        }

        if let Some(females) = &self.initial_females {
            config.initial.females.clone_from(females);
        }
        if let Some(males) = &self.initial_males {
            config.initial.males.clone_from(males);
        }

        if let Some(q) = self.q_threshold {
            config.extinction.q_threshold = q;
        }
        if let Some(criterion) = self.extinction_criterion {
            config.extinction.criterion = criterion;
        }

        let dynamics = &mut config.dynamics;
        if let Some(enabled) = self.demo_noise_enabled {
            dynamics.noise.demographic = enabled;
        }
        if let Some(enabled) = self.env_noise_enabled {
            dynamics.noise.environmental = enabled;
        }
        if let Some(oldest_class) = self.oldest_class {
            dynamics.oldest_class = oldest_class;
        }
        if let Some(mating_system) = self.mating_system {
            dynamics.mating_system = mating_system;
        }
        if let Some(age) = self.min_breeding_age {
            dynamics.min_breeding_age = age;
        }
        if let Some(p_male) = self.male_birth_proportion {
            dynamics.male_birth_proportion = p_male;
        }

        if self.catastrophe_prob.is_some() || self.catastrophe_mort.is_some() {
            let model = CatastropheModel::new(
                self.catastrophe_prob.unwrap_or(0.0),
                self.catastrophe_mort.unwrap_or(0.0),
            )?;
            dynamics.catastrophe = model.is_active().then_some(model);
        }

        match (self.carrying_capacity, self.capacity_strategy) {
            (Some(limit), strategy) => {
                dynamics.carrying_capacity =
                    Some(CarryingCapacity::new(limit, strategy.unwrap_or_default())?);
            }
            (None, Some(_)) => return Err(ConfigurationError::MissingRequired("carrying_capacity")),
            (None, None) => {}
        }

        Ok(())
    }

    /// The built-in defaults overlaid with this record.
    pub fn into_configuration(self) -> Result<Configuration, ConfigurationError> {
        let mut config = Configuration::default();
        self.apply_to(&mut config)?;
        Ok(config)
    }
}

impl Configuration {
    /// Parse a JSON configuration in either the nested or the flat form,
    /// without validating it.
    ///
    /// A top-level object with any of the `execution`, `rates`, `initial`,
    /// `dynamics` or `extinction` keys is read as the nested form.
    pub fn parse_json(json: &str) -> Result<Self, ConfigurationError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let nested = value
            .as_object()
            .is_some_and(|map| NESTED_SECTIONS.iter().any(|key| map.contains_key(*key)));
        if nested {
            Ok(serde_json::from_value(value)?)
        } else {
            let flat: FlatConfig = serde_json::from_value(value)?;
            flat.into_configuration()
        }
    }
}
