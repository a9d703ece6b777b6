//! Simulation configuration.
//!
//! `Configuration` is the single immutable record a replicate runner is built
//! from. It can be deserialized from JSON to fully reproduce a run.

use crate::base::{PopulationState, VitalRates};
use crate::dynamics::{CatastropheModel, CarryingCapacity, NoiseConfig};
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The master configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub execution: ExecutionConfig,
    pub rates: VitalRates,
    pub initial: InitialPopulation,
    #[serde(default)]
    pub dynamics: DynamicsConfig,
    #[serde(default)]
    pub extinction: ExtinctionConfig,
}

/// Horizon, replicate count and seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Number of annual steps per replicate
    pub years: usize,
    /// Number of independent replicates
    pub n_sim: usize,
    /// Master seed; `None` draws one from the thread RNG
    #[serde(default)]
    pub seed: Option<u64>,
    /// Run replicates on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl ExecutionConfig {
    /// Create new execution configuration.
    pub fn new(years: usize, n_sim: usize, seed: Option<u64>) -> Self {
        Self {
            years,
            n_sim,
            seed,
            parallel: true,
        }
    }

    /// Run replicates sequentially on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Starting counts per age class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPopulation {
    pub females: Vec<u64>,
    pub males: Vec<u64>,
}

impl InitialPopulation {
    pub fn new(females: Vec<u64>, males: Vec<u64>) -> Self {
        Self { females, males }
    }

    /// Convert to a population state, checking the shape.
    pub fn to_state(&self) -> Result<PopulationState, ConfigurationError> {
        PopulationState::new(self.females.clone(), self.males.clone())
    }
}

/// Fate of survivors in the oldest age class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OldestClass {
    /// Survivors remain in the oldest class (plus group).
    #[default]
    Accumulate,
    /// Individuals leave the population after the oldest class.
    Terminal,
}

/// How males constrain reproduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatingSystem {
    /// Births depend on female fertility only.
    #[default]
    FemaleDominant,
    /// No births in a step without at least one breeding male (a male in a
    /// class with positive male fertility at or above the minimum breeding
    /// age).
    MateLimited,
}

/// Stochastic processes and life-history options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicsConfig {
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catastrophe: Option<CatastropheModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrying_capacity: Option<CarryingCapacity>,
    #[serde(default)]
    pub oldest_class: OldestClass,
    #[serde(default)]
    pub mating_system: MatingSystem,
    /// Youngest age class that can reproduce
    #[serde(default)]
    pub min_breeding_age: usize,
    /// Proportion of births that are male
    #[serde(default = "default_male_birth_proportion")]
    pub male_birth_proportion: f64,
}

fn default_male_birth_proportion() -> f64 {
    0.5
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            catastrophe: None,
            carrying_capacity: None,
            oldest_class: OldestClass::default(),
            mating_system: MatingSystem::default(),
            min_breeding_age: 0,
            male_birth_proportion: default_male_birth_proportion(),
        }
    }
}

/// Count compared against the quasi-extinction threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtinctionCriterion {
    /// Total population of both sexes.
    #[default]
    Total,
    /// Size of the rarer sex.
    LimitingSex,
}

impl ExtinctionCriterion {
    /// The monitored count of `state`.
    #[inline]
    pub fn monitored(self, state: &PopulationState) -> u64 {
        match self {
            Self::Total => state.total(),
            Self::LimitingSex => state.limiting_sex_total(),
        }
    }
}

/// Quasi-extinction threshold and what it is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtinctionConfig {
    /// A replicate is quasi-extinct once the monitored count is at or below
    /// this value
    pub q_threshold: u64,
    #[serde(default)]
    pub criterion: ExtinctionCriterion,
}

impl Default for ExtinctionConfig {
    fn default() -> Self {
        Self {
            q_threshold: 5,
            criterion: ExtinctionCriterion::Total,
        }
    }
}

impl Default for Configuration {
    /// Five age classes, female-only fecundity, 100 replicates of 100 years.
    fn default() -> Self {
        let survival = vec![0.5, 0.7, 0.6, 0.4, 0.2];
        Self {
            execution: ExecutionConfig::new(100, 100, None),
            rates: VitalRates {
                female_survival: survival.clone(),
                male_survival: survival,
                female_fertility: vec![0.0, 2.0, 2.0, 1.0, 0.0],
                male_fertility: vec![0.0; 5],
                env_sd_survival: 0.0,
                env_sd_fertility: 0.0,
            },
            initial: InitialPopulation::new(vec![10, 10, 0, 0, 0], vec![10, 10, 0, 0, 0]),
            dynamics: DynamicsConfig::default(),
            extinction: ExtinctionConfig::default(),
        }
    }
}

impl Configuration {
    /// Check every parameter. Nothing is simulated before this passes.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.execution.years == 0 {
            return Err(ConfigurationError::NotPositive("years"));
        }
        if self.execution.n_sim == 0 {
            return Err(ConfigurationError::NotPositive("n_sim"));
        }

        self.rates.validate()?;
        let classes = self.rates.age_classes();

        if self.initial.females.len() != classes {
            return Err(ConfigurationError::LengthMismatch {
                field: "initial_females",
                expected: classes,
                found: self.initial.females.len(),
            });
        }
        if self.initial.males.len() != classes {
            return Err(ConfigurationError::LengthMismatch {
                field: "initial_males",
                expected: classes,
                found: self.initial.males.len(),
            });
        }

        // Deserialized values bypass the constructors
        if let Some(catastrophe) = &self.dynamics.catastrophe {
            CatastropheModel::new(catastrophe.probability(), catastrophe.mortality())?;
        }
        if let Some(capacity) = &self.dynamics.carrying_capacity {
            CarryingCapacity::new(capacity.limit(), capacity.strategy())?;
        }

        let p_male = self.dynamics.male_birth_proportion;
        if !(0.0..=1.0).contains(&p_male) {
            return Err(ConfigurationError::InvalidProbability(
                "male_birth_proportion",
                p_male,
            ));
        }
        if self.dynamics.min_breeding_age >= classes {
            return Err(ConfigurationError::InvalidBreedingAge {
                age: self.dynamics.min_breeding_age,
                classes,
            });
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration in the nested or flat form.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config = Self::parse_json(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigurationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of age classes.
    pub fn age_classes(&self) -> usize {
        self.rates.age_classes()
    }
}
