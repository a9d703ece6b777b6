//! Builder pattern for creating replicate runners.
//!
//! Provides a fluent API over [`Configuration`] with the usual defaults and
//! the same validation as a configuration file.

use crate::base::VitalRates;
use crate::dynamics::{CapacityStrategy, CarryingCapacity, CatastropheModel, NoiseConfig};
use crate::errors::ConfigurationError;
use crate::simulation::{
    Configuration, DynamicsConfig, ExecutionConfig, ExtinctionConfig, ExtinctionCriterion,
    InitialPopulation, MatingSystem, OldestClass, ReplicateRunner,
};

/// Builder for constructing [`ReplicateRunner`] instances with a fluent API.
///
/// # Examples
///
/// ```
/// use pvasim_sim::simulation::SimulationBuilder;
///
/// let runner = SimulationBuilder::new()
///     .years(10)
///     .replicates(1)
///     .symmetric_rates(vec![0.6, 0.7, 0.5], vec![0.0, 1.0, 2.0])
///     .initial_population(vec![20, 20, 0], vec![20, 20, 0])
///     .deterministic()
///     .seed(42)
///     .build()
///     .unwrap();
///
/// let batch = runner.run();
/// assert_eq!(batch.trajectories[0].states().len(), 11);
/// ```
#[derive(Debug, Clone)]
pub struct SimulationBuilder {
    // Required parameters
    female_survival: Option<Vec<f64>>,
    male_survival: Option<Vec<f64>>,
    female_fertility: Option<Vec<f64>>,
    male_fertility: Option<Vec<f64>>,
    initial: Option<InitialPopulation>,

    years: usize,                   // Default: 100
    n_sim: usize,                   // Default: 100
    seed: Option<u64>,              // Default: None (random)
    parallel: bool,                 // Default: true
    env_sd: (f64, f64),             // Default: no environmental noise
    capacity: Option<(u64, CapacityStrategy)>,
    catastrophe: Option<(f64, f64)>,
    dynamics: DynamicsConfig,
    extinction: ExtinctionConfig,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            female_survival: None,
            male_survival: None,
            female_fertility: None,
            male_fertility: None,
            initial: None,
            years: 100,
            n_sim: 100,
            seed: None,
            parallel: true,
            env_sd: (0.0, 0.0),
            capacity: None,
            catastrophe: None,
            dynamics: DynamicsConfig::default(),
            extinction: ExtinctionConfig::default(),
        }
    }

    /// Number of annual steps per replicate.
    pub fn years(mut self, years: usize) -> Self {
        self.years = years;
        self
    }

    /// Number of replicates.
    pub fn replicates(mut self, n_sim: usize) -> Self {
        self.n_sim = n_sim;
        self
    }

    /// Master seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run replicates on the rayon pool (default) or sequentially.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Female survival and fertility per age class (required).
    pub fn female_rates(mut self, survival: Vec<f64>, fertility: Vec<f64>) -> Self {
        self.female_survival = Some(survival);
        self.female_fertility = Some(fertility);
        self
    }

    /// Male survival and fertility per age class (required).
    pub fn male_rates(mut self, survival: Vec<f64>, fertility: Vec<f64>) -> Self {
        self.male_survival = Some(survival);
        self.male_fertility = Some(fertility);
        self
    }

    /// Same schedule for both sexes.
    pub fn symmetric_rates(self, survival: Vec<f64>, fertility: Vec<f64>) -> Self {
        self.female_rates(survival.clone(), fertility.clone())
            .male_rates(survival, fertility)
    }

    /// Use an existing rate specification, including its noise magnitudes.
    pub fn rates(mut self, rates: VitalRates) -> Self {
        self.env_sd = (rates.env_sd_survival, rates.env_sd_fertility);
        self.female_survival = Some(rates.female_survival);
        self.male_survival = Some(rates.male_survival);
        self.female_fertility = Some(rates.female_fertility);
        self.male_fertility = Some(rates.male_fertility);
        self
    }

    /// Starting counts per age class (required).
    pub fn initial_population(mut self, females: Vec<u64>, males: Vec<u64>) -> Self {
        self.initial = Some(InitialPopulation::new(females, males));
        self
    }

    /// Standard deviations of the multiplicative rate noise.
    pub fn environmental_noise(mut self, sd_survival: f64, sd_fertility: f64) -> Self {
        self.env_sd = (sd_survival, sd_fertility);
        self
    }

    pub fn noise(mut self, noise: NoiseConfig) -> Self {
        self.dynamics.noise = noise;
        self
    }

    /// Disable both noise sources.
    pub fn deterministic(self) -> Self {
        self.noise(NoiseConfig::deterministic())
    }

    pub fn carrying_capacity(mut self, limit: u64, strategy: CapacityStrategy) -> Self {
        self.capacity = Some((limit, strategy));
        self
    }

    /// Per-step probability and mortality fraction of a catastrophe.
    pub fn catastrophe(mut self, probability: f64, mortality: f64) -> Self {
        self.catastrophe = Some((probability, mortality));
        self
    }

    pub fn oldest_class(mut self, oldest_class: OldestClass) -> Self {
        self.dynamics.oldest_class = oldest_class;
        self
    }

    pub fn mating_system(mut self, mating_system: MatingSystem) -> Self {
        self.dynamics.mating_system = mating_system;
        self
    }

    pub fn min_breeding_age(mut self, age: usize) -> Self {
        self.dynamics.min_breeding_age = age;
        self
    }

    pub fn male_birth_proportion(mut self, proportion: f64) -> Self {
        self.dynamics.male_birth_proportion = proportion;
        self
    }

    /// Quasi-extinction threshold.
    pub fn q_threshold(mut self, threshold: u64) -> Self {
        self.extinction.q_threshold = threshold;
        self
    }

    pub fn extinction_criterion(mut self, criterion: ExtinctionCriterion) -> Self {
        self.extinction.criterion = criterion;
        self
    }

    /// Assemble and validate the configuration without creating a runner.
    pub fn build_config(self) -> Result<Configuration, ConfigurationError> {
        let female_survival = self
            .female_survival
            .ok_or(ConfigurationError::MissingRequired("female_survival"))?;
        let female_fertility = self
            .female_fertility
            .ok_or(ConfigurationError::MissingRequired("female_fertility"))?;
        let male_survival = self
            .male_survival
            .ok_or(ConfigurationError::MissingRequired("male_survival"))?;
        let male_fertility = self
            .male_fertility
            .ok_or(ConfigurationError::MissingRequired("male_fertility"))?;
        let initial = self
            .initial
            .ok_or(ConfigurationError::MissingRequired("initial_population"))?;

        let rates = VitalRates::new(female_survival, male_survival, female_fertility, male_fertility)?
            .with_environmental_noise(self.env_sd.0, self.env_sd.1)?;

        let mut dynamics = self.dynamics;
        dynamics.carrying_capacity = self
            .capacity
            .map(|(limit, strategy)| CarryingCapacity::new(limit, strategy))
            .transpose()?;
        dynamics.catastrophe = self
            .catastrophe
            .map(|(probability, mortality)| CatastropheModel::new(probability, mortality))
            .transpose()?;

        let execution = ExecutionConfig {
            years: self.years,
            n_sim: self.n_sim,
            seed: self.seed,
            parallel: self.parallel,
        };

        let config = Configuration {
            execution,
            rates,
            initial,
            dynamics,
            extinction: self.extinction,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the runner.
    pub fn build(self) -> Result<ReplicateRunner, ConfigurationError> {
        ReplicateRunner::new(self.build_config()?)
    }
}
