use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use pvasim_sim::dynamics::{CapacityStrategy, CarryingCapacity, CatastropheModel};
use pvasim_sim::simulation::{Configuration, ExtinctionCriterion, MatingSystem, OldestClass};
use std::path::PathBuf;

use crate::defaults;
use crate::utils::parse_list;

/// Model parameters that can be given on the command line.
///
/// Every flag is optional; a flag overrides the value from the configuration
/// file, which in turn overrides the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Number of years (annual steps) to simulate
    #[arg(short = 'y', long)]
    pub years: Option<usize>,

    /// Number of simulation replicates
    #[arg(short = 'n', long)]
    pub n_sim: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Comma-separated female survival rates per age class
    #[arg(long)]
    pub female_survival: Option<String>,

    /// Comma-separated male survival rates per age class
    #[arg(long)]
    pub male_survival: Option<String>,

    /// Comma-separated female fertility rates per age class
    #[arg(long)]
    pub female_fertility: Option<String>,

    /// Comma-separated male fertility rates per age class
    #[arg(long)]
    pub male_fertility: Option<String>,

    /// Comma-separated initial female counts per age class
    #[arg(long)]
    pub initial_females: Option<String>,

    /// Comma-separated initial male counts per age class
    #[arg(long)]
    pub initial_males: Option<String>,

    /// Quasi-extinction threshold (population size)
    #[arg(short = 'q', long)]
    pub q_threshold: Option<u64>,

    /// Carrying capacity (total individuals)
    #[arg(short = 'K', long)]
    pub carrying_capacity: Option<u64>,

    /// How the carrying capacity is enforced
    #[arg(long, value_enum)]
    pub capacity_strategy: Option<CapacityStrategyArg>,

    /// Probability of a catastrophe per year
    #[arg(long)]
    pub catastrophe_prob: Option<f64>,

    /// Mortality fraction when a catastrophe occurs
    #[arg(long)]
    pub catastrophe_mort: Option<f64>,

    /// Environmental SD for survival rates
    #[arg(long)]
    pub env_sd_survival: Option<f64>,

    /// Environmental SD for fertility rates
    #[arg(long)]
    pub env_sd_fertility: Option<f64>,

    /// Disable demographic stochasticity
    #[arg(long)]
    pub no_demo_noise: bool,

    /// Disable environmental stochasticity
    #[arg(long)]
    pub no_env_noise: bool,

    /// Fate of survivors in the oldest age class
    #[arg(long, value_enum)]
    pub oldest_class: Option<OldestClassArg>,

    /// Whether the absence of breeding males prevents births
    #[arg(long, value_enum)]
    pub mating_system: Option<MatingSystemArg>,

    /// Youngest age class that can reproduce
    #[arg(long)]
    pub min_breeding_age: Option<usize>,

    /// Proportion of births that are male
    #[arg(long)]
    pub male_birth_proportion: Option<f64>,

    /// Count compared against the quasi-extinction threshold
    #[arg(long, value_enum)]
    pub extinction_criterion: Option<ExtinctionCriterionArg>,

    /// Run replicates on a single thread
    #[arg(long)]
    pub sequential: bool,
}

impl ModelArgs {
    /// Apply the given flags on top of `config`.
    pub fn apply_to(&self, config: &mut Configuration) -> Result<()> {
        if let Some(years) = self.years {
            config.execution.years = years;
        }
        if let Some(n_sim) = self.n_sim {
            config.execution.n_sim = n_sim;
        }
        if self.seed.is_some() {
            config.execution.seed = self.seed;
        }
        if self.sequential {
            config.execution.parallel = false;
        }

        let rates = &mut config.rates;
        for (flag, value, target) in [
            ("--female-survival", &self.female_survival, &mut rates.female_survival),
            ("--male-survival", &self.male_survival, &mut rates.male_survival),
            ("--female-fertility", &self.female_fertility, &mut rates.female_fertility),
            ("--male-fertility", &self.male_fertility, &mut rates.male_fertility),
        ] {
            if let Some(list) = value {
                *target = parse_list(list).with_context(|| format!("Invalid {flag}"))?;
            }
        }
        if let Some(sd) = self.env_sd_survival {
            rates.env_sd_survival = sd;
        }
        if let Some(sd) = self.env_sd_fertility {
            rates.env_sd_fertility = sd;
        }

        if let Some(list) = &self.initial_females {
            config.initial.females = parse_list(list).context("Invalid --initial-females")?;
        }
        if let Some(list) = &self.initial_males {
            config.initial.males = parse_list(list).context("Invalid --initial-males")?;
        }

        self.apply_dynamics(config)?;

        if let Some(q) = self.q_threshold {
            config.extinction.q_threshold = q;
        }
        if let Some(criterion) = self.extinction_criterion {
            config.extinction.criterion = criterion.into();
        }

        Ok(())
    }

    fn apply_dynamics(&self, config: &mut Configuration) -> Result<()> {
        let dynamics = &mut config.dynamics;
        if self.no_demo_noise {
            dynamics.noise.demographic = false;
        }
        if self.no_env_noise {
            dynamics.noise.environmental = false;
        }

        if self.catastrophe_prob.is_some() || self.catastrophe_mort.is_some() {
            let (probability, mortality) = dynamics
                .catastrophe
                .map_or((0.0, 0.0), |c| (c.probability(), c.mortality()));
            let model = CatastropheModel::new(
                self.catastrophe_prob.unwrap_or(probability),
                self.catastrophe_mort.unwrap_or(mortality),
            )?;
            dynamics.catastrophe = model.is_active().then_some(model);
        }

        let strategy = self.capacity_strategy.map(CapacityStrategy::from);
        match (self.carrying_capacity, dynamics.carrying_capacity) {
            (Some(limit), existing) => {
                let strategy = strategy
                    .or(existing.map(|c| c.strategy()))
                    .unwrap_or_default();
                dynamics.carrying_capacity = Some(CarryingCapacity::new(limit, strategy)?);
            }
            (None, Some(existing)) => {
                if let Some(strategy) = strategy {
                    dynamics.carrying_capacity =
                        Some(CarryingCapacity::new(existing.limit(), strategy)?);
                }
            }
            (None, None) => {
                if strategy.is_some() {
                    bail!("--capacity-strategy requires a carrying capacity (--carrying-capacity)");
                }
            }
        }

        if let Some(oldest) = self.oldest_class {
            dynamics.oldest_class = oldest.into();
        }
        if let Some(mating) = self.mating_system {
            dynamics.mating_system = mating.into();
        }
        if let Some(age) = self.min_breeding_age {
            dynamics.min_breeding_age = age;
        }
        if let Some(proportion) = self.male_birth_proportion {
            dynamics.male_birth_proportion = proportion;
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output configuration file (JSON)
    #[arg(short, long, default_value = defaults::CONFIG_FILE)]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON configuration file with simulation parameters
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Show progress bar
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    pub progress: bool,

    /// Comma-separated thresholds for an extinction-risk curve
    #[arg(long)]
    pub risk_thresholds: Option<String>,

    /// Number of bins for the extinction-time histogram (0 disables it)
    #[arg(long, default_value_t = defaults::HISTOGRAM_BINS)]
    pub histogram_bins: usize,

    /// Write the summary as JSON
    #[arg(long)]
    pub summary_out: Option<PathBuf>,

    /// Write per-year trajectories of every replicate
    #[arg(long)]
    pub trajectories_out: Option<PathBuf>,

    /// Format of the trajectories file
    #[arg(long, value_enum, default_value = "csv")]
    pub format: ExportFormat,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration file to check
    pub config: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityStrategyArg {
    Proportional,
    Ceiling,
    FertilitySuppression,
}

impl From<CapacityStrategyArg> for CapacityStrategy {
    fn from(arg: CapacityStrategyArg) -> Self {
        match arg {
            CapacityStrategyArg::Proportional => Self::Proportional,
            CapacityStrategyArg::Ceiling => Self::Ceiling,
            CapacityStrategyArg::FertilitySuppression => Self::FertilitySuppression,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OldestClassArg {
    Accumulate,
    Terminal,
}

impl From<OldestClassArg> for OldestClass {
    fn from(arg: OldestClassArg) -> Self {
        match arg {
            OldestClassArg::Accumulate => Self::Accumulate,
            OldestClassArg::Terminal => Self::Terminal,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatingSystemArg {
    FemaleDominant,
    MateLimited,
}

impl From<MatingSystemArg> for MatingSystem {
    fn from(arg: MatingSystemArg) -> Self {
        match arg {
            MatingSystemArg::FemaleDominant => Self::FemaleDominant,
            MatingSystemArg::MateLimited => Self::MateLimited,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtinctionCriterionArg {
    Total,
    LimitingSex,
}

impl From<ExtinctionCriterionArg> for ExtinctionCriterion {
    fn from(arg: ExtinctionCriterionArg) -> Self {
        match arg {
            ExtinctionCriterionArg::Total => Self::Total,
            ExtinctionCriterionArg::LimitingSex => Self::LimitingSex,
        }
    }
}
