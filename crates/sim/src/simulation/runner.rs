//! Replicate runner.
//!
//! Runs `n_sim` independent trajectories from one validated configuration.
//! Each replicate owns its sampler, seeded from a stream derived from the
//! master seed, so a batch is identical whether replicates run sequentially
//! or on the rayon pool.

use crate::base::PopulationState;
use crate::dynamics::{StochasticSampler, derive_replicate_seeds};
use crate::errors::ConfigurationError;
use crate::simulation::{
    Configuration, ExtinctionCriterion, PopulationTrajectory, ProjectionStep,
};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Callback invoked once per completed replicate.
pub type ProgressFn<'a> = &'a (dyn Fn(&PopulationTrajectory) + Sync);

/// Optional hooks into a running batch.
#[derive(Clone, Copy, Default)]
pub struct RunControl<'a> {
    cancel: Option<&'a AtomicBool>,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> RunControl<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop starting new replicates once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Call `progress` after each replicate completes.
    pub fn with_progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn report(&self, trajectory: &PopulationTrajectory) {
        if let Some(progress) = self.progress {
            progress(trajectory);
        }
    }
}

impl std::fmt::Debug for RunControl<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunControl")
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateBatch {
    /// Master seed actually used, also when none was configured
    pub master_seed: u64,
    pub years: usize,
    pub q_threshold: u64,
    pub criterion: ExtinctionCriterion,
    /// Number of replicates configured
    pub n_requested: usize,
    /// Completed replicates in index order
    pub trajectories: Vec<PopulationTrajectory>,
    /// Set when the run stopped before every replicate completed
    pub cancelled: bool,
}

impl ReplicateBatch {
    #[inline]
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Extinction times recorded with the batch threshold.
    pub fn extinction_times(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.trajectories.iter().map(PopulationTrajectory::extinction_time)
    }

    /// Replicates that reached quasi-extinction.
    pub fn extinct_count(&self) -> usize {
        self.extinction_times().filter(Option::is_some).count()
    }

    /// Environmental draws clamped across all replicates.
    pub fn total_clamped_rates(&self) -> usize {
        self.trajectories
            .iter()
            .map(PopulationTrajectory::clamped_rates)
            .sum()
    }
}

/// Executes replicates of a validated configuration.
#[derive(Debug, Clone)]
pub struct ReplicateRunner {
    config: Configuration,
    initial: PopulationState,
}

impl ReplicateRunner {
    /// Validate `config` and prepare a runner.
    pub fn new(config: Configuration) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let initial = config.initial.to_state()?;
        Ok(Self { config, initial })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn initial_state(&self) -> &PopulationState {
        &self.initial
    }

    /// Run every replicate.
    pub fn run(&self) -> ReplicateBatch {
        self.run_with(&RunControl::default())
    }

    /// Run with cancellation and progress hooks.
    pub fn run_with(&self, control: &RunControl<'_>) -> ReplicateBatch {
        let execution = &self.config.execution;
        let master_seed = execution.seed.unwrap_or_else(|| rand::rng().random());
        let seeds = derive_replicate_seeds(master_seed, execution.n_sim);

        tracing::info!(
            replicates = execution.n_sim,
            years = execution.years,
            master_seed,
            parallel = execution.parallel,
            "starting replicate batch"
        );

        let run_one = |(index, &seed): (usize, &u64)| -> Option<PopulationTrajectory> {
            if control.is_cancelled() {
                return None;
            }
            let trajectory = self.run_replicate(index, seed);
            control.report(&trajectory);
            Some(trajectory)
        };

        let outcomes: Vec<Option<PopulationTrajectory>> = if execution.parallel {
            seeds.par_iter().enumerate().map(run_one).collect()
        } else {
            seeds.iter().enumerate().map(run_one).collect()
        };

        let trajectories: Vec<PopulationTrajectory> = outcomes.into_iter().flatten().collect();
        let cancelled = trajectories.len() < execution.n_sim;

        let batch = ReplicateBatch {
            master_seed,
            years: execution.years,
            q_threshold: self.config.extinction.q_threshold,
            criterion: self.config.extinction.criterion,
            n_requested: execution.n_sim,
            trajectories,
            cancelled,
        };

        let clamped = batch.total_clamped_rates();
        if clamped > 0 {
            tracing::warn!(
                clamped,
                "environmental noise produced out-of-range rates that were clamped"
            );
        }
        if cancelled {
            tracing::warn!(
                completed = batch.len(),
                requested = execution.n_sim,
                "replicate batch cancelled"
            );
        }
        tracing::info!(
            completed = batch.len(),
            extinct = batch.extinct_count(),
            "replicate batch finished"
        );

        batch
    }

    /// Project a single replicate from the initial state.
    pub fn run_replicate(&self, index: usize, seed: u64) -> PopulationTrajectory {
        let years = self.config.execution.years;
        let step = ProjectionStep::new(&self.config.rates, &self.config.dynamics);
        let mut sampler = StochasticSampler::from_seed(seed, self.config.dynamics.noise);

        let mut states = Vec::with_capacity(years + 1);
        let mut catastrophe_steps = Vec::new();
        let mut current = self.initial.clone();
        states.push(current.clone());

        for year in 1..=years {
            if current.is_empty() {
                // Nothing can change an empty population
                states.resize(years + 1, current.clone());
                break;
            }
            let outcome = step.step(&current, &mut sampler);
            if outcome.catastrophe {
                catastrophe_steps.push(year);
            }
            current = outcome.state;
            states.push(current.clone());
        }

        let extinction = self.config.extinction;
        let trajectory = PopulationTrajectory::new(
            index,
            seed,
            states,
            catastrophe_steps,
            sampler.clamped_rates(),
            extinction.q_threshold,
            extinction.criterion,
        );

        tracing::debug!(
            replicate = index,
            seed,
            extinction_time = ?trajectory.extinction_time(),
            final_total = trajectory.final_state().map_or(0, PopulationState::total),
            "replicate complete"
        );

        trajectory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::NoiseConfig;

    fn small_config() -> Configuration {
        let mut config = Configuration::default();
        config.execution.years = 15;
        config.execution.n_sim = 12;
        config.execution.seed = Some(7);
        config.rates.env_sd_survival = 0.1;
        config.rates.env_sd_fertility = 0.2;
        config
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.execution.n_sim = 0;
        assert_eq!(
            ReplicateRunner::new(config).unwrap_err(),
            ConfigurationError::NotPositive("n_sim")
        );
    }

    #[test]
    fn test_batch_shape() {
        let batch = ReplicateRunner::new(small_config()).unwrap().run();
        assert_eq!(batch.len(), 12);
        assert_eq!(batch.master_seed, 7);
        assert!(!batch.cancelled);
        for (i, t) in batch.trajectories.iter().enumerate() {
            assert_eq!(t.replicate(), i);
            assert_eq!(t.states().len(), 16);
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let parallel = ReplicateRunner::new(small_config()).unwrap().run();
        let mut config = small_config();
        config.execution.parallel = false;
        let sequential = ReplicateRunner::new(config).unwrap().run();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_unseeded_run_records_seed() {
        let mut config = small_config();
        config.execution.seed = None;
        let batch = ReplicateRunner::new(config.clone()).unwrap().run();

        config.execution.seed = Some(batch.master_seed);
        let replay = ReplicateRunner::new(config).unwrap().run();
        assert_eq!(batch.trajectories, replay.trajectories);
    }

    #[test]
    fn test_replicate_seeds_follow_master() {
        let batch = ReplicateRunner::new(small_config()).unwrap().run();
        let seeds = derive_replicate_seeds(7, 12);
        for (t, seed) in batch.trajectories.iter().zip(seeds) {
            assert_eq!(t.seed(), seed);
        }
    }

    #[test]
    fn test_cancel_before_start() {
        let flag = AtomicBool::new(true);
        let runner = ReplicateRunner::new(small_config()).unwrap();
        let batch = runner.run_with(&RunControl::new().with_cancel_flag(&flag));
        assert!(batch.cancelled);
        assert!(batch.is_empty());
        assert_eq!(batch.n_requested, 12);
    }

    #[test]
    fn test_cancel_midway_keeps_completed() {
        let mut config = small_config();
        config.execution.parallel = false;
        let runner = ReplicateRunner::new(config).unwrap();
        let flag = AtomicBool::new(false);
        let progress = |t: &PopulationTrajectory| {
            if t.replicate() == 4 {
                flag.store(true, Ordering::Relaxed);
            }
        };
        let batch = runner.run_with(
            &RunControl::new()
                .with_cancel_flag(&flag)
                .with_progress(&progress),
        );
        assert!(batch.cancelled);
        assert_eq!(batch.len(), 5);

        let full = runner.run();
        assert_eq!(&full.trajectories[..5], &batch.trajectories[..]);
    }

    #[test]
    fn test_progress_called_per_replicate() {
        let count = std::sync::atomic::AtomicUsize::new(0);
        let progress = |_: &PopulationTrajectory| {
            count.fetch_add(1, Ordering::Relaxed);
        };
        let runner = ReplicateRunner::new(small_config()).unwrap();
        runner.run_with(&RunControl::new().with_progress(&progress));
        assert_eq!(count.load(Ordering::Relaxed), 12);
    }

    #[test]
    fn test_empty_population_padded() {
        let mut config = small_config();
        config.initial.females = vec![0; 5];
        config.initial.males = vec![0; 5];
        config.dynamics.noise = NoiseConfig::full();
        let batch = ReplicateRunner::new(config).unwrap().run();
        for t in &batch.trajectories {
            assert_eq!(t.states().len(), 16);
            assert!(t.states().iter().all(PopulationState::is_empty));
            assert_eq!(t.extinction_time(), Some(0));
        }
    }
}
