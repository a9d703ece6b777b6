//! Projection and replicate execution.
//!
//! - `Configuration`: the immutable record a run is built from.
//! - `ProjectionStep`: the single annual transition.
//! - `ReplicateRunner`: runs independent replicates and collects a
//!   `ReplicateBatch` of `PopulationTrajectory` values.
//! - `SimulationBuilder`: fluent construction of a runner.
//! - `FlatConfig`: the flat, top-level form of a configuration file.

pub mod builder;
pub mod configs;
pub mod flat;
pub mod projection;
pub mod runner;
pub mod trajectory;

pub use builder::SimulationBuilder;
pub use configs::{
    Configuration, DynamicsConfig, ExecutionConfig, ExtinctionConfig, ExtinctionCriterion,
    InitialPopulation, MatingSystem, OldestClass,
};
pub use flat::FlatConfig;
pub use projection::{ProjectionStep, StepOutcome};
pub use runner::{ProgressFn, ReplicateBatch, ReplicateRunner, RunControl};
pub use trajectory::PopulationTrajectory;
