//! Stochastic processes acting on a population.
//!
//! - **Sampler**: the per-replicate random source for demographic and
//!   environmental noise
//! - **Catastrophe**: rare mass-mortality events
//! - **Density**: carrying-capacity enforcement strategies

pub mod catastrophe;
pub mod density;
pub mod sampler;

pub use catastrophe::CatastropheModel;
pub use density::{CapacityStrategy, CarryingCapacity};
pub use sampler::{NoiseConfig, StochasticSampler, derive_replicate_seeds, round_expected};
