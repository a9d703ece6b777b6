//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use pvasim_sim::prelude::*;
//!
//! let state = PopulationState::new(vec![10, 5], vec![8, 4]).unwrap();
//! assert_eq!(state.total(), 27);
//! ```

pub use crate::base::{PopulationState, Sex, VitalRates};
pub use crate::dynamics::{CapacityStrategy, CarryingCapacity, CatastropheModel, NoiseConfig};
pub use crate::errors::ConfigurationError;
pub use crate::simulation::{
    Configuration, ExtinctionCriterion, PopulationTrajectory, ReplicateBatch, ReplicateRunner,
    RunControl, SimulationBuilder,
};
