//! Base types for the population model.
//!
//! This module provides the foundational value types shared by every other
//! module: the sexes, the age-specific vital rates and the per-step
//! population state.

mod rates;
mod sex;
mod state;

pub use rates::{RateKind, StepRates, VitalRates};
pub use sex::Sex;
pub use state::PopulationState;
