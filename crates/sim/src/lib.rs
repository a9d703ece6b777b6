//! # Simulation Crate
//!
//! The `sim` crate provides the core logic for population viability
//! analysis. It includes modules for vital rates and population state,
//! the stochastic processes acting on a population (demographic and
//! environmental noise, catastrophes, carrying capacity) and the replicate
//! runner that projects a population many independent times.

pub mod base;
pub mod dynamics;
pub mod errors;
pub mod prelude;
pub mod simulation;

pub use base::{PopulationState, Sex, VitalRates};
