//! Replicate batch analysis
//!
//! This module provides:
//! - Extinction probability and time-to-extinction statistics
//! - Trajectory envelopes (mean and percentiles per step)
//! - Cumulative extinction and extinction-risk curves

pub mod envelope;
pub mod summary;
pub mod utils;

pub use envelope::{EnvelopePoint, trajectory_envelope};
pub use summary::{
    HistogramBin, RiskPoint, Summary, cumulative_extinction, extinction_histogram,
    extinction_risk_curve, summarize,
};
