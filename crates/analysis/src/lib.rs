//! # Analysis Crate
//!
//! Extinction-risk summaries over replicate batches produced by
//! `pvasim-sim`.

pub mod analysis;

pub use analysis::{
    EnvelopePoint, HistogramBin, RiskPoint, Summary, cumulative_extinction, extinction_histogram,
    extinction_risk_curve, summarize, trajectory_envelope,
};
