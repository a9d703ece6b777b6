//! Shared default values for the command-line interface.
//! Model defaults live in `Configuration::default()`.

pub const CONFIG_FILE: &str = "pvasim.json";

pub const HISTOGRAM_BINS: usize = 10;

/// Progress bar template shared by commands that run replicates.
pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {per_sec}";
