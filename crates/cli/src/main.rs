mod args;
mod commands;
pub mod defaults;
mod printing;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};

use args::{InitArgs, RunArgs, ValidateArgs};
use commands::{init, run, validate};

/// pvasim: A Population Viability Analysis Simulator
///
/// This tool projects an age-structured, two-sex population many times under
/// demographic and environmental noise, catastrophes and a carrying capacity,
/// and reports the probability and timing of quasi-extinction.
#[derive(Parser, Debug)]
#[command(name = "pvasim")]
#[command(author, version, about = "Estimates extinction risk of age-structured populations", long_about = None)]
struct Cli {
    /// Number of threads to use for parallel processing
    ///
    /// If not specified, defaults to the number of logical CPUs.
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a configuration file.
    ///
    /// Starts from the built-in defaults, applies any model flags and saves
    /// the result as JSON without running it.
    Init(Box<InitArgs>),

    /// Run replicate simulations and report extinction risk.
    ///
    /// Parameters come from an optional configuration file, overridden by
    /// any model flags given on the command line.
    Run(Box<RunArgs>),

    /// Check a configuration file without running it.
    Validate(Box<ValidateArgs>),
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
        tracing::debug!(threads, "configured global thread pool");
    }

    match cli.command {
        Commands::Init(args) => {
            init::init_config(&args)?;
        }
        Commands::Run(args) => {
            run::run_simulation(&args)?;
        }
        Commands::Validate(args) => {
            validate::validate_config(&args)?;
        }
    }

    Ok(())
}
