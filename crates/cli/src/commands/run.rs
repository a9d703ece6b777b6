use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pvasim_analysis::{extinction_histogram, extinction_risk_curve, summarize};
use pvasim_sim::simulation::{PopulationTrajectory, ReplicateRunner, RunControl};

use crate::args::RunArgs;
use crate::commands::export::{export_summary, export_trajectories};
use crate::defaults;
use crate::printing::{
    print_envelope, print_histogram, print_parameters, print_risk_curve, print_summary,
};
use crate::utils::{load_config, parse_list};

pub fn run_simulation(args: &RunArgs) -> Result<()> {
    println!("🦉 pvasim - Population Viability Analysis");
    println!("============================================");

    let mut config = load_config(args.config.as_deref())?;
    args.model.apply_to(&mut config)?;

    // Parsed before any replicate runs
    let thresholds: Option<Vec<u64>> = args
        .risk_thresholds
        .as_deref()
        .map(parse_list::<u64>)
        .transpose()
        .context("Invalid --risk-thresholds")?;

    let runner = ReplicateRunner::new(config).context("Invalid configuration")?;
    print_parameters(runner.config());

    let n_sim = runner.config().execution.n_sim;
    let years = runner.config().execution.years;
    println!("Running {n_sim} replicates of {years} years...");

    let pb = if args.progress {
        let pb = ProgressBar::new(n_sim as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(defaults::PROGRESS_TEMPLATE)
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let on_replicate = |_: &PopulationTrajectory| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    };
    let batch = runner.run_with(&RunControl::new().with_progress(&on_replicate));

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    println!("\n✓ Simulation complete! (master seed {})", batch.master_seed);

    let summary = summarize(&batch, batch.q_threshold);
    print_summary(&summary);
    print_envelope(&summary, (years / 10).max(1));

    if args.histogram_bins > 0 {
        print_histogram(&extinction_histogram(&batch, batch.q_threshold, args.histogram_bins));
    }
    if let Some(thresholds) = thresholds {
        print_risk_curve(&extinction_risk_curve(&batch, &thresholds));
    }

    if let Some(path) = &args.summary_out {
        export_summary(&summary, path)?;
        println!("\n✓ Summary written to: {}", path.display());
    }
    if let Some(path) = &args.trajectories_out {
        export_trajectories(&batch, path, args.format)?;
        println!("✓ Trajectories written to: {}", path.display());
    }

    Ok(())
}
