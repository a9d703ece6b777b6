use pvasim_analysis::{HistogramBin, RiskPoint, Summary};
use pvasim_sim::simulation::Configuration;

fn join<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn print_parameters(config: &Configuration) {
    let execution = &config.execution;
    let rates = &config.rates;
    let dynamics = &config.dynamics;

    println!("\n📋 Simulation Configuration");
    println!("  • Years: {} [-y, --years]", execution.years);
    println!("  • Replicates: {} [-n, --n-sim]", execution.n_sim);
    if let Some(seed) = execution.seed {
        println!("  • Random Seed: {seed} [--seed]");
    } else {
        println!("  • Random Seed: Random [--seed]");
    }
    println!(
        "  • Execution: {}",
        if execution.parallel { "parallel" } else { "sequential" }
    );

    println!("\n🐾 Vital Rates ({} age classes)", config.age_classes());
    println!("  • Female survival: {} [--female-survival]", join(&rates.female_survival));
    println!("  • Male survival: {} [--male-survival]", join(&rates.male_survival));
    println!("  • Female fertility: {} [--female-fertility]", join(&rates.female_fertility));
    println!("  • Male fertility: {} [--male-fertility]", join(&rates.male_fertility));
    println!("  • Initial females: {} [--initial-females]", join(&config.initial.females));
    println!("  • Initial males: {} [--initial-males]", join(&config.initial.males));

    println!("\n🎲 Stochasticity");
    println!(
        "  • Demographic noise: {}",
        if dynamics.noise.demographic { "on" } else { "off" }
    );
    println!(
        "  • Environmental noise: {} (SD survival {:.3}, SD fertility {:.3})",
        if dynamics.noise.environmental { "on" } else { "off" },
        rates.env_sd_survival,
        rates.env_sd_fertility
    );
    match &dynamics.catastrophe {
        Some(c) => println!(
            "  • Catastrophe: p = {:.3}, mortality = {:.3}",
            c.probability(),
            c.mortality()
        ),
        None => println!("  • Catastrophe: none"),
    }

    println!("\n🌱 Life History & Density");
    match &dynamics.carrying_capacity {
        Some(k) => println!("  • Carrying capacity: {} ({:?})", k.limit(), k.strategy()),
        None => println!("  • Carrying capacity: none"),
    }
    println!("  • Oldest class: {:?}", dynamics.oldest_class);
    println!("  • Mating system: {:?}", dynamics.mating_system);
    println!("  • Minimum breeding age: {}", dynamics.min_breeding_age);
    println!("  • Male birth proportion: {:.2}", dynamics.male_birth_proportion);
    println!(
        "  • Quasi-extinction: {:?} ≤ {} [-q, --q-threshold]",
        config.extinction.criterion, config.extinction.q_threshold
    );
    println!();
}

fn format_time(time: Option<f64>) -> String {
    time.map_or_else(|| "n/a".to_string(), |t| format!("{t:.2}"))
}

pub fn print_summary(summary: &Summary) {
    println!("\n📊 Extinction Summary");
    println!(
        "  {:>10}  {:>7}  {:>10}  {:>9}  {:>11}  {:>11}",
        "replicates", "extinct", "p(extinct)", "mean time", "median time", "mean final"
    );
    println!(
        "  {:>10}  {:>7}  {:>10.4}  {:>9}  {:>11}  {:>11.1}",
        summary.n_replicates,
        summary.n_extinct,
        summary.extinction_probability,
        format_time(summary.mean_extinction_time),
        format_time(summary.median_extinction_time),
        summary.mean_final_population
    );
    println!(
        "  (times over extinct replicates only, threshold {} by {:?})",
        summary.q_threshold, summary.criterion
    );
    if summary.cancelled {
        println!("⚠️  Run was cancelled; statistics cover completed replicates only.");
    }
}

pub fn print_envelope(summary: &Summary, every: usize) {
    println!("\n📈 Trajectory Envelope (total population)");
    println!(
        "  {:>5}  {:>9}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}",
        "year", "mean", "p5", "p25", "p50", "p75", "p95", "extinct"
    );
    let step = every.max(1);
    let last = summary.trajectory_envelope.len().saturating_sub(1);
    for point in &summary.trajectory_envelope {
        if point.step % step != 0 && point.step != last {
            continue;
        }
        let cumulative = summary
            .cumulative_extinction
            .get(point.step)
            .copied()
            .unwrap_or(0.0);
        println!(
            "  {:>5}  {:>9.1}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.3}",
            point.step, point.mean, point.p5, point.p25, point.p50, point.p75, point.p95, cumulative
        );
    }
}

pub fn print_risk_curve(curve: &[RiskPoint]) {
    println!("\n⚠️  Extinction Risk Curve");
    println!("  {:>11}  {:>10}", "threshold", "p(extinct)");
    for point in curve {
        println!(
            "  {:>11}  {:>10.4}",
            point.q_threshold, point.extinction_probability
        );
    }
}

pub fn print_histogram(bins: &[HistogramBin]) {
    if bins.iter().all(|bin| bin.count == 0) {
        println!("\n⏳ No extinctions observed.");
        return;
    }
    let max = bins.iter().map(|bin| bin.count).max().unwrap_or(1).max(1);
    println!("\n⏳ Time to Extinction");
    for bin in bins {
        let width = bin.count * 40 / max;
        println!(
            "  [{:>4}, {:>4})  {:>5}  {}",
            bin.lower,
            bin.upper,
            bin.count,
            "#".repeat(width)
        );
    }
}
