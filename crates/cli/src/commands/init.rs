use anyhow::{Context, Result, bail};
use pvasim_sim::simulation::Configuration;

use crate::args::InitArgs;
use crate::printing::print_parameters;

pub fn init_config(args: &InitArgs) -> Result<()> {
    let output = &args.output;

    println!("🦉 pvasim - Population Viability Analysis");
    println!("============================================\n");

    if output.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let config = build_config(args)?;

    println!("Configuration:");
    print_parameters(&config);

    let json = config.to_json_pretty().context("Failed to serialize configuration")?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("✓ Configuration written: {}", output.display());
    println!("\nConfiguration initialized successfully!");
    println!("  Age classes: {}", config.age_classes());
    println!("  Years: {}", config.execution.years);
    println!("  Replicates: {}", config.execution.n_sim);
    println!(
        "\n💡 Use 'pvasim run --config {}' to start the simulation",
        output.display()
    );

    Ok(())
}

/// Defaults with the command-line overrides applied, validated.
pub fn build_config(args: &InitArgs) -> Result<Configuration> {
    let mut config = Configuration::default();
    args.model.apply_to(&mut config)?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ModelArgs;
    use std::path::PathBuf;

    fn args(model: ModelArgs) -> InitArgs {
        InitArgs {
            output: PathBuf::from("unused.json"),
            force: false,
            model,
        }
    }

    #[test]
    fn test_default_config() {
        let config = build_config(&args(ModelArgs::default())).unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_overrides_are_validated() {
        let err = build_config(&args(ModelArgs {
            female_survival: Some("0.5,0.5".into()),
            ..ModelArgs::default()
        }))
        .unwrap_err();
        assert!(format!("{err:#}").contains("male_survival"));
    }
}
