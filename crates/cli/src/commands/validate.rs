use anyhow::Result;
use pvasim_sim::simulation::Configuration;

use crate::args::ValidateArgs;
use crate::printing::print_parameters;
use crate::utils::load_config;

pub fn validate_config(args: &ValidateArgs) -> Result<()> {
    println!("🔍 Validating configuration: {}", args.config.display());

    let mut config: Configuration = load_config(Some(args.config.as_path()))?;
    println!("✓ Parsed: OK");

    args.model.apply_to(&mut config)?;

    if let Err(e) = config.validate() {
        println!("✗ Parameters: FAILED - {e}");
        anyhow::bail!("Configuration is invalid: {e}");
    }
    println!("✓ Parameters: OK");

    print_parameters(&config);
    println!("{}", "=".repeat(50));
    println!("✓ Validation complete: No issues found");
    Ok(())
}
