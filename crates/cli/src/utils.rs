use anyhow::{Context, Result};
use pvasim_sim::simulation::Configuration;
use std::path::Path;
use std::str::FromStr;

/// Parse a comma-separated list such as `0.5,0.7,0.6`.
pub fn parse_list<T>(input: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>()
                .with_context(|| format!("'{item}' is not a valid value"))
        })
        .collect()
}

/// Load a configuration file, or the built-in defaults when none is given.
///
/// The file is parsed but not validated, so command-line overrides can still
/// fix it up.
pub fn load_config(path: Option<&Path>) -> Result<Configuration> {
    let Some(path) = path else {
        return Ok(Configuration::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Configuration::parse_json(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_floats() {
        let values: Vec<f64> = parse_list("0.5, 0.7,0.6").unwrap();
        assert_eq!(values, vec![0.5, 0.7, 0.6]);
    }

    #[test]
    fn test_parse_counts() {
        let values: Vec<u64> = parse_list("10,10,0,0,0").unwrap();
        assert_eq!(values, vec![10, 10, 0, 0, 0]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_list::<u64>("10,-1").is_err());
        assert!(parse_list::<f64>("x").is_err());
    }

    #[test]
    fn test_load_default_config() {
        assert_eq!(load_config(None).unwrap(), Configuration::default());
    }

    #[test]
    fn test_load_flat_config_without_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.json");
        // one initial count too few, left for the command line to fix
        std::fs::write(&path, r#"{ "years": 3, "initial_males": [1, 2] }"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.execution.years, 3);
        assert_eq!(config.initial.males, vec![1, 2]);
        assert!(config.validate().is_err());
    }
}
