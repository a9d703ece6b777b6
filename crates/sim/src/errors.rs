use crate::base::Sex;
use thiserror::Error;

/// Errors raised while validating a simulation configuration.
///
/// Every variant is reported before any replicate runs; a configuration that
/// fails validation never produces a partial batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// At least one age class is required.
    #[error("No age classes configured (rate vectors are empty)")]
    NoAgeClasses,

    /// A rate or count vector does not match the number of age classes.
    #[error("Length mismatch for {field}: expected {expected} age classes, found {found}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A survival probability is outside [0, 1] or not finite.
    #[error("Invalid {sex} survival probability at age class {age}: {value} (must be between 0.0 and 1.0)")]
    InvalidSurvival { sex: Sex, age: usize, value: f64 },

    /// A fertility rate is negative or not finite.
    #[error("Invalid {sex} fertility at age class {age}: {value} (must be finite and >= 0.0)")]
    InvalidFertility { sex: Sex, age: usize, value: f64 },

    /// A generic probability parameter is outside [0, 1].
    #[error("Invalid probability for {0}: {1} (must be between 0.0 and 1.0)")]
    InvalidProbability(&'static str, f64),

    /// A noise magnitude is negative or not finite.
    #[error("Invalid standard deviation for {0}: {1} (must be finite and >= 0.0)")]
    InvalidNoise(&'static str, f64),

    /// A count parameter that must be positive was zero.
    #[error("{0} must be positive")]
    NotPositive(&'static str),

    /// The minimum breeding age does not name an existing age class.
    #[error("Minimum breeding age {age} is out of range for {classes} age classes")]
    InvalidBreedingAge { age: usize, classes: usize },

    /// A required builder parameter was never set.
    #[error("Missing required parameter: {0}")]
    MissingRequired(&'static str),

    /// A configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(String),

    /// A configuration file or string could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigurationError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("JSON error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigurationError::LengthMismatch {
            field: "male_survival",
            expected: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Length mismatch for male_survival: expected 3 age classes, found 2"
        );

        let err = ConfigurationError::InvalidSurvival {
            sex: Sex::Female,
            age: 1,
            value: 1.5,
        };
        assert!(err.to_string().contains("female survival"));
        assert!(err.to_string().contains("age class 1"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: ConfigurationError = json_err.into();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }
}
