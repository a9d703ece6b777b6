//! Age-specific vital rates.
//!
//! `VitalRates` holds the survival probabilities and fertility rates of each
//! age class for both sexes, together with the magnitude of environmental
//! noise applied to them. It is immutable once validated; the per-step
//! perturbed copy is produced by the projection step through the sampler.

use crate::base::Sex;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// The two kinds of rate that environmental noise perturbs. Each kind has
/// its own valid range after perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKind {
    /// Probability of surviving one step, clamped into [0, 1].
    Survival,
    /// Expected offspring per individual, clamped into [0, ∞).
    Fertility,
}

impl RateKind {
    /// Clamp `value` into the valid range of this rate kind.
    ///
    /// Returns the clamped value and whether clamping changed it.
    #[inline]
    pub fn clamp(self, value: f64) -> (f64, bool) {
        let clamped = match self {
            Self::Survival => value.clamp(0.0, 1.0),
            Self::Fertility => value.max(0.0),
        };
        (clamped, clamped != value)
    }
}

/// Survival and fertility rates by age class for females and males.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalRates {
    /// Female survival probability per age class.
    pub female_survival: Vec<f64>,
    /// Male survival probability per age class.
    pub male_survival: Vec<f64>,
    /// Female fertility (expected offspring) per age class.
    pub female_fertility: Vec<f64>,
    /// Male fertility per age class. Only consulted by mate-limited
    /// reproduction to decide which males count as breeders.
    pub male_fertility: Vec<f64>,
    /// Standard deviation of the multiplicative noise on survival.
    #[serde(default)]
    pub env_sd_survival: f64,
    /// Standard deviation of the multiplicative noise on fertility.
    #[serde(default)]
    pub env_sd_fertility: f64,
}

impl VitalRates {
    /// Create and validate a rate specification.
    pub fn new(
        female_survival: Vec<f64>,
        male_survival: Vec<f64>,
        female_fertility: Vec<f64>,
        male_fertility: Vec<f64>,
    ) -> Result<Self, ConfigurationError> {
        let rates = Self {
            female_survival,
            male_survival,
            female_fertility,
            male_fertility,
            env_sd_survival: 0.0,
            env_sd_fertility: 0.0,
        };
        rates.validate()?;
        Ok(rates)
    }

    /// Use the same survival and fertility schedule for both sexes.
    pub fn symmetric(survival: Vec<f64>, fertility: Vec<f64>) -> Result<Self, ConfigurationError> {
        Self::new(survival.clone(), survival, fertility.clone(), fertility)
    }

    /// Set the environmental noise magnitudes.
    pub fn with_environmental_noise(
        mut self,
        sd_survival: f64,
        sd_fertility: f64,
    ) -> Result<Self, ConfigurationError> {
        self.env_sd_survival = sd_survival;
        self.env_sd_fertility = sd_fertility;
        self.validate()?;
        Ok(self)
    }

    /// Number of age classes.
    #[inline]
    pub fn age_classes(&self) -> usize {
        self.female_survival.len()
    }

    /// Survival schedule for `sex`.
    #[inline]
    pub fn survival(&self, sex: Sex) -> &[f64] {
        match sex {
            Sex::Female => &self.female_survival,
            Sex::Male => &self.male_survival,
        }
    }

    /// Fertility schedule for `sex`.
    #[inline]
    pub fn fertility(&self, sex: Sex) -> &[f64] {
        match sex {
            Sex::Female => &self.female_fertility,
            Sex::Male => &self.male_fertility,
        }
    }

    /// Check vector lengths and value ranges.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let n = self.age_classes();
        if n == 0 {
            return Err(ConfigurationError::NoAgeClasses);
        }

        for (field, len) in [
            ("male_survival", self.male_survival.len()),
            ("female_fertility", self.female_fertility.len()),
            ("male_fertility", self.male_fertility.len()),
        ] {
            if len != n {
                return Err(ConfigurationError::LengthMismatch {
                    field,
                    expected: n,
                    found: len,
                });
            }
        }

        for sex in Sex::BOTH {
            for (age, &value) in self.survival(sex).iter().enumerate() {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConfigurationError::InvalidSurvival { sex, age, value });
                }
            }
            for (age, &value) in self.fertility(sex).iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigurationError::InvalidFertility { sex, age, value });
                }
            }
        }

        if !self.env_sd_survival.is_finite() || self.env_sd_survival < 0.0 {
            return Err(ConfigurationError::InvalidNoise(
                "env_sd_survival",
                self.env_sd_survival,
            ));
        }
        if !self.env_sd_fertility.is_finite() || self.env_sd_fertility < 0.0 {
            return Err(ConfigurationError::InvalidNoise(
                "env_sd_fertility",
                self.env_sd_fertility,
            ));
        }

        Ok(())
    }
}

/// Rates actually used during one projection step, after environmental
/// perturbation. Shared by every individual of a given class and sex.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRates {
    pub female_survival: Vec<f64>,
    pub male_survival: Vec<f64>,
    pub female_fertility: Vec<f64>,
    pub male_fertility: Vec<f64>,
}

impl StepRates {
    /// The unperturbed rates.
    pub fn from_base(rates: &VitalRates) -> Self {
        Self {
            female_survival: rates.female_survival.clone(),
            male_survival: rates.male_survival.clone(),
            female_fertility: rates.female_fertility.clone(),
            male_fertility: rates.male_fertility.clone(),
        }
    }

    #[inline]
    pub fn survival(&self, sex: Sex) -> &[f64] {
        match sex {
            Sex::Female => &self.female_survival,
            Sex::Male => &self.male_survival,
        }
    }

    #[inline]
    pub fn fertility(&self, sex: Sex) -> &[f64] {
        match sex {
            Sex::Female => &self.female_fertility,
            Sex::Male => &self.male_fertility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> VitalRates {
        VitalRates::symmetric(vec![0.6, 0.7, 0.5], vec![0.0, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn test_valid_rates() {
        let rates = valid();
        assert_eq!(rates.age_classes(), 3);
        assert_eq!(rates.survival(Sex::Male), &[0.6, 0.7, 0.5]);
        assert_eq!(rates.fertility(Sex::Female), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_empty_rates_rejected() {
        let err = VitalRates::symmetric(vec![], vec![]).unwrap_err();
        assert_eq!(err, ConfigurationError::NoAgeClasses);
    }

    #[test]
    fn test_length_mismatch() {
        let err = VitalRates::new(
            vec![0.5, 0.5],
            vec![0.5],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::LengthMismatch {
                field: "male_survival",
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_survival_out_of_range() {
        let err = VitalRates::symmetric(vec![0.5, 1.2], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidSurvival { sex: Sex::Female, age: 1, .. }
        ));

        let err = VitalRates::symmetric(vec![f64::NAN], vec![0.0]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSurvival { .. }));
    }

    #[test]
    fn test_negative_fertility() {
        let err = VitalRates::symmetric(vec![0.5], vec![-1.0]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidFertility { .. }));

        let err = VitalRates::symmetric(vec![0.5], vec![f64::INFINITY]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidFertility { .. }));
    }

    #[test]
    fn test_environmental_noise_validation() {
        assert!(valid().with_environmental_noise(0.1, 0.2).is_ok());
        let err = valid().with_environmental_noise(-0.1, 0.0).unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidNoise("env_sd_survival", -0.1));
    }

    #[test]
    fn test_rate_kind_clamp() {
        assert_eq!(RateKind::Survival.clamp(1.3), (1.0, true));
        assert_eq!(RateKind::Survival.clamp(-0.2), (0.0, true));
        assert_eq!(RateKind::Survival.clamp(0.4), (0.4, false));
        assert_eq!(RateKind::Fertility.clamp(-0.5), (0.0, true));
        assert_eq!(RateKind::Fertility.clamp(7.5), (7.5, false));
    }
}
