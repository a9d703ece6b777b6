use crate::base::Sex;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Counts of females and males per age class at one time step.
///
/// Counts are unsigned, so a state can never hold negative or fractional
/// individuals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationState {
    females: Vec<u64>,
    males: Vec<u64>,
}

impl PopulationState {
    /// Create a state from per-class counts of each sex.
    pub fn new(females: Vec<u64>, males: Vec<u64>) -> Result<Self, ConfigurationError> {
        if females.is_empty() {
            return Err(ConfigurationError::NoAgeClasses);
        }
        if males.len() != females.len() {
            return Err(ConfigurationError::LengthMismatch {
                field: "initial_males",
                expected: females.len(),
                found: males.len(),
            });
        }
        Ok(Self { females, males })
    }

    /// An all-zero state with `age_classes` classes.
    pub fn empty(age_classes: usize) -> Self {
        Self {
            females: vec![0; age_classes],
            males: vec![0; age_classes],
        }
    }

    #[inline]
    pub fn age_classes(&self) -> usize {
        self.females.len()
    }

    #[inline]
    pub fn females(&self) -> &[u64] {
        &self.females
    }

    #[inline]
    pub fn males(&self) -> &[u64] {
        &self.males
    }

    #[inline]
    pub fn counts(&self, sex: Sex) -> &[u64] {
        match sex {
            Sex::Female => &self.females,
            Sex::Male => &self.males,
        }
    }

    #[inline]
    pub fn counts_mut(&mut self, sex: Sex) -> &mut [u64] {
        match sex {
            Sex::Female => &mut self.females,
            Sex::Male => &mut self.males,
        }
    }

    /// Total number of females.
    pub fn total_females(&self) -> u64 {
        saturating_sum(&self.females)
    }

    /// Total number of males.
    pub fn total_males(&self) -> u64 {
        saturating_sum(&self.males)
    }

    /// Total population size across both sexes, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.total_females().saturating_add(self.total_males())
    }

    /// Size of the rarer sex.
    pub fn limiting_sex_total(&self) -> u64 {
        self.total_females().min(self.total_males())
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Add another state of the same shape into this one. Counts saturate
    /// at `u64::MAX`.
    pub fn merge(&mut self, other: &PopulationState) {
        for sex in Sex::BOTH {
            for (dst, src) in self.counts_mut(sex).iter_mut().zip(other.counts(sex)) {
                *dst = dst.saturating_add(*src);
            }
        }
    }

    /// Female/male pair for one age class.
    #[inline]
    pub fn class(&self, age: usize) -> (u64, u64) {
        (self.females[age], self.males[age])
    }
}

fn saturating_sum(counts: &[u64]) -> u64 {
    counts.iter().fold(0u64, |acc, &count| acc.saturating_add(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let state = PopulationState::new(vec![20, 20, 0], vec![5, 10, 1]).unwrap();
        assert_eq!(state.age_classes(), 3);
        assert_eq!(state.total_females(), 40);
        assert_eq!(state.total_males(), 16);
        assert_eq!(state.total(), 56);
        assert_eq!(state.limiting_sex_total(), 16);
        assert_eq!(state.class(1), (20, 10));
        assert!(!state.is_empty());
    }

    #[test]
    fn test_empty_state() {
        let state = PopulationState::empty(4);
        assert_eq!(state.age_classes(), 4);
        assert!(state.is_empty());
    }

    #[test]
    fn test_shape_validation() {
        assert_eq!(
            PopulationState::new(vec![], vec![]).unwrap_err(),
            ConfigurationError::NoAgeClasses
        );
        assert!(matches!(
            PopulationState::new(vec![1, 2], vec![1]).unwrap_err(),
            ConfigurationError::LengthMismatch { field: "initial_males", .. }
        ));
    }

    #[test]
    fn test_merge() {
        let mut a = PopulationState::new(vec![1, 2], vec![3, 4]).unwrap();
        let b = PopulationState::new(vec![10, 0], vec![0, 10]).unwrap();
        a.merge(&b);
        assert_eq!(a.females(), &[11, 2]);
        assert_eq!(a.males(), &[3, 14]);
    }

    #[test]
    fn test_totals_and_merge_saturate() {
        let mut a = PopulationState::new(vec![u64::MAX, 1], vec![u64::MAX - 1, 0]).unwrap();
        assert_eq!(a.total_females(), u64::MAX);
        assert_eq!(a.total(), u64::MAX);
        assert_eq!(a.limiting_sex_total(), u64::MAX - 1);

        let b = PopulationState::new(vec![5, 5], vec![5, 5]).unwrap();
        a.merge(&b);
        assert_eq!(a.females(), &[u64::MAX, 6]);
        assert_eq!(a.males(), &[u64::MAX, 5]);
    }
}
