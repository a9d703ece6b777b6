use core::fmt;

use serde::{Deserialize, Serialize};

/// The two sexes tracked by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Both sexes, females first. Iteration order is part of the random
    /// stream layout and must not change.
    pub const BOTH: [Sex; 2] = [Sex::Female, Sex::Male];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
