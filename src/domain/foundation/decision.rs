//! The closed set of eligibility decisions and their orderings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final decision about a subject's eligibility.
///
/// Two distinct total orders apply depending on context:
/// conservatism (used when reconciling conflicting proposals) and action
/// priority (used when ranking proposals that could not otherwise be chosen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// Subject meets the guidelines.
    Eligible,
    /// Evidence is insufficient to decide either way.
    NeedsMoreInfo,
    /// Subject does not meet the guidelines.
    Ineligible,
}

impl Decision {
    /// Every decision variant, for exhaustive validation.
    pub const ALL: [Decision; 3] = [
        Decision::Eligible,
        Decision::NeedsMoreInfo,
        Decision::Ineligible,
    ];

    /// Conservatism rank: `needs-more-info` > `ineligible` > `eligible`.
    ///
    /// Higher is more conservative.
    pub fn conservatism_rank(&self) -> u8 {
        match self {
            Decision::NeedsMoreInfo => 3,
            Decision::Ineligible => 2,
            Decision::Eligible => 1,
        }
    }

    /// Action priority rank: `eligible` > `needs-more-info` > `ineligible`.
    pub fn priority_rank(&self) -> u8 {
        match self {
            Decision::Eligible => 3,
            Decision::NeedsMoreInfo => 2,
            Decision::Ineligible => 1,
        }
    }

    /// Returns the more conservative of two decisions.
    pub fn more_conservative(self, other: Decision) -> Decision {
        if self.conservatism_rank() >= other.conservatism_rank() {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Eligible => "eligible",
            Decision::NeedsMoreInfo => "needs-more-info",
            Decision::Ineligible => "ineligible",
        };
        write!(f, "{}", s)
    }
}
