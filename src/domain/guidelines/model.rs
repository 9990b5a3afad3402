//! Guideline configuration with validating, atomic replacement semantics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::foundation::Decision;
use crate::domain::subject::Sex;

/// Inclusive age bounds, in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    /// Creates an age range without validating it; call
    /// [`Guidelines::validate`] before use.
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Returns true if `age` falls within the inclusive bounds.
    pub fn contains(&self, age: i32) -> bool {
        age >= i32::from(self.min) && age <= i32::from(self.max)
    }
}

/// Versioned configuration driving the guideline engine.
///
/// Mutated only through a validating replace; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidelines {
    /// Version key this configuration is stored under.
    pub version: String,
    /// Inclusive eligible age range.
    pub age_range: AgeRange,
    /// Minimum months that must have elapsed since the last event.
    pub interval_months: u32,
    /// Sex the screening applies to.
    pub sex_required: Sex,
    /// Decision to fall back to when the subject has no event history.
    pub no_history_policy: Decision,
    /// Canonical rationale text per decision.
    pub rationales: HashMap<Decision, String>,
}

/// Guideline configuration and lookup errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuidelineError {
    #[error("age range must satisfy min < max, got {min}..{max}")]
    InvalidAgeRange { min: u8, max: u8 },

    #[error("age bound {value} is outside the permitted range 0..=120")]
    AgeBoundOutOfRange { value: u8 },

    #[error("intervalMonths must be a positive integer")]
    NonPositiveInterval,

    #[error("sexRequired must be male or female")]
    InvalidSexRequired,

    #[error("rationales must contain an entry for decision '{decision}'")]
    MissingRationale { decision: Decision },

    #[error("no guidelines found for version '{0}'")]
    VersionNotFound(String),
}

impl Guidelines {
    /// The default screening configuration, stored under version `default`.
    pub fn default_screening() -> Self {
        let mut rationales = HashMap::new();
        rationales.insert(
            Decision::Eligible,
            "Subject satisfies the sex, age, and screening interval requirements.".to_string(),
        );
        rationales.insert(
            Decision::NeedsMoreInfo,
            "Screening history is incomplete; additional records are required before a decision."
                .to_string(),
        );
        rationales.insert(
            Decision::Ineligible,
            "Subject does not satisfy the current screening guidelines.".to_string(),
        );

        Self {
            version: "default".to_string(),
            age_range: AgeRange::new(50, 74),
            interval_months: 24,
            sex_required: Sex::Female,
            no_history_policy: Decision::NeedsMoreInfo,
            rationales,
        }
    }

    /// Validates every configuration invariant.
    ///
    /// Callers replacing a stored version must validate first so a rejected
    /// update leaves the previous configuration untouched.
    pub fn validate(&self) -> Result<(), GuidelineError> {
        for value in [self.age_range.min, self.age_range.max] {
            if value > 120 {
                return Err(GuidelineError::AgeBoundOutOfRange { value });
            }
        }
        if self.age_range.min >= self.age_range.max {
            return Err(GuidelineError::InvalidAgeRange {
                min: self.age_range.min,
                max: self.age_range.max,
            });
        }
        if self.interval_months == 0 {
            return Err(GuidelineError::NonPositiveInterval);
        }
        if self.sex_required == Sex::Unknown {
            return Err(GuidelineError::InvalidSexRequired);
        }
        for decision in Decision::ALL {
            if !self.rationales.contains_key(&decision) {
                return Err(GuidelineError::MissingRationale { decision });
            }
        }
        Ok(())
    }

    /// Rationale text for a decision, falling back to the decision name when
    /// the map has no entry (cannot happen for validated guidelines).
    pub fn rationale_for(&self, decision: Decision) -> String {
        self.rationales
            .get(&decision)
            .cloned()
            .unwrap_or_else(|| decision.to_string())
    }
}
