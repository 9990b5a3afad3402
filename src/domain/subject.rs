//! Facts describing the subject under evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorded sex of the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    /// Not recorded; treated as absent by the guideline engine.
    #[default]
    Unknown,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Structured input describing the subject being evaluated.
///
/// Immutable once attached to a run. Dates stay ISO-8601 strings as received
/// from the wire; the guideline engine parses them so that malformed values
/// can be classified rather than rejected at the edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Facts {
    /// Recorded sex; `unknown` means absent.
    pub sex: Sex,
    /// Birth date as `YYYY-MM-DD`, if recorded.
    pub birth_date: Option<String>,
    /// Date of the most recent prior event (e.g., last screening), if any.
    pub last_event_date: Option<String>,
}

impl Facts {
    /// Creates empty facts (nothing recorded).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the recorded sex.
    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    /// Sets the birth date.
    pub fn with_birth_date(mut self, date: impl Into<String>) -> Self {
        self.birth_date = Some(date.into());
        self
    }

    /// Sets the last event date.
    pub fn with_last_event_date(mut self, date: impl Into<String>) -> Self {
        self.last_event_date = Some(date.into());
        self
    }
}
