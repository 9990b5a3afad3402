//! The arbiter's final reconciled outcome.

use serde::{Deserialize, Serialize};

use super::extractor::Proposal;
use crate::domain::foundation::Decision;
use crate::domain::guidelines::EvaluationResult;

/// Which arbitration rule produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArbitrationMethod {
    /// No turns or no proposals; a safe default was returned.
    Default,
    /// A single proposal agreed with the guideline decision.
    GuidelinesAligned,
    /// A confident guideline decision overrode a conflicting proposal.
    GuidelinesOverride,
    /// A low-confidence conflict resolved to the more conservative decision.
    Conservative,
    /// Among several proposals, the best one aligned with the guidelines won.
    BestAligned,
    /// A high-confidence proposal was accepted after a safety check.
    HighConfidence,
    /// Proposals were ranked by decision priority and the top one accepted.
    PriorityRule,
    /// Nothing could be accepted safely; fell back to needs-more-info.
    ConservativeFallback,
}

/// Audit bundle attached to every outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeDetails {
    /// The guideline evaluation the arbiter compared against, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guideline_evaluation: Option<EvaluationResult>,
    /// Every proposal that was considered.
    pub proposals: Vec<Proposal>,
}

/// The final reconciled decision for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub decision: Decision,
    pub rationale: String,
    pub confidence: f64,
    pub method: ArbitrationMethod,
    /// What the guidelines alone would decide; absent when arbitration
    /// short-circuited before evaluating them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidelines_decision: Option<Decision>,
    pub proposals_considered: usize,
    pub details: OutcomeDetails,
}

impl Outcome {
    /// A safe default outcome for runs with insufficient evidence.
    pub fn default_outcome(confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            decision: Decision::NeedsMoreInfo,
            rationale: rationale.into(),
            confidence,
            method: ArbitrationMethod::Default,
            guidelines_decision: None,
            proposals_considered: 0,
            details: OutcomeDetails::default(),
        }
    }
}
