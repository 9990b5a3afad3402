//! Layered reconciliation of proposals against guideline evaluation.

use chrono::NaiveDate;
use tracing::debug;

use super::extractor::{Proposal, ProposalExtractor};
use super::outcome::{ArbitrationMethod, Outcome, OutcomeDetails};
use crate::domain::dialog::DialogTurn;
use crate::domain::foundation::Decision;
use crate::domain::guidelines::{EvaluationResult, GuidelineEngine, Guidelines};
use crate::domain::subject::Facts;

/// Reconciles dialog proposals with guideline evaluation into one outcome.
///
/// Arbitration never fails: with no turns or no proposals it returns a
/// low-confidence `needs-more-info` outcome rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Arbiter {
    engine: GuidelineEngine,
}

impl Arbiter {
    pub fn new() -> Self {
        Self {
            engine: GuidelineEngine::new(),
        }
    }

    /// Determines the final outcome for a run, evaluating guidelines as of
    /// today.
    pub fn determine_outcome(&self, turns: &[DialogTurn], guidelines: &Guidelines) -> Outcome {
        self.determine_outcome_at(turns, guidelines, chrono::Utc::now().date_naive())
    }

    /// Determines the final outcome with an explicit evaluation date.
    pub fn determine_outcome_at(
        &self,
        turns: &[DialogTurn],
        guidelines: &Guidelines,
        evaluation_date: NaiveDate,
    ) -> Outcome {
        if turns.is_empty() {
            return Outcome::default_outcome(0.1, "No dialog turns were recorded.");
        }

        let proposals = ProposalExtractor::extract(turns);
        if proposals.is_empty() {
            return Outcome::default_outcome(0.2, "The dialog produced no decision proposals.");
        }

        // The most recent facts snapshot referenced by any turn; empty facts
        // when no turn carried one.
        let facts = turns
            .iter()
            .rev()
            .find_map(|turn| turn.facts.clone())
            .unwrap_or_else(Facts::empty);

        let evaluation = self.engine.evaluate(&facts, guidelines, evaluation_date);
        debug!(
            guidelines_decision = %evaluation.decision,
            guidelines_confidence = evaluation.confidence,
            proposals = proposals.len(),
            "arbitrating proposals against guidelines"
        );

        let outcome = if proposals.len() == 1 {
            self.reconcile_single(&proposals[0], &evaluation)
        } else {
            self.reconcile_many(&proposals, &evaluation)
        };

        Outcome {
            guidelines_decision: Some(evaluation.decision),
            proposals_considered: proposals.len(),
            details: OutcomeDetails {
                guideline_evaluation: Some(evaluation),
                proposals,
            },
            ..outcome
        }
    }

    fn reconcile_single(&self, proposal: &Proposal, evaluation: &EvaluationResult) -> Outcome {
        if proposal.decision == evaluation.decision {
            return self.partial(
                proposal.decision,
                proposal.rationale.clone(),
                proposal.confidence.min(evaluation.confidence),
                ArbitrationMethod::GuidelinesAligned,
            );
        }

        // Conflict: a confident guideline result wins outright.
        if evaluation.confidence > 0.7 {
            return self.partial(
                evaluation.decision,
                evaluation.rationale.clone(),
                evaluation.confidence,
                ArbitrationMethod::GuidelinesOverride,
            );
        }

        // Low-confidence conflict: take the more conservative decision.
        let decision = proposal.decision.more_conservative(evaluation.decision);
        let rationale = if decision == proposal.decision {
            proposal.rationale.clone()
        } else {
            evaluation.rationale.clone()
        };
        self.partial(decision, rationale, 0.6, ArbitrationMethod::Conservative)
    }

    fn reconcile_many(&self, proposals: &[Proposal], evaluation: &EvaluationResult) -> Outcome {
        // Rule 1: prefer the best proposal that agrees with the guidelines.
        if let Some(best_aligned) = proposals
            .iter()
            .filter(|p| p.decision == evaluation.decision)
            .max_by(|a, b| compare_confidence(a, b))
        {
            return self.partial(
                best_aligned.decision,
                best_aligned.rationale.clone(),
                best_aligned.confidence.min(evaluation.confidence),
                ArbitrationMethod::BestAligned,
            );
        }

        // Rule 2: a high-confidence proposal, if it is safe to accept.
        if let Some(confident) = proposals
            .iter()
            .filter(|p| p.confidence > 0.7)
            .max_by(|a, b| compare_confidence(a, b))
        {
            if is_safe(confident.decision, evaluation) {
                return self.partial(
                    confident.decision,
                    confident.rationale.clone(),
                    confident.confidence,
                    ArbitrationMethod::HighConfidence,
                );
            }
        }

        // Rule 3: highest action-priority proposal, if safe, discounted.
        if let Some(top) = proposals
            .iter()
            .max_by_key(|p| p.decision.priority_rank())
        {
            if is_safe(top.decision, evaluation) {
                return self.partial(
                    top.decision,
                    top.rationale.clone(),
                    top.confidence * 0.8,
                    ArbitrationMethod::PriorityRule,
                );
            }
        }

        // Rule 4: nothing acceptable.
        self.partial(
            Decision::NeedsMoreInfo,
            "Proposals could not be reconciled safely; more information is required.".to_string(),
            0.5,
            ArbitrationMethod::ConservativeFallback,
        )
    }

    /// Outcome with placeholder audit fields; `determine_outcome_at` fills
    /// them in.
    fn partial(
        &self,
        decision: Decision,
        rationale: String,
        confidence: f64,
        method: ArbitrationMethod,
    ) -> Outcome {
        Outcome {
            decision,
            rationale,
            confidence,
            method,
            guidelines_decision: None,
            proposals_considered: 0,
            details: OutcomeDetails::default(),
        }
    }
}

/// Whether accepting `decision` is safe given the guideline evaluation.
///
/// `needs-more-info` is always safe. Any decision that disagrees with a
/// guideline result above 0.8 confidence is unsafe, and proposing `eligible`
/// against an `ineligible` guideline result is unsafe at any confidence.
fn is_safe(decision: Decision, evaluation: &EvaluationResult) -> bool {
    if decision == Decision::NeedsMoreInfo {
        return true;
    }
    if evaluation.confidence > 0.8 && decision != evaluation.decision {
        return false;
    }
    !(decision == Decision::Eligible && evaluation.decision == Decision::Ineligible)
}

fn compare_confidence(a: &&Proposal, b: &&Proposal) -> std::cmp::Ordering {
    a.confidence
        .partial_cmp(&b.confidence)
        .unwrap_or(std::cmp::Ordering::Equal)
}
