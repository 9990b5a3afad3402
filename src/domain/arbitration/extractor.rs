//! Extracting decision proposals from completed turns.

use serde::{Deserialize, Serialize};

use crate::domain::dialog::{AgentRole, DialogTurn, TurnSource};
use crate::domain::foundation::{Decision, Timestamp};

/// A role's suggested final decision, extracted from one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub turn_index: u32,
    pub role: AgentRole,
    pub decision: Decision,
    pub rationale: String,
    pub confidence: f64,
    pub timestamp: Timestamp,
    pub source: TurnSource,
}

/// Pulls decision proposals out of a sequence of completed turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProposalExtractor;

impl ProposalExtractor {
    /// Returns at most one proposal per turn, in turn-index order.
    ///
    /// A turn contributes a proposal only if its response contains a
    /// `propose_decision` or `accept_decision` action; other turns are
    /// skipped. `accept_decision` carries no rationale of its own, so the
    /// response message stands in.
    pub fn extract(turns: &[DialogTurn]) -> Vec<Proposal> {
        turns
            .iter()
            .filter_map(|turn| {
                let response = turn.response.as_ref()?;
                let action = response.decision_action()?;
                let decision = action.proposed_decision()?;
                Some(Proposal {
                    turn_index: turn.turn_index,
                    role: turn.role,
                    decision,
                    rationale: action
                        .rationale()
                        .unwrap_or(response.message.as_str())
                        .to_string(),
                    confidence: response.confidence,
                    timestamp: turn.timestamp,
                    source: turn.source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialog::{Action, StructuredResponse};

    fn turn_with_response(index: u32, role: AgentRole, response: StructuredResponse) -> DialogTurn {
        let mut turn = DialogTurn::dispatched(index, role, "context", None);
        turn.complete(response);
        turn
    }

    #[test]
    fn empty_turns_yield_no_proposals() {
        assert!(ProposalExtractor::extract(&[]).is_empty());
    }

    #[test]
    fn turns_without_decisions_are_skipped() {
        let turns = vec![
            turn_with_response(
                0,
                AgentRole::Applicant,
                StructuredResponse::new(AgentRole::Applicant, "records attached")
                    .with_action(Action::ProvideInfo {
                        data: serde_json::json!({ "birthDate": "1969-08-10" }),
                    }),
            ),
            DialogTurn::dispatched(1, AgentRole::Administrator, "context", None),
        ];

        assert!(ProposalExtractor::extract(&turns).is_empty());
    }

    #[test]
    fn propose_decision_becomes_a_proposal() {
        let turns = vec![turn_with_response(
            3,
            AgentRole::Administrator,
            StructuredResponse::new(AgentRole::Administrator, "decision reached")
                .with_confidence(0.8)
                .with_action(Action::ProposeDecision {
                    decision: Decision::Ineligible,
                    rationale: "outside age range".to_string(),
                }),
        )];

        let proposals = ProposalExtractor::extract(&turns);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].turn_index, 3);
        assert_eq!(proposals[0].decision, Decision::Ineligible);
        assert_eq!(proposals[0].rationale, "outside age range");
        assert_eq!(proposals[0].confidence, 0.8);
    }

    #[test]
    fn accept_decision_uses_message_as_rationale() {
        let turns = vec![turn_with_response(
            4,
            AgentRole::Applicant,
            StructuredResponse::new(AgentRole::Applicant, "I accept the determination")
                .with_action(Action::AcceptDecision {
                    decision: Decision::Eligible,
                }),
        )];

        let proposals = ProposalExtractor::extract(&turns);
        assert_eq!(proposals[0].decision, Decision::Eligible);
        assert_eq!(proposals[0].rationale, "I accept the determination");
    }

    #[test]
    fn proposals_follow_turn_order() {
        let turns = vec![
            turn_with_response(
                0,
                AgentRole::Applicant,
                StructuredResponse::new(AgentRole::Applicant, "a").with_action(
                    Action::ProposeDecision {
                        decision: Decision::Eligible,
                        rationale: "first".to_string(),
                    },
                ),
            ),
            turn_with_response(
                1,
                AgentRole::Administrator,
                StructuredResponse::new(AgentRole::Administrator, "b").with_action(
                    Action::ProposeDecision {
                        decision: Decision::NeedsMoreInfo,
                        rationale: "second".to_string(),
                    },
                ),
            ),
        ];

        let proposals = ProposalExtractor::extract(&turns);
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].rationale, "first");
        assert_eq!(proposals[1].rationale, "second");
    }

    #[test]
    fn unrecognized_actions_do_not_produce_proposals() {
        let response: StructuredResponse = serde_json::from_value(serde_json::json!({
            "role": "administrator",
            "state": "working",
            "message": "escalating",
            "actions": [{ "kind": "escalate_to_human" }],
        }))
        .unwrap();
        let turns = vec![turn_with_response(0, AgentRole::Administrator, response)];

        assert!(ProposalExtractor::extract(&turns).is_empty());
    }
}
