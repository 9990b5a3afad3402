//! Actions carried by a structured response.
//!
//! `Action` is a closed tagged variant keyed by `kind`. Kinds we do not
//! recognize are preserved verbatim in `Unrecognized` rather than dropped,
//! so audit trails keep whatever a responder produced; proposal extraction
//! simply ignores them.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::foundation::Decision;

/// One action proposed by a role in its turn response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Ask the other role for specific missing fields.
    RequestInfo { fields: Vec<String> },
    /// Ask for supporting documents.
    RequestDocs { items: Vec<String> },
    /// Supply additional structured data.
    ProvideInfo { data: serde_json::Value },
    /// Ask the other role to clarify something.
    RequestClarification { question: String },
    /// Propose a final decision with a rationale.
    ProposeDecision {
        decision: Decision,
        rationale: String,
    },
    /// Accept a decision previously proposed by the other role.
    AcceptDecision { decision: Decision },
    /// An action kind this version does not know; raw payload preserved.
    #[serde(untagged)]
    Unrecognized(serde_json::Value),
}

/// Mirror of the known variants, used for strict parsing.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum KnownAction {
    RequestInfo {
        fields: Vec<String>,
    },
    RequestDocs {
        items: Vec<String>,
    },
    ProvideInfo {
        data: serde_json::Value,
    },
    RequestClarification {
        question: String,
    },
    ProposeDecision {
        decision: Decision,
        rationale: String,
    },
    AcceptDecision {
        decision: Decision,
    },
}

impl From<KnownAction> for Action {
    fn from(known: KnownAction) -> Self {
        match known {
            KnownAction::RequestInfo { fields } => Action::RequestInfo { fields },
            KnownAction::RequestDocs { items } => Action::RequestDocs { items },
            KnownAction::ProvideInfo { data } => Action::ProvideInfo { data },
            KnownAction::RequestClarification { question } => {
                Action::RequestClarification { question }
            }
            KnownAction::ProposeDecision {
                decision,
                rationale,
            } => Action::ProposeDecision {
                decision,
                rationale,
            },
            KnownAction::AcceptDecision { decision } => Action::AcceptDecision { decision },
        }
    }
}

const KNOWN_KINDS: [&str; 6] = [
    "request_info",
    "request_docs",
    "provide_info",
    "request_clarification",
    "propose_decision",
    "accept_decision",
];

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value.get("kind").and_then(serde_json::Value::as_str);

        match kind {
            // A known kind must parse strictly; malformed payloads are errors,
            // not unrecognized actions.
            Some(kind) if KNOWN_KINDS.contains(&kind) => KnownAction::deserialize(&value)
                .map(Action::from)
                .map_err(D::Error::custom),
            _ => Ok(Action::Unrecognized(value)),
        }
    }
}

impl Action {
    /// The decision this action proposes or accepts, if any.
    pub fn proposed_decision(&self) -> Option<Decision> {
        match self {
            Action::ProposeDecision { decision, .. } | Action::AcceptDecision { decision } => {
                Some(*decision)
            }
            _ => None,
        }
    }

    /// True for `propose_decision` and `accept_decision` actions.
    pub fn is_decision_bearing(&self) -> bool {
        self.proposed_decision().is_some()
    }

    /// The rationale attached to a `propose_decision`, if present.
    pub fn rationale(&self) -> Option<&str> {
        match self {
            Action::ProposeDecision { rationale, .. } => Some(rationale),
            _ => None,
        }
    }
}
