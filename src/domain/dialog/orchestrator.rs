//! The turn-taking state machine driving one dialog run.
//!
//! The orchestrator is a pull-based frame generator: each call to
//! [`DialogOrchestrator::next_frame`] advances the run by one observable
//! transition and returns the frame describing it. The transport wraps this
//! into a lazy stream, so frames are never buffered and a slow consumer
//! cannot force unbounded memory growth.
//!
//! Per turn: build a context message, dispatch to the active role's
//! responder under the per-turn timeout, record the result, and flip the
//! active role. A `propose_decision`/`accept_decision` action or the turn
//! cap completes the run and triggers arbitration. Responder failures end
//! the run in `Error` with no retry at this layer. Cancellation is
//! cooperative: it is honored at the next turn boundary, never by aborting
//! an in-flight call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::frame::StreamFrame;
use super::role::AgentRole;
use super::run::{RunHandle, RunOptions};
use super::state::DialogState;
use super::turn::DialogTurn;
use crate::domain::arbitration::Arbiter;
use crate::ports::{ResponderError, ResponderSet, TurnContext};

/// How many recent responses are replayed into each turn's context.
const RECENT_RESPONSE_WINDOW: usize = 3;

/// Internal drive phase between frames.
#[derive(Debug, Clone)]
enum Phase {
    /// Emit the start frame and enter the first turn.
    Start,
    /// Check cancellation and the turn cap, then open the next turn.
    Boundary,
    /// A turn is open and waiting on its responder.
    Dispatch { turn_index: u32, role: AgentRole },
    /// Run the arbiter and emit the completion frame.
    Arbitrate,
    /// Emit the terminal error frame.
    Fail { error: String },
    /// Stream exhausted.
    Done,
}

/// Outcome of a turn-boundary check.
enum Boundary {
    Cancelled(StreamFrame),
    TurnCap,
    Open {
        frame: StreamFrame,
        turn_index: u32,
        role: AgentRole,
    },
}

/// State machine for one run; owns nothing but a handle to the shared run.
pub struct DialogOrchestrator {
    handle: Arc<RunHandle>,
    responders: ResponderSet,
    arbiter: Arbiter,
    options: RunOptions,
    phase: Phase,
}

impl DialogOrchestrator {
    pub fn new(handle: Arc<RunHandle>, responders: ResponderSet) -> Self {
        let options = handle.with_run(|run| run.options);
        Self {
            handle,
            responders,
            arbiter: Arbiter::new(),
            options,
            phase: Phase::Start,
        }
    }

    /// Advances the run by one transition and returns its frame.
    ///
    /// Returns `None` once a terminal frame has been emitted. Within a run,
    /// frames come out in strict turn order.
    pub async fn next_frame(&mut self) -> Option<StreamFrame> {
        loop {
            match self.phase.clone() {
                Phase::Done => return None,
                Phase::Start => {
                    let frame = self.handle.with_run_mut(|run| {
                        let frame = StreamFrame::start(run.run_id, run.state);
                        // Starting advances immediately to the applicant.
                        if run.state == DialogState::Starting {
                            run.state = DialogState::ApplicantTurn;
                        }
                        frame
                    });
                    self.phase = Phase::Boundary;
                    return Some(frame);
                }
                Phase::Boundary => match self.check_boundary() {
                    Boundary::Cancelled(frame) => {
                        info!(run_id = %self.handle.run_id(), "run cancelled at turn boundary");
                        self.phase = Phase::Done;
                        return Some(frame);
                    }
                    Boundary::TurnCap => {
                        debug!(
                            run_id = %self.handle.run_id(),
                            max_turns = self.options.max_turns,
                            "turn cap reached"
                        );
                        self.phase = Phase::Arbitrate;
                    }
                    Boundary::Open {
                        frame,
                        turn_index,
                        role,
                    } => {
                        self.phase = Phase::Dispatch { turn_index, role };
                        return Some(frame);
                    }
                },
                Phase::Dispatch { turn_index, role } => {
                    return Some(self.dispatch_turn(turn_index, role).await);
                }
                Phase::Arbitrate => {
                    let frame = self.handle.with_run_mut(|run| {
                        let outcome = self.arbiter.determine_outcome(&run.turns, &run.guidelines);
                        info!(
                            run_id = %run.run_id,
                            decision = %outcome.decision,
                            method = ?outcome.method,
                            turns = run.turns.len(),
                            "run completed"
                        );
                        run.state = DialogState::Completed;
                        run.final_outcome = Some(outcome.clone());
                        StreamFrame::completion(
                            run.run_id,
                            DialogState::Completed,
                            Some(outcome),
                            run.turns.len() as u32,
                        )
                    });
                    self.phase = Phase::Done;
                    return Some(frame);
                }
                Phase::Fail { error } => {
                    let frame = StreamFrame::error(self.handle.run_id(), error);
                    self.phase = Phase::Done;
                    return Some(frame);
                }
            }
        }
    }

    /// Cancellation and turn-cap check; opens the next turn otherwise.
    fn check_boundary(&self) -> Boundary {
        self.handle.with_run_mut(|run| {
            if run.state == DialogState::Cancelled {
                // Cancellation skips arbitration; no outcome is recorded.
                return Boundary::Cancelled(StreamFrame::completion(
                    run.run_id,
                    DialogState::Cancelled,
                    None,
                    run.turns.len() as u32,
                ));
            }

            let role = match run.state.active_role() {
                Some(role) => role,
                // Defensive: a run that is somehow no longer in a turn state
                // is closed out through arbitration.
                None => return Boundary::TurnCap,
            };

            if run.turns.len() as u32 >= run.options.max_turns {
                return Boundary::TurnCap;
            }

            let turn_index = run.turns.len() as u32;
            let request_message = build_request_message(run);
            let turn = DialogTurn::dispatched(
                turn_index,
                role,
                request_message,
                Some(run.facts.clone()),
            );
            let frame = StreamFrame::turn_start(run.run_id, turn_index, role, turn.source);
            run.turns.push(turn);
            Boundary::Open {
                frame,
                turn_index,
                role,
            }
        })
    }

    /// Calls the responder for an open turn and records the result.
    async fn dispatch_turn(&mut self, turn_index: u32, role: AgentRole) -> StreamFrame {
        let ctx = self.handle.with_run(|run| TurnContext {
            role,
            persona: persona_for(role, &run.scenario),
            facts: run.facts.clone(),
            guidelines: run.guidelines.clone(),
            recent_turns: recent_responses(&run.turns),
        });

        let responder = self.responders.for_role(role).clone();
        let timeout = self.options.per_turn_timeout();
        let result = match tokio::time::timeout(timeout, responder.respond(&ctx)).await {
            Ok(result) => result,
            Err(_) => Err(ResponderError::Timeout {
                timeout_ms: self.options.per_turn_timeout_ms,
            }),
        };

        match result {
            Ok(response) => {
                let (frame, proposed) = self.handle.with_run_mut(|run| {
                    let proposed = response.has_decision_action();
                    if let Some(turn) = run.turns.get_mut(turn_index as usize) {
                        turn.complete(response.clone());
                    }
                    if !proposed && !run.state.is_terminal() {
                        run.state = DialogState::for_role(role.opponent());
                    }
                    let frame =
                        StreamFrame::turn_complete(run.run_id, turn_index, role, response);
                    (frame, proposed)
                });
                self.phase = if proposed {
                    Phase::Arbitrate
                } else {
                    Phase::Boundary
                };
                frame
            }
            Err(err) => {
                warn!(
                    run_id = %self.handle.run_id(),
                    turn = turn_index,
                    %role,
                    error = %err,
                    "responder failed; run ends in error"
                );
                let frame = self.handle.with_run_mut(|run| {
                    if let Some(turn) = run.turns.get_mut(turn_index as usize) {
                        turn.fail(err.to_string());
                    }
                    run.state = DialogState::Error;
                    StreamFrame::turn_error(run.run_id, turn_index, role, err.to_string())
                });
                self.phase = Phase::Fail {
                    error: err.to_string(),
                };
                frame
            }
        }
    }
}

/// Persona instructions for a role in a scenario.
fn persona_for(role: AgentRole, scenario: &str) -> String {
    match role {
        AgentRole::Applicant => format!(
            "You are the applicant in a {} review. Advocate for the subject \
             using only the shared facts, and supply missing information \
             when asked.",
            scenario
        ),
        AgentRole::Administrator => format!(
            "You are the administrator in a {} review. Apply the guidelines \
             strictly, request whatever the facts are missing, and propose a \
             decision once the facts support one.",
            scenario
        ),
    }
}

/// The context message recorded on a turn before dispatch.
fn build_request_message(run: &super::run::DialogRun) -> String {
    format!(
        "scenario: {}\nfacts: {}\nguidelines: {}\ncompleted turns: {}",
        run.scenario,
        serde_json::to_string(&run.facts).unwrap_or_default(),
        serde_json::to_string(&run.guidelines).unwrap_or_default(),
        run.turns.len(),
    )
}

/// The last few responses, oldest first.
fn recent_responses(turns: &[DialogTurn]) -> Vec<super::response::StructuredResponse> {
    let mut recent: Vec<_> = turns
        .iter()
        .rev()
        .filter_map(|turn| turn.response.clone())
        .take(RECENT_RESPONSE_WINDOW)
        .collect();
    recent.reverse();
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialog::{
        Action, DialogRun, ResponseState, StructuredResponse,
    };
    use crate::domain::foundation::Decision;
    use crate::domain::guidelines::Guidelines;
    use crate::domain::subject::{Facts, Sex};
    use crate::ports::{Responder, ResponderInfo};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Queue-driven responder; replies with a plain working response once
    /// the queue is drained.
    struct QueueResponder {
        role: AgentRole,
        replies: Mutex<VecDeque<Result<StructuredResponse, ResponderError>>>,
        delay: Duration,
    }

    impl QueueResponder {
        fn passive(role: AgentRole) -> Arc<Self> {
            Arc::new(Self {
                role,
                replies: Mutex::new(VecDeque::new()),
                delay: Duration::ZERO,
            })
        }

        fn scripted(
            role: AgentRole,
            replies: Vec<Result<StructuredResponse, ResponderError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                role,
                replies: Mutex::new(replies.into()),
                delay: Duration::ZERO,
            })
        }

        fn slow(role: AgentRole, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                role,
                replies: Mutex::new(VecDeque::new()),
                delay,
            })
        }
    }

    #[async_trait]
    impl Responder for QueueResponder {
        async fn respond(&self, _ctx: &TurnContext) -> Result<StructuredResponse, ResponderError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(StructuredResponse::new(self.role, "nothing further")))
        }

        fn info(&self) -> ResponderInfo {
            ResponderInfo::new("queue", "test")
        }
    }

    fn facts() -> Facts {
        Facts::empty()
            .with_sex(Sex::Female)
            .with_birth_date("1969-08-10")
            .with_last_event_date("2022-05-01")
    }

    fn handle_with(options: RunOptions) -> Arc<RunHandle> {
        RunHandle::new(DialogRun::new(
            "screening-eligibility",
            facts(),
            Guidelines::default_screening(),
            options,
        ))
    }

    fn propose(role: AgentRole, decision: Decision, confidence: f64) -> StructuredResponse {
        StructuredResponse::new(role, "decision reached")
            .with_state(ResponseState::Completed)
            .with_confidence(confidence)
            .with_action(Action::ProposeDecision {
                decision,
                rationale: "per guidelines".to_string(),
            })
    }

    async fn collect_frames(mut orchestrator: DialogOrchestrator) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = orchestrator.next_frame().await {
            frames.push(frame);
        }
        frames
    }

    fn frame_types(frames: &[StreamFrame]) -> Vec<&'static str> {
        frames
            .iter()
            .map(|frame| match frame {
                StreamFrame::Start { .. } => "start",
                StreamFrame::TurnStart { .. } => "turn_start",
                StreamFrame::TurnComplete { .. } => "turn_complete",
                StreamFrame::TurnError { .. } => "turn_error",
                StreamFrame::Completion { .. } => "completion",
                StreamFrame::Error { .. } => "error",
            })
            .collect()
    }

    #[tokio::test]
    async fn proposal_completes_the_run() {
        let handle = handle_with(RunOptions::default());
        let responders = ResponderSet::new(
            QueueResponder::passive(AgentRole::Applicant),
            QueueResponder::scripted(
                AgentRole::Administrator,
                vec![Ok(propose(AgentRole::Administrator, Decision::Eligible, 0.9))],
            ),
        );

        let frames = collect_frames(DialogOrchestrator::new(handle.clone(), responders)).await;

        assert_eq!(
            frame_types(&frames),
            vec![
                "start",
                "turn_start",
                "turn_complete",
                "turn_start",
                "turn_complete",
                "completion",
            ]
        );
        assert_eq!(handle.state(), DialogState::Completed);
        let run = handle.snapshot();
        assert_eq!(run.turns.len(), 2);
        let outcome = run.final_outcome.unwrap();
        assert_eq!(outcome.decision, Decision::Eligible);
    }

    #[tokio::test]
    async fn accept_decision_also_completes_the_run() {
        let handle = handle_with(RunOptions::default());
        let responders = ResponderSet::new(
            QueueResponder::scripted(
                AgentRole::Applicant,
                vec![Ok(StructuredResponse::new(AgentRole::Applicant, "accepted")
                    .with_action(Action::AcceptDecision {
                        decision: Decision::Eligible,
                    }))],
            ),
            QueueResponder::passive(AgentRole::Administrator),
        );

        let frames = collect_frames(DialogOrchestrator::new(handle.clone(), responders)).await;

        // Applicant accepts on the very first turn.
        assert_eq!(
            frame_types(&frames),
            vec!["start", "turn_start", "turn_complete", "completion"]
        );
        assert_eq!(handle.state(), DialogState::Completed);
    }

    #[tokio::test]
    async fn run_with_no_proposals_stops_at_the_turn_cap() {
        let options = RunOptions {
            max_turns: 4,
            ..RunOptions::default()
        };
        let handle = handle_with(options);
        let responders = ResponderSet::new(
            QueueResponder::passive(AgentRole::Applicant),
            QueueResponder::passive(AgentRole::Administrator),
        );

        let frames = collect_frames(DialogOrchestrator::new(handle.clone(), responders)).await;

        let run = handle.snapshot();
        assert_eq!(run.turns.len(), 4);
        assert_eq!(run.state, DialogState::Completed);
        // Arbitration still happened; no proposals means the safe default.
        let outcome = run.final_outcome.unwrap();
        assert_eq!(outcome.decision, Decision::NeedsMoreInfo);
        assert_eq!(outcome.confidence, 0.2);
        assert!(frames.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn turns_strictly_alternate() {
        let options = RunOptions {
            max_turns: 6,
            ..RunOptions::default()
        };
        let handle = handle_with(options);
        let responders = ResponderSet::new(
            QueueResponder::passive(AgentRole::Applicant),
            QueueResponder::passive(AgentRole::Administrator),
        );

        collect_frames(DialogOrchestrator::new(handle.clone(), responders)).await;

        let run = handle.snapshot();
        assert_eq!(run.turns[0].role, AgentRole::Applicant);
        for pair in run.turns.windows(2) {
            assert_ne!(pair[0].role, pair[1].role);
        }
    }

    #[tokio::test]
    async fn responder_failure_ends_the_run_in_error() {
        let handle = handle_with(RunOptions::default());
        let responders = ResponderSet::new(
            QueueResponder::scripted(
                AgentRole::Applicant,
                vec![Err(ResponderError::unavailable("service down"))],
            ),
            QueueResponder::passive(AgentRole::Administrator),
        );

        let frames = collect_frames(DialogOrchestrator::new(handle.clone(), responders)).await;

        assert_eq!(
            frame_types(&frames),
            vec!["start", "turn_start", "turn_error", "error"]
        );
        let run = handle.snapshot();
        assert_eq!(run.state, DialogState::Error);
        assert!(run.final_outcome.is_none());
        assert_eq!(run.turns[0].terminal_state, crate::domain::dialog::TurnState::Error);
    }

    #[tokio::test]
    async fn slow_responder_times_out() {
        let options = RunOptions {
            per_turn_timeout_ms: 20,
            ..RunOptions::default()
        };
        let handle = handle_with(options);
        let responders = ResponderSet::new(
            QueueResponder::slow(AgentRole::Applicant, Duration::from_millis(200)),
            QueueResponder::passive(AgentRole::Administrator),
        );

        let frames = collect_frames(DialogOrchestrator::new(handle.clone(), responders)).await;

        assert!(frame_types(&frames).contains(&"turn_error"));
        assert_eq!(handle.state(), DialogState::Error);
        let run = handle.snapshot();
        assert!(run.turns[0].error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn cancellation_is_honored_at_the_next_boundary() {
        let handle = handle_with(RunOptions::default());
        let responders = ResponderSet::new(
            QueueResponder::passive(AgentRole::Applicant),
            QueueResponder::passive(AgentRole::Administrator),
        );
        let mut orchestrator = DialogOrchestrator::new(handle.clone(), responders);

        // Start frame, then one full turn.
        let start = orchestrator.next_frame().await.unwrap();
        assert!(matches!(start, StreamFrame::Start { .. }));
        orchestrator.next_frame().await.unwrap(); // turn_start
        orchestrator.next_frame().await.unwrap(); // turn_complete

        handle.with_run_mut(|run| {
            assert!(run.request_cancel());
        });

        let frame = orchestrator.next_frame().await.unwrap();
        match frame {
            StreamFrame::Completion { state, outcome, total_turns, .. } => {
                assert_eq!(state, DialogState::Cancelled);
                assert!(outcome.is_none());
                assert_eq!(total_turns, 1);
            }
            other => panic!("expected completion frame, got {:?}", other),
        }
        assert!(orchestrator.next_frame().await.is_none());

        // Cancellation skips arbitration entirely.
        assert!(handle.snapshot().final_outcome.is_none());
    }

    #[tokio::test]
    async fn stream_ends_after_exactly_one_terminal_frame() {
        let handle = handle_with(RunOptions {
            max_turns: 2,
            ..RunOptions::default()
        });
        let responders = ResponderSet::new(
            QueueResponder::passive(AgentRole::Applicant),
            QueueResponder::passive(AgentRole::Administrator),
        );

        let frames = collect_frames(DialogOrchestrator::new(handle, responders)).await;

        let terminal_count = frames.iter().filter(|f| f.is_terminal()).count();
        assert_eq!(terminal_count, 1);
        assert!(frames.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn context_carries_recent_responses_and_facts() {
        let run = DialogRun::new(
            "screening-eligibility",
            facts(),
            Guidelines::default_screening(),
            RunOptions::default(),
        );
        let handle = RunHandle::new(run);

        let responders = ResponderSet::new(
            QueueResponder::passive(AgentRole::Applicant),
            QueueResponder::scripted(
                AgentRole::Administrator,
                vec![Ok(propose(AgentRole::Administrator, Decision::Eligible, 0.9))],
            ),
        );
        collect_frames(DialogOrchestrator::new(handle.clone(), responders)).await;

        let run = handle.snapshot();
        // Every turn snapshots the run facts for the arbiter to find.
        assert!(run.turns.iter().all(|turn| turn.facts.is_some()));
        assert!(run.turns[0].request_message.contains("screening-eligibility"));
    }
}
