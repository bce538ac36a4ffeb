use buildview_core::{InvocationModel, InvocationRecord};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::fetch::{FetchError, InvocationId};

/// Which page the invocation view is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Loading,
    NotFound,
    InProgress,
    Ready,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Loading => "loading",
            LifecycleState::NotFound => "not found",
            LifecycleState::InProgress => "in progress",
            LifecycleState::Ready => "ready",
        };
        f.write_str(label)
    }
}

/// Result of feeding one fetch outcome into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LifecycleState,
    pub to: LifecycleState,
    /// The build is still running and another fetch should follow.
    pub schedule_poll: bool,
}

/// Decide the next lifecycle state for a successful response, and whether
/// the build is still running.
///
/// Only the first record is inspected. A partial build with no events yet
/// shows the in-progress page; once events exist it is shown as ready while
/// polling continues.
pub fn classify(records: &[InvocationRecord]) -> (LifecycleState, bool) {
    match records.first() {
        Some(first) if first.is_partial() => {
            let next = if first.has_events() {
                LifecycleState::Ready
            } else {
                LifecycleState::InProgress
            };
            (next, true)
        }
        _ => (LifecycleState::Ready, false),
    }
}

/// The committed view state: lifecycle and snapshot always change together.
///
/// Cloning is cheap; the model sits behind an `Arc` and is replaced, never
/// mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    invocation_id: InvocationId,
    lifecycle: LifecycleState,
    model: Arc<InvocationModel>,
    live: bool,
    revision: u64,
}

impl ViewState {
    pub fn new(invocation_id: InvocationId) -> Self {
        Self {
            invocation_id,
            lifecycle: LifecycleState::Loading,
            model: Arc::new(InvocationModel::default()),
            live: false,
            revision: 0,
        }
    }

    pub fn invocation_id(&self) -> &InvocationId {
        &self.invocation_id
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn model(&self) -> &InvocationModel {
        &self.model
    }

    pub fn shared_model(&self) -> Arc<InvocationModel> {
        Arc::clone(&self.model)
    }

    /// Whether the last commit left a refresh pending.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Number of fetch outcomes committed so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Nothing further will change without outside action.
    pub fn is_settled(&self) -> bool {
        self.lifecycle != LifecycleState::Loading && !self.live
    }

    /// Commit one fetch outcome.
    ///
    /// Failures move to `NotFound` from any state. `NotFound` is terminal:
    /// later outcomes are ignored and never ask for a poll.
    pub fn apply(&mut self, outcome: Result<Vec<InvocationRecord>, FetchError>) -> Transition {
        let from = self.lifecycle;
        if from == LifecycleState::NotFound {
            return Transition {
                from,
                to: from,
                schedule_poll: false,
            };
        }

        let (to, schedule_poll) = match outcome {
            Ok(records) => {
                let (next, still_running) = classify(&records);
                self.model = Arc::new(InvocationModel::from_invocations(&records));
                (next, still_running)
            }
            Err(e) => {
                warn!("Invocation {} could not be fetched: {e}", self.invocation_id);
                (LifecycleState::NotFound, false)
            }
        };

        self.lifecycle = to;
        self.live = schedule_poll;
        self.revision += 1;

        if from != to {
            info!("Invocation {}: {from} -> {to}", self.invocation_id);
        }

        Transition {
            from,
            to,
            schedule_poll,
        }
    }
}
