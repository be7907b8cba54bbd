//! The request state machine.
//!
//! Transition legality lives here as data (`allowed_from`) so the database
//! layer can build its conditional updates from the same table the checks
//! use. Only active requests accept Resolve/Discard; only terminal ones
//! accept Reopen.

use crate::error::LifecycleError;
use crate::types::RequestStatus;
use serde::{Deserialize, Serialize};

/// An action that moves a request between lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    Resolve,
    Discard,
    Reopen,
}

impl TransitionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionAction::Resolve => "resolve",
            TransitionAction::Discard => "discard",
            TransitionAction::Reopen => "reopen",
        }
    }

    /// States this action may be applied from.
    pub fn allowed_from(&self) -> &'static [RequestStatus] {
        match self {
            TransitionAction::Resolve | TransitionAction::Discard => {
                &[RequestStatus::Open, RequestStatus::Reopened]
            }
            TransitionAction::Reopen => &[RequestStatus::Resolved, RequestStatus::Discarded],
        }
    }

    /// State the request enters when this action succeeds.
    pub fn target(&self) -> RequestStatus {
        match self {
            TransitionAction::Resolve => RequestStatus::Resolved,
            TransitionAction::Discard => RequestStatus::Discarded,
            TransitionAction::Reopen => RequestStatus::Reopened,
        }
    }
}

impl std::fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `action` is legal from `current`, returning the target state.
///
/// Duplicate button clicks land here as an illegal transition (e.g. Resolve
/// on an already-resolved request) and are rejected rather than reapplied.
pub fn check_transition(
    current: RequestStatus,
    action: TransitionAction,
) -> Result<RequestStatus, LifecycleError> {
    if action.allowed_from().contains(&current) {
        Ok(action.target())
    } else {
        Err(LifecycleError::InvalidTransition {
            action,
            status: current,
        })
    }
}
