use thiserror::Error;

use crate::domain::InvocationId;
use crate::state_machine::{WorkflowAction, WorkflowStage};

/// Caller input rejected before the workflow starts. Shown inline by the
/// screen; never enters the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{message}")]
    Rejected {
        field: &'static str,
        message: String,
    },
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid gesture geometry: {0}")]
    InvalidGeometry(String),
}

impl ValidationError {
    pub fn rejected(field: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authentication cancelled")]
    Cancelled,
    #[error("authentication failed after {attempts} attempts")]
    Failed { attempts: u32 },
    #[error("authentication unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BuildError {
    pub message: String,
}

impl BuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raw error reported by the broadcaster. `Display` shows the user-facing
/// part only: everything before the first `[` (node error codes and debug
/// payloads follow it).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.display_message())]
pub struct BroadcastError {
    pub raw: String,
}

impl BroadcastError {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn display_message(&self) -> &str {
        let head = match self.raw.find('[') {
            Some(idx) => &self.raw[..idx],
            None => self.raw.as_str(),
        };
        head.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("workflow already in progress ({active})")]
    AlreadyInProgress { active: InvocationId },
    #[error("illegal workflow transition: {from:?} -> {action:?}")]
    IllegalTransition {
        from: WorkflowStage,
        action: WorkflowAction,
    },
    #[error("stale invocation {0}")]
    StaleInvocation(InvocationId),
}

/// The error carried by a `Failed` workflow, tagged by the stage that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_error_strips_bracketed_suffix() {
        let err = BroadcastError::new("bad-txns-inputs-missingorspent [code -25]");
        assert_eq!(err.display_message(), "bad-txns-inputs-missingorspent");
        assert_eq!(err.to_string(), "bad-txns-inputs-missingorspent");
    }

    #[test]
    fn broadcast_error_without_suffix_is_kept() {
        let err = BroadcastError::new("connection reset");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn stage_error_is_transparent() {
        let err: StageError = BuildError::new("insufficient funds").into();
        assert_eq!(err.to_string(), "insufficient funds");
    }
}
