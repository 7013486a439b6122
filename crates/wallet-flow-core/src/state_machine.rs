use crate::errors::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Authenticating,
    Building,
    Broadcasting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Idle,
    Authenticating,
    Building,
    AwaitingConfirm,
    Broadcasting,
    Succeeded,
    Failed(FailedStage),
}

impl WorkflowStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStage::Succeeded | WorkflowStage::Failed(_))
    }

    /// Stages an explicit cancel may interrupt. Broadcasting is excluded: the
    /// network action is irreversible once dispatched.
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            WorkflowStage::Authenticating | WorkflowStage::Building | WorkflowStage::AwaitingConfirm
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Start,
    Authenticated,
    AuthCancelled,
    AuthFailed,
    Built,
    BuildFailed,
    Confirmed,
    Cancel,
    Broadcasted,
    BroadcastFailed,
    Abandon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: WorkflowStage,
    pub to: WorkflowStage,
    pub reason: &'static str,
}

pub fn workflow_transition(
    stage: WorkflowStage,
    action: WorkflowAction,
) -> Result<(WorkflowStage, StateTransition), WorkflowError> {
    use WorkflowAction as A;
    use WorkflowStage as S;

    let (to, reason) = match (stage, action) {
        (S::Idle | S::Succeeded | S::Failed(_), A::Start) => (S::Authenticating, "start"),
        (S::Authenticating, A::Authenticated) => (S::Building, "authenticated"),
        (S::Authenticating, A::AuthCancelled) => (S::Idle, "auth_cancelled"),
        (S::Authenticating, A::AuthFailed) => {
            (S::Failed(FailedStage::Authenticating), "auth_failed")
        }
        (S::Building, A::Built) => (S::AwaitingConfirm, "built"),
        (S::Building, A::BuildFailed) => (S::Failed(FailedStage::Building), "build_failed"),
        (S::AwaitingConfirm, A::Confirmed) => (S::Broadcasting, "confirmed"),
        (S::Broadcasting, A::Broadcasted) => (S::Succeeded, "broadcasted"),
        (S::Broadcasting, A::BroadcastFailed) => {
            (S::Failed(FailedStage::Broadcasting), "broadcast_failed")
        }
        (s, A::Cancel) if s.is_cancellable() => (S::Idle, "cancelled"),
        (s, A::Abandon) if !s.is_terminal() && s != S::Idle => (S::Idle, "abandoned"),
        (from, action) => return Err(WorkflowError::IllegalTransition { from, action }),
    };

    Ok((
        to,
        StateTransition {
            from: stage,
            to,
            reason,
        },
    ))
}
