pub mod amount;
pub mod domain;
pub mod errors;
pub mod gesture;
pub mod orchestrator;
pub mod overlay;
pub mod ports;
pub mod security;
pub mod state_machine;

pub use amount::{normalize_price_input, Amount, UNITS_PER_COIN};
pub use domain::{
    AuthenticationType, BroadcastReceipt, BuiltTransaction, InvocationId, LockState,
    OverlayEntry, PanelContent, PendingTransaction, Secret, SummaryRow, TimestampMs,
    WorkflowRequest,
};
pub use errors::{
    AuthError, BroadcastError, BuildError, StageError, ValidationError, WorkflowError,
};
pub use gesture::{DragEndOutcome, GestureConfig, GesturePhase, GestureState, SwipeConfirmGesture};
pub use orchestrator::{
    TransactionWorkflowOrchestrator, TransitionRecord, WorkflowOutcome, HISTORY_LIMIT,
};
pub use overlay::OverlayCoordinator;
pub use ports::{AuthenticatorPort, ChallengeOutcome, ClockPort, OverlaySurface};
pub use security::{GateSettings, SecurityGate};
pub use state_machine::{
    workflow_transition, FailedStage, StateTransition, WorkflowAction, WorkflowStage,
};
