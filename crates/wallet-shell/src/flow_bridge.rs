//! Bridge between the screens and the workflow crates.
//! Screens only reach the orchestrator, gate, vault and wallet through here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use wallet_flow_adapters::{
    FlowAdapterConfig, InMemoryWallet, PromptAuthenticator, PromptHandle,
    RecordingOverlaySurface, SecretVault, SystemClockAdapter, WalletAction,
};
use wallet_flow_core::{
    OverlayCoordinator, SecurityGate, TransactionWorkflowOrchestrator, WorkflowError,
    WorkflowOutcome, WorkflowRequest,
};

pub type FlowOrchestrator =
    TransactionWorkflowOrchestrator<PromptAuthenticator, RecordingOverlaySurface, SystemClockAdapter>;

#[derive(Clone)]
pub struct FlowBridge {
    orchestrator: FlowOrchestrator,
    wallet: InMemoryWallet,
    config: Arc<FlowAdapterConfig>,
}

impl FlowBridge {
    /// Wires the adapters together. The returned handle is where PIN pads and
    /// biometric sheets receive their prompts.
    pub fn new(
        config: FlowAdapterConfig,
        vault: SecretVault,
        wallet: InMemoryWallet,
    ) -> (Self, PromptHandle) {
        let (authenticator, prompts) = PromptAuthenticator::new(vault);
        let surface =
            RecordingOverlaySurface::with_hide_delay(Duration::from_millis(config.panel_hide_ms));
        let orchestrator = TransactionWorkflowOrchestrator::new(
            SecurityGate::init(authenticator, config.gate_settings()),
            OverlayCoordinator::new(surface),
            SystemClockAdapter,
            config.gesture_config(),
        );
        let bridge = Self {
            orchestrator,
            wallet,
            config: Arc::new(config),
        };
        (bridge, prompts)
    }

    pub fn orchestrator(&self) -> &FlowOrchestrator {
        &self.orchestrator
    }

    pub fn gate(&self) -> &SecurityGate<PromptAuthenticator> {
        self.orchestrator.gate()
    }

    pub fn overlay(&self) -> &OverlayCoordinator<RecordingOverlaySurface> {
        self.orchestrator.overlay()
    }

    pub fn vault(&self) -> &SecretVault {
        self.gate().authenticator().vault()
    }

    pub fn wallet(&self) -> &InMemoryWallet {
        &self.wallet
    }

    pub fn config(&self) -> &FlowAdapterConfig {
        &self.config
    }

    pub fn request(&self, review_title: &str) -> WorkflowRequest {
        self.config.request(review_title)
    }

    /// Starts the workflow for `action`. The slot is taken before this
    /// returns; the caller drives (or spawns) the returned run.
    pub fn submit(
        &self,
        request: WorkflowRequest,
        action: WalletAction,
    ) -> Result<impl Future<Output = WorkflowOutcome> + Send + 'static, WorkflowError> {
        let builder = self.wallet.clone();
        let broadcaster = self.wallet.clone();
        self.orchestrator.execute(
            request,
            move |secret| async move { builder.build(&secret, action) },
            move |tx| async move { broadcaster.broadcast(tx) },
        )
    }
}
