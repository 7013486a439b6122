#![allow(dead_code)]

use wallet_flow_adapters::{
    FlowAdapterConfig, InMemoryWallet, KdfParams, PromptAuthenticator, PromptHandle,
    PromptResponse, RecordingOverlaySurface, SecretVault, SystemClockAdapter,
};
use wallet_flow_core::{
    Amount, AuthenticationType, OverlayCoordinator, PanelContent, Secret, SecurityGate,
    TransactionWorkflowOrchestrator, WorkflowStage,
};

pub const PIN: &str = "482910";

pub fn cheap_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        pbkdf2_rounds: 10,
    }
}

pub fn spending_secret() -> Secret {
    Secret::new("legal winner thank year wave sausage worth useful legal winner thank yellow")
}

pub fn sealed_vault(method: AuthenticationType, pin: Option<&str>) -> SecretVault {
    let vault = SecretVault::with_device_key(cheap_kdf(), [0x5a; 32]);
    vault
        .seal(&spending_secret(), method, pin)
        .expect("seal spending secret");
    vault
}

pub type AdapterOrchestrator =
    TransactionWorkflowOrchestrator<PromptAuthenticator, RecordingOverlaySurface, SystemClockAdapter>;

pub struct Wallet {
    pub orch: AdapterOrchestrator,
    pub prompts: PromptHandle,
    pub surface: RecordingOverlaySurface,
    pub engine: InMemoryWallet,
    pub config: FlowAdapterConfig,
}

/// A PIN-6 wallet holding 5 coins with the default network fee.
pub fn wallet() -> Wallet {
    let config = FlowAdapterConfig {
        authentication_type: AuthenticationType::ManualPin6,
        ..FlowAdapterConfig::default()
    };
    let vault = sealed_vault(AuthenticationType::ManualPin6, Some(PIN));
    let (authenticator, prompts) = PromptAuthenticator::new(vault);
    let surface = RecordingOverlaySurface::default();
    let orch = TransactionWorkflowOrchestrator::new(
        SecurityGate::init(authenticator, config.gate_settings()),
        OverlayCoordinator::new(surface.clone()),
        SystemClockAdapter,
        config.gesture_config(),
    );
    let engine = InMemoryWallet::new(
        spending_secret(),
        Amount::from_units(5 * 100_000_000),
        config.network_fee(),
    );
    Wallet {
        orch,
        prompts,
        surface,
        engine,
        config,
    }
}

/// Answers the next prompt with `response`.
pub async fn answer(prompts: &mut PromptHandle, response: PromptResponse) {
    let request = prompts.next().await.expect("prompt requested");
    request.respond(response);
}

pub async fn wait_for_review(orch: &AdapterOrchestrator) -> wallet_flow_core::InvocationId {
    for _ in 0..10_000 {
        if orch.stage() == WorkflowStage::AwaitingConfirm {
            if let Some(PanelContent::Review { invocation, .. }) = orch.overlay().active_panel() {
                return invocation;
            }
        }
        tokio::task::yield_now().await;
    }
    panic!("review never presented, stuck at {:?}", orch.stage());
}

/// Drags the thumb across the whole track and releases.
pub fn swipe_through(orch: &AdapterOrchestrator, invocation: wallet_flow_core::InvocationId) {
    let track = orch.gesture_state(invocation).expect("gesture mounted").threshold;
    orch.drag_update(invocation, track / 2.0).expect("first half");
    orch.drag_update(invocation, track).expect("second half");
    orch.drag_end(invocation).expect("release");
}
