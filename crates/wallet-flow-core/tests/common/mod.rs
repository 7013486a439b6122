#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use wallet_flow_core::{
    Amount, AuthError, AuthenticationType, AuthenticatorPort, BroadcastError, BroadcastReceipt,
    BuildError, BuiltTransaction, ChallengeOutcome, ClockPort, GateSettings, GestureConfig,
    InvocationId, OverlayCoordinator, OverlaySurface, PanelContent, Secret, SecurityGate,
    TransactionWorkflowOrchestrator, WorkflowStage,
};

#[derive(Debug, Clone)]
pub enum Step {
    Outcome(ChallengeOutcome),
    Hang,
}

/// Plays back a fixed script of challenge results; grants once it runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAuthenticator {
    script: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedAuthenticator {
    pub fn with_script(steps: Vec<Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into())),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthenticatorPort for ScriptedAuthenticator {
    fn challenge(
        &self,
        _method: AuthenticationType,
        _attempt: u32,
    ) -> impl Future<Output = ChallengeOutcome> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Step::Outcome(ChallengeOutcome::Granted(spending_secret())));
        async move {
            match step {
                Step::Outcome(outcome) => outcome,
                Step::Hang => std::future::pending().await,
            }
        }
    }

    fn read_unguarded(&self) -> Result<Secret, AuthError> {
        Ok(spending_secret())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    ShowBusy(String),
    UpdateBusy(String),
    HideBusy,
    Mount(PanelContent),
    Unmount,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().expect("events lock").clone()
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl OverlaySurface for RecordingSurface {
    fn show_busy(&self, label: &str) {
        self.push(SurfaceEvent::ShowBusy(label.to_owned()));
    }

    fn update_busy(&self, label: &str) {
        self.push(SurfaceEvent::UpdateBusy(label.to_owned()));
    }

    fn hide_busy(&self) {
        self.push(SurfaceEvent::HideBusy);
    }

    fn mount_panel(&self, panel: &PanelContent) {
        self.push(SurfaceEvent::Mount(panel.clone()));
    }

    fn unmount_panel(&self) -> impl Future<Output = ()> + Send {
        let events = Arc::clone(&self.events);
        async move {
            // A few scheduler turns stand in for the hide animation.
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            events.lock().expect("events lock").push(SurfaceEvent::Unmount);
        }
    }

    fn discard_panel(&self) {
        self.push(SurfaceEvent::Unmount);
    }
}

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> u64 {
        self.now.fetch_add(1, Ordering::SeqCst) + 1_739_750_400_000
    }
}

pub type TestOrchestrator =
    TransactionWorkflowOrchestrator<ScriptedAuthenticator, RecordingSurface, TestClock>;

pub struct Harness {
    pub orch: TestOrchestrator,
    pub auth: ScriptedAuthenticator,
    pub surface: RecordingSurface,
}

pub fn harness(steps: Vec<Step>) -> Harness {
    let auth = ScriptedAuthenticator::with_script(steps);
    let surface = RecordingSurface::default();
    let gate = SecurityGate::init(auth.clone(), GateSettings::default());
    let overlay = OverlayCoordinator::new(surface.clone());
    let orch = TransactionWorkflowOrchestrator::new(
        gate,
        overlay,
        TestClock::default(),
        GestureConfig::default(),
    );
    Harness {
        orch,
        auth,
        surface,
    }
}

pub fn spending_secret() -> Secret {
    Secret::new("correct horse battery staple")
}

pub async fn wait_for_stage(orch: &TestOrchestrator, stage: WorkflowStage) {
    for _ in 0..1_000 {
        if orch.stage() == stage {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("stage {stage:?} never reached, stuck at {:?}", orch.stage());
}

/// Waits until the review panel for the live run is on screen.
pub async fn wait_for_review(orch: &TestOrchestrator) -> InvocationId {
    for _ in 0..1_000 {
        if orch.stage() == WorkflowStage::AwaitingConfirm {
            if let Some(PanelContent::Review { invocation, .. }) = orch.overlay().active_panel() {
                return invocation;
            }
        }
        tokio::task::yield_now().await;
    }
    panic!("review never presented, stuck at {:?}", orch.stage());
}

pub async fn build_unit(_secret: Secret) -> Result<BuiltTransaction<()>, BuildError> {
    Ok(BuiltTransaction {
        payload: (),
        fee: Amount(1000),
    })
}

pub async fn broadcast_ok(_payload: ()) -> Result<BroadcastReceipt, BroadcastError> {
    Ok(BroadcastReceipt::default())
}

/// Replays surface calls and checks a panel is never mounted while the busy
/// indicator is up, or the other way round.
pub fn assert_overlays_exclusive(events: &[SurfaceEvent]) {
    let (mut busy, mut panel) = (false, false);
    for (i, event) in events.iter().enumerate() {
        match event {
            SurfaceEvent::ShowBusy(_) | SurfaceEvent::UpdateBusy(_) => busy = true,
            SurfaceEvent::HideBusy => busy = false,
            SurfaceEvent::Mount(_) => panel = true,
            SurfaceEvent::Unmount => panel = false,
        }
        assert!(!(busy && panel), "busy and panel overlap at event {i}: {events:?}");
    }
}
