use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::domain::{
    BroadcastReceipt, BuiltTransaction, InvocationId, PanelContent, PendingTransaction, Secret,
    TimestampMs, WorkflowRequest,
};
use crate::errors::{AuthError, BroadcastError, BuildError, StageError, WorkflowError};
use crate::gesture::{DragEndOutcome, GestureConfig, GestureState, SwipeConfirmGesture};
use crate::overlay::OverlayCoordinator;
use crate::ports::{AuthenticatorPort, ClockPort, OverlaySurface};
use crate::security::SecurityGate;
use crate::state_machine::{workflow_transition, FailedStage, WorkflowAction, WorkflowStage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Succeeded {
        invocation: InvocationId,
        receipt: BroadcastReceipt,
    },
    Failed {
        invocation: InvocationId,
        stage: FailedStage,
        error: StageError,
    },
    /// Cancelled by the user or superseded. Not an error.
    Aborted { invocation: InvocationId },
}

impl WorkflowOutcome {
    pub fn invocation(&self) -> InvocationId {
        match self {
            WorkflowOutcome::Succeeded { invocation, .. }
            | WorkflowOutcome::Failed { invocation, .. }
            | WorkflowOutcome::Aborted { invocation } => *invocation,
        }
    }
}

/// Transition records kept in memory; older ones are dropped first.
pub const HISTORY_LIMIT: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub seq: u64,
    pub invocation: InvocationId,
    pub from: WorkflowStage,
    pub to: WorkflowStage,
    pub reason: &'static str,
    pub at_ms: TimestampMs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Pending,
    Confirmed,
    Cancelled,
}

struct LiveInvocation {
    signal: watch::Sender<Signal>,
    gesture: Option<SwipeConfirmGesture>,
    built_at_ms: Option<TimestampMs>,
}

struct WorkflowTable {
    stage: WorkflowStage,
    next_id: u64,
    live: HashMap<InvocationId, LiveInvocation>,
    history: VecDeque<TransitionRecord>,
}

impl WorkflowTable {
    fn active(&self) -> Option<InvocationId> {
        self.live.keys().next().copied()
    }

    fn apply(
        &mut self,
        invocation: InvocationId,
        action: WorkflowAction,
        now: TimestampMs,
    ) -> Result<WorkflowStage, WorkflowError> {
        let (to, transition) = workflow_transition(self.stage, action)?;
        self.stage = to;
        let seq = self.history.back().map(|r| r.seq + 1).unwrap_or(1);
        tracing::info!(
            %invocation,
            from = ?transition.from,
            to = ?transition.to,
            reason = transition.reason,
            "workflow transition"
        );
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            seq,
            invocation,
            from: transition.from,
            to: transition.to,
            reason: transition.reason,
            at_ms: now,
        });
        Ok(to)
    }
}

/// Runs authenticate → build → confirm → broadcast for one action at a time.
///
/// Gesture input and cancellation arrive through the handle while `execute`'s
/// future is suspended; both are matched against the live invocation id, so a
/// late event from an older run can never act on a newer one.
pub struct TransactionWorkflowOrchestrator<A, S, C> {
    inner: Arc<OrchestratorInner<A, S, C>>,
}

impl<A, S, C> Clone for TransactionWorkflowOrchestrator<A, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct OrchestratorInner<A, S, C> {
    gate: SecurityGate<A>,
    overlay: OverlayCoordinator<S>,
    clock: C,
    gesture_config: GestureConfig,
    table: Mutex<WorkflowTable>,
}

impl<A, S, C> TransactionWorkflowOrchestrator<A, S, C>
where
    A: AuthenticatorPort,
    S: OverlaySurface,
    C: ClockPort,
{
    pub fn new(
        gate: SecurityGate<A>,
        overlay: OverlayCoordinator<S>,
        clock: C,
        gesture_config: GestureConfig,
    ) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                gate,
                overlay,
                clock,
                gesture_config,
                table: Mutex::new(WorkflowTable {
                    stage: WorkflowStage::Idle,
                    next_id: 0,
                    live: HashMap::new(),
                    history: VecDeque::with_capacity(HISTORY_LIMIT),
                }),
            }),
        }
    }

    pub fn gate(&self) -> &SecurityGate<A> {
        &self.inner.gate
    }

    pub fn overlay(&self) -> &OverlayCoordinator<S> {
        &self.inner.overlay
    }

    pub fn stage(&self) -> WorkflowStage {
        self.table().stage
    }

    pub fn active_invocation(&self) -> Option<InvocationId> {
        self.table().active()
    }

    /// The most recent transitions, oldest first, at most `HISTORY_LIMIT`.
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.table().history.iter().cloned().collect()
    }

    /// Reserves the single flight slot and returns the run. The reservation
    /// happens here, synchronously: a second call before the first run has
    /// finished fails with `AlreadyInProgress` and does not disturb it.
    /// Dropping the returned future releases the slot.
    pub fn execute<P, B, BFut, X, XFut>(
        &self,
        request: WorkflowRequest,
        build: B,
        broadcast: X,
    ) -> Result<impl Future<Output = WorkflowOutcome> + Send, WorkflowError>
    where
        P: Send,
        B: FnOnce(Secret) -> BFut + Send,
        BFut: Future<Output = Result<BuiltTransaction<P>, BuildError>> + Send,
        X: FnOnce(P) -> XFut + Send,
        XFut: Future<Output = Result<BroadcastReceipt, BroadcastError>> + Send,
    {
        let (invocation, signal) = self.begin()?;
        let guard = FlightGuard {
            inner: Arc::clone(&self.inner),
            invocation,
        };
        let this = self.clone();
        Ok(async move {
            let outcome = this.run(invocation, signal, request, build, broadcast).await;
            drop(guard);
            outcome
        })
    }

    /// Feeds a drag delta to the review panel's gesture. Returns `None` when
    /// `invocation` is not the run currently awaiting confirmation.
    pub fn drag_update(&self, invocation: InvocationId, delta_x: f64) -> Option<GestureState> {
        let mut table = self.table();
        if table.stage != WorkflowStage::AwaitingConfirm {
            return None;
        }
        let gesture = table.live.get_mut(&invocation)?.gesture.as_mut()?;
        gesture.on_drag_update(delta_x);
        Some(gesture.state())
    }

    pub fn drag_end(&self, invocation: InvocationId) -> Option<DragEndOutcome> {
        let now = self.now();
        let mut table = self.table();
        if table.stage != WorkflowStage::AwaitingConfirm {
            tracing::debug!(%invocation, stage = ?table.stage, "drag end ignored");
            return None;
        }
        let outcome = table
            .live
            .get_mut(&invocation)?
            .gesture
            .as_mut()?
            .on_drag_end();
        if outcome == DragEndOutcome::Confirmed {
            Self::commit_confirm(&mut table, invocation, now);
        }
        Some(outcome)
    }

    pub fn gesture_state(&self, invocation: InvocationId) -> Option<GestureState> {
        let table = self.table();
        table
            .live
            .get(&invocation)?
            .gesture
            .as_ref()
            .map(SwipeConfirmGesture::state)
    }

    /// When the payload under review was built; `None` before the review.
    pub fn built_at(&self, invocation: InvocationId) -> Option<TimestampMs> {
        self.table().live.get(&invocation)?.built_at_ms
    }

    pub fn reset_gesture(&self, invocation: InvocationId) -> bool {
        let mut table = self.table();
        match table
            .live
            .get_mut(&invocation)
            .and_then(|live| live.gesture.as_mut())
        {
            Some(gesture) => {
                gesture.reset();
                true
            }
            None => false,
        }
    }

    /// Delivers a confirm event for `invocation`. Ignored unless that exact
    /// invocation is live and awaiting confirmation.
    pub fn confirm(&self, invocation: InvocationId) -> bool {
        let now = self.now();
        let mut table = self.table();
        Self::commit_confirm(&mut table, invocation, now)
    }

    /// Cancels whatever run is live, if it is at a cancellable stage, and
    /// clears its overlays.
    pub async fn cancel(&self) -> bool {
        let active = self.table().active();
        match active {
            Some(invocation) => self.cancel_invocation(invocation).await,
            None => false,
        }
    }

    pub async fn cancel_invocation(&self, invocation: InvocationId) -> bool {
        let now = self.now();
        let cancelled = {
            let mut table = self.table();
            if !table.live.contains_key(&invocation) {
                false
            } else {
                match table.apply(invocation, WorkflowAction::Cancel, now) {
                    Ok(_) => {
                        if let Some(live) = table.live.remove(&invocation) {
                            live.signal.send_replace(Signal::Cancelled);
                        }
                        true
                    }
                    Err(err) => {
                        tracing::debug!(%invocation, %err, "cancel ignored");
                        false
                    }
                }
            }
        };
        if cancelled {
            self.inner.overlay.hide_busy();
            self.inner.overlay.dismiss_panel().await;
        }
        cancelled
    }

    fn begin(&self) -> Result<(InvocationId, watch::Receiver<Signal>), WorkflowError> {
        let now = self.now();
        let mut table = self.table();
        if let Some(active) = table.active() {
            tracing::warn!(%active, "execute rejected: workflow already in progress");
            return Err(WorkflowError::AlreadyInProgress { active });
        }
        table.next_id += 1;
        let invocation = InvocationId(table.next_id);
        table.apply(invocation, WorkflowAction::Start, now)?;
        let (signal, receiver) = watch::channel(Signal::Pending);
        table.live.insert(
            invocation,
            LiveInvocation {
                signal,
                gesture: None,
                built_at_ms: None,
            },
        );
        Ok((invocation, receiver))
    }

    async fn run<P, B, BFut, X, XFut>(
        &self,
        invocation: InvocationId,
        mut signal: watch::Receiver<Signal>,
        request: WorkflowRequest,
        build: B,
        broadcast: X,
    ) -> WorkflowOutcome
    where
        B: FnOnce(Secret) -> BFut,
        BFut: Future<Output = Result<BuiltTransaction<P>, BuildError>>,
        X: FnOnce(P) -> XFut,
        XFut: Future<Output = Result<BroadcastReceipt, BroadcastError>>,
    {
        let auth = tokio::select! {
            biased;
            _ = wait_cancelled(&mut signal) => return WorkflowOutcome::Aborted { invocation },
            result = self.inner.gate.authenticate() => result,
        };
        let secret = match auth {
            Ok(secret) => secret,
            Err(AuthError::Cancelled) => {
                if self.advance(invocation, WorkflowAction::AuthCancelled).is_ok() {
                    self.retire(invocation);
                }
                return WorkflowOutcome::Aborted { invocation };
            }
            Err(err) => {
                return self
                    .fail(invocation, FailedStage::Authenticating, err.into(), &request)
                    .await
            }
        };

        if self.advance(invocation, WorkflowAction::Authenticated).is_err() {
            return WorkflowOutcome::Aborted { invocation };
        }
        self.inner.overlay.show_busy(&request.building_label);
        let built = tokio::select! {
            biased;
            _ = wait_cancelled(&mut signal) => return WorkflowOutcome::Aborted { invocation },
            result = build(secret) => result,
        };
        let built = match built {
            Ok(built) => built,
            Err(err) => {
                return self
                    .fail(invocation, FailedStage::Building, err.into(), &request)
                    .await
            }
        };

        let Some(built_at_ms) = self.enter_review(invocation) else {
            return WorkflowOutcome::Aborted { invocation };
        };
        let pending = PendingTransaction {
            invocation,
            payload: built.payload,
            fee: built.fee,
            summary: request.rows.clone(),
            built_at_ms,
        };
        self.inner.overlay.hide_busy();
        self.inner
            .overlay
            .present_panel(PanelContent::Review {
                invocation,
                title: request.review_title.clone(),
                rows: pending.summary.clone(),
                fee: pending.fee.display_with(&request.ticker),
                swipe_title: request.swipe_title.clone(),
            })
            .await;

        if wait_decision(&mut signal).await != Signal::Confirmed
            || !self.is_live_at(invocation, WorkflowStage::Broadcasting)
        {
            return WorkflowOutcome::Aborted { invocation };
        }

        // Busy and panel are never on screen together.
        self.inner.overlay.dismiss_panel().await;
        self.inner.overlay.show_busy(&request.broadcasting_label);
        tracing::info!(%invocation, built_at_ms = pending.built_at_ms.0, "broadcasting");
        match broadcast(pending.payload).await {
            Ok(receipt) => {
                if self.advance(invocation, WorkflowAction::Broadcasted).is_err() {
                    return WorkflowOutcome::Aborted { invocation };
                }
                self.inner.overlay.hide_busy();
                if let Some(panel) = receipt.follow_up.clone() {
                    self.inner.overlay.present_panel(panel).await;
                }
                self.retire(invocation);
                WorkflowOutcome::Succeeded {
                    invocation,
                    receipt,
                }
            }
            Err(err) => {
                self.fail(invocation, FailedStage::Broadcasting, err.into(), &request)
                    .await
            }
        }
    }

    async fn fail(
        &self,
        invocation: InvocationId,
        stage: FailedStage,
        error: StageError,
        request: &WorkflowRequest,
    ) -> WorkflowOutcome {
        let action = match stage {
            FailedStage::Authenticating => WorkflowAction::AuthFailed,
            FailedStage::Building => WorkflowAction::BuildFailed,
            FailedStage::Broadcasting => WorkflowAction::BroadcastFailed,
        };
        if self.advance(invocation, action).is_err() {
            return WorkflowOutcome::Aborted { invocation };
        }
        tracing::warn!(%invocation, ?stage, %error, "workflow failed");
        let heading = match stage {
            FailedStage::Broadcasting => &request.failure_heading,
            FailedStage::Authenticating | FailedStage::Building => &request.build_failure_heading,
        };
        self.inner.overlay.hide_busy();
        self.inner
            .overlay
            .present_panel(PanelContent::Error {
                heading: heading.clone(),
                message: error.to_string(),
            })
            .await;
        self.retire(invocation);
        WorkflowOutcome::Failed {
            invocation,
            stage,
            error,
        }
    }

    fn advance(
        &self,
        invocation: InvocationId,
        action: WorkflowAction,
    ) -> Result<WorkflowStage, WorkflowError> {
        let now = self.now();
        let mut table = self.table();
        if !table.live.contains_key(&invocation) {
            return Err(WorkflowError::StaleInvocation(invocation));
        }
        table.apply(invocation, action, now)
    }

    /// Moves to `AwaitingConfirm` and mounts a fresh gesture. The gesture only
    /// exists from this point on, so nothing can confirm a payload before it
    /// was built.
    fn enter_review(&self, invocation: InvocationId) -> Option<TimestampMs> {
        let now = self.now();
        let gesture = match SwipeConfirmGesture::new(self.inner.gesture_config) {
            Ok(gesture) => gesture,
            Err(err) => {
                tracing::warn!(%err, "invalid gesture config, using defaults");
                SwipeConfirmGesture::new(GestureConfig::default()).ok()?
            }
        };
        let mut table = self.table();
        if !table.live.contains_key(&invocation) {
            return None;
        }
        table.apply(invocation, WorkflowAction::Built, now).ok()?;
        let live = table.live.get_mut(&invocation)?;
        live.gesture = Some(gesture);
        live.built_at_ms = Some(now);
        Some(now)
    }

    fn commit_confirm(table: &mut WorkflowTable, invocation: InvocationId, now: TimestampMs) -> bool {
        if !table.live.contains_key(&invocation) || table.stage != WorkflowStage::AwaitingConfirm {
            tracing::debug!(%invocation, stage = ?table.stage, "stale confirm ignored");
            return false;
        }
        if table.apply(invocation, WorkflowAction::Confirmed, now).is_err() {
            return false;
        }
        if let Some(live) = table.live.get_mut(&invocation) {
            live.gesture = None;
            live.signal.send_replace(Signal::Confirmed);
        }
        true
    }

    fn is_live_at(&self, invocation: InvocationId, stage: WorkflowStage) -> bool {
        let table = self.table();
        table.stage == stage && table.live.contains_key(&invocation)
    }

    fn retire(&self, invocation: InvocationId) {
        self.table().live.remove(&invocation);
    }

    fn now(&self) -> TimestampMs {
        TimestampMs(self.inner.clock.now_ms())
    }

    fn table(&self) -> MutexGuard<'_, WorkflowTable> {
        self.inner
            .table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Frees the flight slot and clears the run's overlays if the run future is
/// dropped before it finishes.
struct FlightGuard<A, S: OverlaySurface, C: ClockPort> {
    inner: Arc<OrchestratorInner<A, S, C>>,
    invocation: InvocationId,
}

impl<A, S: OverlaySurface, C: ClockPort> Drop for FlightGuard<A, S, C> {
    fn drop(&mut self) {
        let now = TimestampMs(self.inner.clock.now_ms());
        let abandoned = {
            let mut table = self
                .inner
                .table
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let abandoned = table.live.remove(&self.invocation).is_some();
            if abandoned {
                tracing::warn!(invocation = %self.invocation, "workflow dropped while in flight");
                let _ = table.apply(self.invocation, WorkflowAction::Abandon, now);
            }
            abandoned
        };
        if abandoned {
            self.inner.overlay.retire_now();
        }
    }
}

async fn wait_cancelled(signal: &mut watch::Receiver<Signal>) {
    loop {
        if *signal.borrow_and_update() == Signal::Cancelled {
            return;
        }
        if signal.changed().await.is_err() {
            return;
        }
    }
}

async fn wait_decision(signal: &mut watch::Receiver<Signal>) -> Signal {
    loop {
        let current = *signal.borrow_and_update();
        if current != Signal::Pending {
            return current;
        }
        if signal.changed().await.is_err() {
            return match *signal.borrow() {
                Signal::Pending => Signal::Cancelled,
                decided => decided,
            };
        }
    }
}
