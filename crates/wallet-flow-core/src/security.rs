//! Process-wide lock state and the gate in front of the spending secret.
//!
//! The gate is a cheap `Clone` handle: every screen holds one, all of them
//! observe the same `LockState`, and only the gate's own operations write it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::domain::{AuthenticationType, LockState, Secret};
use crate::errors::AuthError;
use crate::ports::{AuthenticatorPort, ChallengeOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSettings {
    pub authentication_type: AuthenticationType,
    pub lock_after_background: bool,
    pub max_attempts: u32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            authentication_type: AuthenticationType::ManualPin6,
            lock_after_background: true,
            max_attempts: 3,
        }
    }
}

pub struct SecurityGate<A> {
    inner: Arc<GateInner<A>>,
}

impl<A> Clone for SecurityGate<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct GateInner<A> {
    authenticator: A,
    state: watch::Sender<LockState>,
    lock_after_background: AtomicBool,
    max_attempts: u32,
}

impl<A> SecurityGate<A>
where
    A: AuthenticatorPort,
{
    /// Starts locked unless the configured method is `None`.
    pub fn init(authenticator: A, settings: GateSettings) -> Self {
        let initial = LockState {
            is_locked: settings.authentication_type.is_gated(),
            authentication_type: settings.authentication_type,
        };
        let (state, _) = watch::channel(initial);
        tracing::debug!(
            method = ?settings.authentication_type,
            locked = initial.is_locked,
            "security gate initialised"
        );
        Self {
            inner: Arc::new(GateInner {
                authenticator,
                state,
                lock_after_background: AtomicBool::new(settings.lock_after_background),
                max_attempts: settings.max_attempts.max(1),
            }),
        }
    }

    pub fn authenticator(&self) -> &A {
        &self.inner.authenticator
    }

    pub fn lock_state(&self) -> LockState {
        *self.inner.state.borrow()
    }

    pub fn is_locked(&self) -> bool {
        self.lock_state().is_locked
    }

    /// Receiver for screens that render the lock overlay reactively.
    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.inner.state.subscribe()
    }

    /// Runs the configured challenge until it is granted, cancelled, or the
    /// attempt budget is spent. Only a granted challenge clears the lock; if
    /// the returned future is dropped mid-challenge the state is untouched.
    pub async fn authenticate(&self) -> Result<Secret, AuthError> {
        let method = self.lock_state().authentication_type;
        if !method.is_gated() {
            return self.inner.authenticator.read_unguarded();
        }

        let max_attempts = self.inner.max_attempts;
        for attempt in 1..=max_attempts {
            match self.inner.authenticator.challenge(method, attempt).await {
                ChallengeOutcome::Granted(secret) => {
                    self.inner.state.send_modify(|s| s.is_locked = false);
                    tracing::info!(?method, attempt, "authentication granted");
                    return Ok(secret);
                }
                ChallengeOutcome::Rejected => {
                    tracing::warn!(?method, attempt, max_attempts, "authentication rejected");
                }
                ChallengeOutcome::Cancelled => {
                    tracing::info!(?method, attempt, "authentication cancelled");
                    return Err(AuthError::Cancelled);
                }
                ChallengeOutcome::Unavailable(reason) => {
                    tracing::warn!(?method, %reason, "authenticator unavailable");
                    return Err(AuthError::Unavailable(reason));
                }
            }
        }
        Err(AuthError::Failed {
            attempts: max_attempts,
        })
    }

    /// Locks the wallet. A no-op when the method is `None`, which never locks.
    pub fn lock(&self) {
        self.inner.state.send_if_modified(|s| {
            if !s.authentication_type.is_gated() || s.is_locked {
                return false;
            }
            s.is_locked = true;
            true
        });
    }

    /// Switches the challenge method. Callers are expected to authenticate
    /// with the old method first; the gate does not enforce that.
    pub fn set_authentication_type(&self, method: AuthenticationType) {
        self.inner.state.send_modify(|s| {
            s.authentication_type = method;
            if !method.is_gated() {
                s.is_locked = false;
            }
        });
        tracing::info!(?method, "authentication method changed");
    }

    pub fn lock_after_background(&self) -> bool {
        self.inner.lock_after_background.load(Ordering::SeqCst)
    }

    pub fn set_lock_after_background(&self, enabled: bool) {
        self.inner
            .lock_after_background
            .store(enabled, Ordering::SeqCst);
    }

    pub fn on_background(&self) {
        if self.lock_after_background() {
            self.lock();
        }
    }

    /// Returns whether the foregrounded app must show the lock screen.
    pub fn on_foreground(&self) -> bool {
        let locked = self.is_locked();
        tracing::debug!(locked, "app foregrounded");
        locked
    }

    pub fn teardown(&self) {
        self.lock();
    }
}
