use std::future::Future;

use crate::domain::{AuthenticationType, PanelContent, Secret};
use crate::errors::AuthError;

/// Result of one challenge round (one biometric prompt, one PIN entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Granted(Secret),
    Rejected,
    Cancelled,
    Unavailable(String),
}

/// The platform side of authentication: prompts, PIN pads and the keychain.
pub trait AuthenticatorPort: Send + Sync {
    /// Runs one challenge for `method`. `attempt` starts at 1.
    fn challenge(
        &self,
        method: AuthenticationType,
        attempt: u32,
    ) -> impl Future<Output = ChallengeOutcome> + Send;

    /// Reads the secret without a prompt. Only used when the configured
    /// method is `AuthenticationType::None`.
    fn read_unguarded(&self) -> Result<Secret, AuthError>;
}

/// Whatever actually draws overlays. The coordinator guarantees calls arrive
/// in a consistent order; the surface only renders.
pub trait OverlaySurface: Send + Sync {
    fn show_busy(&self, label: &str);
    fn update_busy(&self, label: &str);
    fn hide_busy(&self);
    fn mount_panel(&self, panel: &PanelContent);
    /// Resolves once the hide animation has finished.
    fn unmount_panel(&self) -> impl Future<Output = ()> + Send;
    /// Removes the panel at once, without the hide animation.
    fn discard_panel(&self);
}

pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> u64;
}
