//! Authenticator that asks a prompt surface (PIN pad, biometric sheet) for
//! each challenge and opens the vault with the answer.

use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use wallet_flow_core::{AuthError, AuthenticationType, AuthenticatorPort, ChallengeOutcome, Secret};

use crate::vault::{SecretVault, VaultError};

#[derive(Debug)]
pub struct PromptRequest {
    pub method: AuthenticationType,
    pub attempt: u32,
    reply: oneshot::Sender<PromptResponse>,
}

impl PromptRequest {
    /// Answers the prompt. Dropping the request unanswered counts as cancel.
    pub fn respond(self, response: PromptResponse) {
        if self.reply.send(response).is_err() {
            tracing::debug!(method = ?self.method, "prompt answered after challenge ended");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    Pin(String),
    /// Biometric match or device passcode accepted by the platform.
    Approve,
    /// Biometric mismatch; counts as a rejected attempt.
    Deny,
    Cancel,
}

/// The UI end of the prompt channel.
#[derive(Debug)]
pub struct PromptHandle {
    requests: mpsc::Receiver<PromptRequest>,
}

impl PromptHandle {
    pub async fn next(&mut self) -> Option<PromptRequest> {
        self.requests.recv().await
    }

    pub fn try_next(&mut self) -> Option<PromptRequest> {
        self.requests.try_recv().ok()
    }
}

#[derive(Debug, Clone)]
pub struct PromptAuthenticator {
    vault: SecretVault,
    requests: mpsc::Sender<PromptRequest>,
}

impl PromptAuthenticator {
    pub fn new(vault: SecretVault) -> (Self, PromptHandle) {
        let (requests, rx) = mpsc::channel(4);
        (Self { vault, requests }, PromptHandle { requests: rx })
    }

    pub fn vault(&self) -> &SecretVault {
        &self.vault
    }
}

impl AuthenticatorPort for PromptAuthenticator {
    fn challenge(
        &self,
        method: AuthenticationType,
        attempt: u32,
    ) -> impl Future<Output = ChallengeOutcome> + Send {
        let vault = self.vault.clone();
        let requests = self.requests.clone();
        async move {
            match vault.method() {
                None => return ChallengeOutcome::Unavailable("wallet has no sealed secret".into()),
                Some(sealed) if sealed != method => {
                    return ChallengeOutcome::Unavailable(
                        VaultError::MethodMismatch {
                            sealed,
                            requested: method,
                        }
                        .to_string(),
                    );
                }
                Some(_) => {}
            }

            let (reply, answer) = oneshot::channel();
            let request = PromptRequest {
                method,
                attempt,
                reply,
            };
            if requests.send(request).await.is_err() {
                return ChallengeOutcome::Unavailable("no prompt surface attached".into());
            }
            let Ok(response) = answer.await else {
                return ChallengeOutcome::Cancelled;
            };

            let pin = match (response, method.pin_length()) {
                (PromptResponse::Cancel, _) => return ChallengeOutcome::Cancelled,
                (PromptResponse::Deny, _) => return ChallengeOutcome::Rejected,
                (PromptResponse::Pin(pin), Some(_)) => Some(pin),
                (PromptResponse::Approve, None) => None,
                _ => {
                    tracing::warn!(?method, attempt, "prompt answer does not fit method");
                    return ChallengeOutcome::Rejected;
                }
            };
            // Key derivation runs on the blocking pool.
            let opened = tokio::task::spawn_blocking(move || match pin {
                Some(pin) => vault.unseal_with_pin(&pin),
                None => vault.unseal_device(),
            })
            .await;
            match opened {
                Ok(Ok(secret)) => ChallengeOutcome::Granted(secret),
                Ok(Err(VaultError::WrongCredential | VaultError::PinFormat { .. })) => {
                    ChallengeOutcome::Rejected
                }
                Ok(Err(e)) => ChallengeOutcome::Unavailable(e.to_string()),
                Err(e) => {
                    tracing::warn!(?method, attempt, error = %e, "unseal task failed");
                    ChallengeOutcome::Unavailable(format!("unseal task failed: {e}"))
                }
            }
        }
    }

    fn read_unguarded(&self) -> Result<Secret, AuthError> {
        self.vault
            .unseal_device()
            .map_err(|e| AuthError::Unavailable(e.to_string()))
    }
}
