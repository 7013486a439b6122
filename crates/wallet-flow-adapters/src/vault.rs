//! Sealed storage for the spending secret.
//!
//! PIN methods seal under a key derived from the PIN. Device-backed methods
//! (and `None`) seal under a device key standing in for the platform
//! keychain. Envelopes are encrypt-then-MAC, so a wrong PIN is detected
//! before decryption is attempted.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wallet_flow_core::{AuthenticationType, Secret};

use crate::crypto::{
    decrypt_aes_gcm, derive_keys, encrypt_aes_gcm, generate_nonce, generate_salt, hmac_sha256,
    random_bytes, verify_hmac_sha256, CryptoError, KdfAlgorithm, KdfParams,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("no secret has been sealed")]
    Empty,
    #[error("PIN must be exactly {expected} digits")]
    PinFormat { expected: usize },
    #[error("{method:?} does not use a PIN")]
    PinNotApplicable { method: AuthenticationType },
    #[error("secret is sealed for {sealed:?}, not {requested:?}")]
    MethodMismatch {
        sealed: AuthenticationType,
        requested: AuthenticationType,
    },
    #[error("wrong credential")]
    WrongCredential,
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Persistable envelope. Byte fields are base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    pub method: AuthenticationType,
    pub kdf_algorithm: KdfAlgorithm,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
    pub mac: String,
}

/// PIN methods accept exactly their length in ASCII digits.
pub fn validate_pin(method: AuthenticationType, pin: &str) -> Result<(), VaultError> {
    let expected = method
        .pin_length()
        .ok_or(VaultError::PinNotApplicable { method })?;
    if pin.len() != expected || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VaultError::PinFormat { expected });
    }
    Ok(())
}

#[derive(Clone)]
pub struct SecretVault {
    inner: Arc<VaultInner>,
}

struct VaultInner {
    params: KdfParams,
    device_key: [u8; 32],
    sealed: Mutex<Option<SealedSecret>>,
}

impl fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretVault")
            .field("params", &self.inner.params)
            .field("method", &self.method())
            .finish_non_exhaustive()
    }
}

impl SecretVault {
    /// Empty vault with a fresh random device key.
    pub fn new(params: KdfParams) -> Result<Self, VaultError> {
        Ok(Self::with_device_key(params, random_bytes::<32>()?))
    }

    pub fn with_device_key(params: KdfParams, device_key: [u8; 32]) -> Self {
        Self {
            inner: Arc::new(VaultInner {
                params,
                device_key,
                sealed: Mutex::new(None),
            }),
        }
    }

    pub fn restore(&self, sealed: SealedSecret) {
        *self.slot() = Some(sealed);
    }

    pub fn sealed(&self) -> Option<SealedSecret> {
        self.slot().clone()
    }

    pub fn method(&self) -> Option<AuthenticationType> {
        self.slot().as_ref().map(|s| s.method)
    }

    /// Seals `secret` for `method`, replacing whatever was sealed before.
    /// Changing the PIN or the method is a reseal with the unlocked secret.
    pub fn seal(
        &self,
        secret: &Secret,
        method: AuthenticationType,
        pin: Option<&str>,
    ) -> Result<(), VaultError> {
        let credential = match (method.pin_length(), pin) {
            (Some(expected), None) => return Err(VaultError::PinFormat { expected }),
            (Some(_), Some(pin)) => {
                validate_pin(method, pin)?;
                pin.as_bytes()
            }
            (None, _) => &self.inner.device_key[..],
        };

        let salt = generate_salt()?;
        let nonce = generate_nonce()?;
        let keys = derive_keys(credential, salt, &self.inner.params, None)?;
        let ciphertext = encrypt_aes_gcm(&keys.enc_key, nonce, secret.expose().as_bytes())?;
        let tag = hmac_sha256(
            &keys.mac_key,
            &[method_tag(method), &salt, &nonce, &ciphertext],
        )?;

        *self.slot() = Some(SealedSecret {
            method,
            kdf_algorithm: keys.kdf_algorithm,
            salt: URL_SAFE_NO_PAD.encode(salt),
            nonce: URL_SAFE_NO_PAD.encode(nonce),
            ciphertext: URL_SAFE_NO_PAD.encode(&ciphertext),
            mac: URL_SAFE_NO_PAD.encode(tag),
        });
        tracing::info!(?method, kdf = ?keys.kdf_algorithm, "spending secret sealed");
        Ok(())
    }

    pub fn unseal_with_pin(&self, pin: &str) -> Result<Secret, VaultError> {
        let sealed = self.sealed().ok_or(VaultError::Empty)?;
        validate_pin(sealed.method, pin)?;
        self.open(&sealed, pin.as_bytes())
    }

    /// Opens a device-backed or unguarded envelope.
    pub fn unseal_device(&self) -> Result<Secret, VaultError> {
        let sealed = self.sealed().ok_or(VaultError::Empty)?;
        if sealed.method.pin_length().is_some() {
            return Err(VaultError::MethodMismatch {
                sealed: sealed.method,
                requested: AuthenticationType::Biometric,
            });
        }
        self.open(&sealed, &self.inner.device_key)
    }

    fn open(&self, sealed: &SealedSecret, credential: &[u8]) -> Result<Secret, VaultError> {
        let salt: [u8; 16] = decode_fixed(&sealed.salt, "salt")?;
        let nonce: [u8; 12] = decode_fixed(&sealed.nonce, "nonce")?;
        let ciphertext = decode(&sealed.ciphertext, "ciphertext")?;
        let tag = decode(&sealed.mac, "mac")?;

        let keys = derive_keys(
            credential,
            salt,
            &self.inner.params,
            Some(sealed.kdf_algorithm),
        )?;
        verify_hmac_sha256(
            &keys.mac_key,
            &[method_tag(sealed.method), &salt, &nonce, &ciphertext],
            &tag,
        )
        .map_err(|_| VaultError::WrongCredential)?;

        let plaintext = decrypt_aes_gcm(&keys.enc_key, nonce, &ciphertext)?;
        let secret = String::from_utf8(plaintext)
            .map_err(|_| VaultError::Malformed("secret is not utf-8".to_owned()))?;
        Ok(Secret::new(secret))
    }

    fn slot(&self) -> MutexGuard<'_, Option<SealedSecret>> {
        self.inner
            .sealed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn method_tag(method: AuthenticationType) -> &'static [u8] {
    match method {
        AuthenticationType::Biometric => b"biometric",
        AuthenticationType::DeviceCredential => b"device_credential",
        AuthenticationType::ManualPin4 => b"pin4",
        AuthenticationType::ManualPin6 => b"pin6",
        AuthenticationType::None => b"none",
    }
}

fn decode(value: &str, field: &str) -> Result<Vec<u8>, VaultError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| VaultError::Malformed(format!("{field}: {e}")))
}

fn decode_fixed<const N: usize>(value: &str, field: &str) -> Result<[u8; N], VaultError> {
    decode(value, field)?
        .try_into()
        .map_err(|_| VaultError::Malformed(format!("{field}: expected {N} bytes")))
}
