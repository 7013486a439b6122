use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    Argon2idV1,
    Pbkdf2HmacSha256V1,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("randomness unavailable: {0}")]
    Random(String),
    #[error("key derivation failed: {0}")]
    Kdf(String),
    #[error("cipher failure: {0}")]
    Cipher(String),
    #[error("integrity check failed")]
    Integrity,
}

/// Cost parameters for turning a PIN or device key into vault keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub pbkdf2_rounds: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            pbkdf2_rounds: 600_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DerivedKeys {
    pub kdf_algorithm: KdfAlgorithm,
    pub salt: [u8; 16],
    pub enc_key: [u8; 32],
    pub mac_key: [u8; 32],
}

pub fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    getrandom::getrandom(&mut out).map_err(|e| CryptoError::Random(e.to_string()))?;
    Ok(out)
}

pub fn generate_salt() -> Result<[u8; 16], CryptoError> {
    random_bytes::<16>()
}

pub fn generate_nonce() -> Result<[u8; 12], CryptoError> {
    random_bytes::<12>()
}

/// Derives the encryption and MAC keys. `algorithm` pins the KDF when
/// re-deriving for an existing envelope; `None` picks Argon2id and falls
/// back to PBKDF2 if the parameters are rejected.
pub fn derive_keys(
    passphrase: &[u8],
    salt: [u8; 16],
    params: &KdfParams,
    algorithm: Option<KdfAlgorithm>,
) -> Result<DerivedKeys, CryptoError> {
    let (root_key, kdf_algorithm) = derive_root_key(passphrase, &salt, params, algorithm)?;
    let hk = Hkdf::<Sha256>::new(None, &root_key);
    let mut enc_key = [0u8; 32];
    let mut mac_key = [0u8; 32];
    hk.expand(b"vault_enc_key_v1", &mut enc_key)
        .map_err(|_| CryptoError::Kdf("hkdf expand for enc key failed".to_owned()))?;
    hk.expand(b"vault_mac_key_v1", &mut mac_key)
        .map_err(|_| CryptoError::Kdf("hkdf expand for mac key failed".to_owned()))?;
    Ok(DerivedKeys {
        kdf_algorithm,
        salt,
        enc_key,
        mac_key,
    })
}

pub fn encrypt_aes_gcm(
    enc_key: &[u8; 32],
    nonce: [u8; 12],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(enc_key)
        .map_err(|e| CryptoError::Cipher(format!("aes-gcm init failed: {e}")))?;
    let nonce = Nonce::<aes_gcm::aead::consts::U12>::from(nonce);
    cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Cipher(format!("aes-gcm encrypt failed: {e}")))
}

pub fn decrypt_aes_gcm(
    enc_key: &[u8; 32],
    nonce: [u8; 12],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(enc_key)
        .map_err(|e| CryptoError::Cipher(format!("aes-gcm init failed: {e}")))?;
    let nonce = Nonce::<aes_gcm::aead::consts::U12>::from(nonce);
    cipher
        .decrypt(&nonce, ciphertext)
        .map_err(|_| CryptoError::Integrity)
}

pub fn hmac_sha256(mac_key: &[u8; 32], parts: &[&[u8]]) -> Result<[u8; 32], CryptoError> {
    let mut mac = mac_for(mac_key)?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Constant-time tag comparison.
pub fn verify_hmac_sha256(
    mac_key: &[u8; 32],
    parts: &[&[u8]],
    tag: &[u8],
) -> Result<(), CryptoError> {
    let mut mac = mac_for(mac_key)?;
    for part in parts {
        mac.update(part);
    }
    mac.verify_slice(tag).map_err(|_| CryptoError::Integrity)
}

fn mac_for(mac_key: &[u8; 32]) -> Result<HmacSha256, CryptoError> {
    <HmacSha256 as Mac>::new_from_slice(mac_key)
        .map_err(|e| CryptoError::Cipher(format!("hmac init failed: {e}")))
}

fn derive_root_key(
    passphrase: &[u8],
    salt: &[u8; 16],
    params: &KdfParams,
    algorithm: Option<KdfAlgorithm>,
) -> Result<([u8; 32], KdfAlgorithm), CryptoError> {
    let mut root = [0u8; 32];
    if algorithm != Some(KdfAlgorithm::Pbkdf2HmacSha256V1) {
        let argon = Params::new(params.memory_kib, params.iterations, 1, Some(32))
            .map(|p| Argon2::new(Algorithm::Argon2id, Version::V0x13, p));
        match argon {
            Ok(argon) => {
                argon
                    .hash_password_into(passphrase, salt, &mut root)
                    .map_err(|e| CryptoError::Kdf(format!("argon2id failed: {e}")))?;
                return Ok((root, KdfAlgorithm::Argon2idV1));
            }
            Err(e) if algorithm == Some(KdfAlgorithm::Argon2idV1) => {
                return Err(CryptoError::Kdf(format!("argon2id params rejected: {e}")));
            }
            Err(e) => {
                tracing::warn!(error = %e, "argon2id params rejected, using pbkdf2");
            }
        }
    }

    pbkdf2_hmac::<Sha256>(passphrase, salt, params.pbkdf2_rounds.max(1), &mut root);
    Ok((root, KdfAlgorithm::Pbkdf2HmacSha256V1))
}
