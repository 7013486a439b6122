pub mod authenticator;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod surface;
pub mod vault;
pub mod wallet;

pub use authenticator::{PromptAuthenticator, PromptHandle, PromptRequest, PromptResponse};
pub use clock::SystemClockAdapter;
pub use config::{ConfigError, FlowAdapterConfig};
pub use crypto::{CryptoError, KdfAlgorithm, KdfParams};
pub use surface::{RecordingOverlaySurface, SurfaceEvent};
pub use vault::{validate_pin, SealedSecret, SecretVault, VaultError};
pub use wallet::{
    decode_share_payload, share_payload, InMemoryWallet, ServerEntry, ServerProto, SignedTx,
    WalletAction,
};
