//! In-memory wallet engine: builds the three transaction kinds the screens
//! create and accepts broadcasts into a local mempool. It stands in for the
//! chain-facing engine, so there is no signing or address logic here.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use wallet_flow_core::{
    Amount, BroadcastError, BroadcastReceipt, BuildError, BuiltTransaction, PanelContent, Secret,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletAction {
    CreateCollection {
        name: String,
        metadata: String,
        supply: u64,
    },
    SellOrder {
        collection_id: String,
        nft_id: u64,
        price: Amount,
        receive_to: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub txid: String,
    pub action: WalletAction,
    pub fee: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerProto {
    Tcp,
    Ssl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub host: String,
    pub port: u16,
    pub proto: ServerProto,
    pub network: String,
}

#[derive(Debug, Clone)]
pub struct InMemoryWallet {
    inner: Arc<Mutex<WalletState>>,
}

#[derive(Debug)]
struct WalletState {
    spending_secret: Secret,
    balance: Amount,
    fee: Amount,
    next_seq: u64,
    mempool: Vec<SignedTx>,
    reject_next: Option<String>,
    servers: Vec<ServerEntry>,
}

impl InMemoryWallet {
    pub fn new(spending_secret: Secret, balance: Amount, fee: Amount) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WalletState {
                spending_secret,
                balance,
                fee,
                next_seq: 1,
                mempool: Vec::new(),
                reject_next: None,
                servers: Vec::new(),
            })),
        }
    }

    pub fn balance(&self) -> Amount {
        self.state().balance
    }

    pub fn mempool(&self) -> Vec<SignedTx> {
        self.state().mempool.clone()
    }

    /// Makes the next broadcast fail with `raw` as the node's error text.
    pub fn reject_next_broadcast(&self, raw: impl Into<String>) {
        self.state().reject_next = Some(raw.into());
    }

    pub fn add_server(&self, server: ServerEntry) {
        tracing::info!(host = %server.host, port = server.port, "server added");
        self.state().servers.push(server);
    }

    pub fn servers(&self) -> Vec<ServerEntry> {
        self.state().servers.clone()
    }

    /// Builds and signs `action`. Nothing is spent until the broadcast lands.
    pub fn build(
        &self,
        secret: &Secret,
        action: WalletAction,
    ) -> Result<BuiltTransaction<SignedTx>, BuildError> {
        let mut state = self.state();
        if *secret != state.spending_secret {
            return Err(BuildError::new("invalid spending secret"));
        }
        // Both actions only spend the network fee.
        if state.fee > state.balance {
            return Err(BuildError::new("insufficient funds"));
        }

        let txid = format!("{:064x}", state.next_seq);
        state.next_seq += 1;
        tracing::debug!(%txid, fee = %state.fee, "transaction built");
        Ok(BuiltTransaction {
            fee: state.fee,
            payload: SignedTx {
                txid,
                action,
                fee: state.fee,
            },
        })
    }

    pub fn broadcast(&self, tx: SignedTx) -> Result<BroadcastReceipt, BroadcastError> {
        let mut state = self.state();
        if let Some(raw) = state.reject_next.take() {
            tracing::warn!(txid = %tx.txid, %raw, "broadcast rejected");
            return Err(BroadcastError::new(raw));
        }
        let Some(remaining) = state.balance.units().checked_sub(tx.fee.units()) else {
            return Err(BroadcastError::new(
                "bad-txns-in-belowout [value in < value out]",
            ));
        };
        state.balance = Amount::from_units(remaining);

        let receipt = match &tx.action {
            WalletAction::SellOrder { .. } => BroadcastReceipt {
                txid: Some(tx.txid.clone()),
                follow_up: Some(PanelContent::Share {
                    title: "Share the following QR code with your buyer:".to_owned(),
                    payload: share_payload(&tx),
                }),
            },
            _ => BroadcastReceipt::with_txid(tx.txid.clone()),
        };
        tracing::info!(txid = %tx.txid, "transaction broadcast");
        state.mempool.push(tx);
        Ok(receipt)
    }

    fn state(&self) -> MutexGuard<'_, WalletState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Order handed to a buyer out of band: `order:` + base64url JSON.
pub fn share_payload(tx: &SignedTx) -> String {
    match serde_json::to_vec(tx) {
        Ok(json) => format!("order:{}", URL_SAFE_NO_PAD.encode(json)),
        Err(e) => {
            tracing::warn!(error = %e, "order serialization failed");
            format!("order:{}", tx.txid)
        }
    }
}

pub fn decode_share_payload(payload: &str) -> Option<SignedTx> {
    let encoded = payload.strip_prefix("order:")?;
    let json = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    serde_json::from_slice(&json).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> InMemoryWallet {
        InMemoryWallet::new(Secret::new("seed"), Amount::from_units(50_000), Amount::from_units(1_000))
    }

    #[test]
    fn wrong_secret_cannot_build() {
        let err = wallet()
            .build(
                &Secret::new("other"),
                WalletAction::CreateCollection {
                    name: "n".to_owned(),
                    metadata: "{}".to_owned(),
                    supply: 1,
                },
            )
            .expect_err("must fail");
        assert_eq!(err.to_string(), "invalid spending secret");
    }

    #[test]
    fn fee_alone_can_exhaust_balance() {
        let w = InMemoryWallet::new(Secret::new("seed"), Amount::from_units(999), Amount::from_units(1_000));
        let action = WalletAction::CreateCollection {
            name: "n".to_owned(),
            metadata: "{}".to_owned(),
            supply: 1,
        };
        assert!(w.build(&Secret::new("seed"), action).is_err());
    }

    #[test]
    fn txids_are_unique_per_build() {
        let w = wallet();
        let create = || WalletAction::CreateCollection {
            name: "n".to_owned(),
            metadata: "{}".to_owned(),
            supply: 1,
        };
        let a = w.build(&Secret::new("seed"), create()).expect("build");
        let b = w.build(&Secret::new("seed"), create()).expect("build");
        assert_ne!(a.payload.txid, b.payload.txid);
        assert_eq!(a.fee, Amount::from_units(1_000));
    }

    #[test]
    fn share_payload_decodes_back_to_the_order() {
        let w = wallet();
        let built = w
            .build(
                &Secret::new("seed"),
                WalletAction::SellOrder {
                    collection_id: "c".to_owned(),
                    nft_id: 3,
                    price: Amount::from_units(150_000_000),
                    receive_to: "r".to_owned(),
                },
            )
            .expect("build");
        let payload = share_payload(&built.payload);
        assert!(payload.starts_with("order:"));
        assert_eq!(decode_share_payload(&payload), Some(built.payload));
        assert_eq!(decode_share_payload("gzo:nope"), None);
    }
}
