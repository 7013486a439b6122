use std::future::Future;

use wallet_flow_adapters::WalletAction;
use wallet_flow_core::{normalize_price_input, Amount, ValidationError, WorkflowOutcome};

use super::state::ScreenNotice;
use crate::flow_bridge::FlowBridge;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftCollection {
    pub token_id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SellNftScreen {
    pub collection: NftCollection,
    pub nft_id: u64,
    /// Receive address for the payment; the first private wallet address.
    pub destination: String,
    pub price: String,
    pub notice: ScreenNotice,
}

impl SellNftScreen {
    pub fn new(collection: NftCollection, nft_id: u64, destination: impl Into<String>) -> Self {
        Self {
            collection,
            nft_id,
            destination: destination.into(),
            price: String::new(),
            notice: ScreenNotice::default(),
        }
    }

    /// Keystroke handler for the price field.
    pub fn on_price_changed(&mut self, text: &str) {
        self.price = normalize_price_input(text);
    }

    pub fn action(&self) -> Result<(WalletAction, Amount), ValidationError> {
        if self.price.is_empty() {
            return Err(ValidationError::rejected(
                "price",
                "Please fill the price details.",
            ));
        }
        let price = Amount::parse_decimal(&self.price)?;
        let action = WalletAction::SellOrder {
            collection_id: self.collection.token_id.clone(),
            nft_id: self.nft_id,
            price,
            receive_to: self.destination.clone(),
        };
        Ok((action, price))
    }

    pub fn submit(
        &mut self,
        bridge: &FlowBridge,
    ) -> Option<impl Future<Output = WorkflowOutcome> + Send + 'static> {
        let (action, price) = match self.action() {
            Ok(parsed) => parsed,
            Err(err) => {
                self.notice.set_error(err.to_string());
                return None;
            }
        };
        self.notice.clear_notice();

        let ticker = &bridge.config().coin_ticker;
        let request = bridge
            .request("Confirm sell order")
            .failure_headings("Unable to create sell order")
            .row("Collection:", &self.collection.name)
            .row("Item:", format!("#{}", self.nft_id))
            .row("Price:", price.display_with(ticker));
        match bridge.submit(request, action) {
            Ok(run) => Some(run),
            Err(err) => {
                tracing::warn!(%err, "sell order not started");
                None
            }
        }
    }
}
