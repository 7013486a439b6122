use std::future::Future;

use serde_json::json;
use wallet_flow_adapters::WalletAction;
use wallet_flow_core::{ValidationError, WorkflowOutcome, WorkflowRequest};

use super::state::ScreenNotice;
use crate::flow_bridge::FlowBridge;

#[derive(Debug, Clone)]
pub struct CreateNftCollectionScreen {
    pub name: String,
    pub description: String,
    pub amount: u64,
    pub notice: ScreenNotice,
}

impl Default for CreateNftCollectionScreen {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            amount: 1,
            notice: ScreenNotice::default(),
        }
    }
}

impl CreateNftCollectionScreen {
    /// The collection action. Metadata carries everything except the name
    /// and the supply, which travel as their own fields.
    pub fn action(&self) -> Result<WalletAction, ValidationError> {
        if self.name.is_empty() || self.description.is_empty() {
            return Err(ValidationError::rejected(
                "collection",
                "Please fill the collection details.",
            ));
        }
        Ok(WalletAction::CreateCollection {
            name: self.name.clone(),
            metadata: json!({ "description": self.description }).to_string(),
            supply: self.amount,
        })
    }

    pub fn request(&self, bridge: &FlowBridge) -> WorkflowRequest {
        bridge
            .request("Confirm collection creation")
            .row("Name:", &self.name)
            .row("Description:", &self.description)
            .row("Number of items:", self.amount.to_string())
    }

    /// Validates the form and starts the workflow. `None` means nothing
    /// started; the reason is in `notice`.
    pub fn submit(
        &mut self,
        bridge: &FlowBridge,
    ) -> Option<impl Future<Output = WorkflowOutcome> + Send + 'static> {
        let action = match self.action() {
            Ok(action) => action,
            Err(err) => {
                self.notice.set_error(err.to_string());
                return None;
            }
        };
        self.notice.clear_notice();
        match bridge.submit(self.request(bridge), action) {
            Ok(run) => Some(run),
            Err(err) => {
                tracing::warn!(%err, "collection creation not started");
                None
            }
        }
    }
}
