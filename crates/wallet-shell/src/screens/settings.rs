use thiserror::Error;
use wallet_flow_adapters::{validate_pin, VaultError};
use wallet_flow_core::{AuthError, AuthenticationType, PanelContent, Secret};

use super::state::ScreenNotice;
use crate::flow_bridge::FlowBridge;

/// The one device-backed method the platform offers, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSupport {
    Nothing,
    Biometric,
    DeviceCredential,
}

impl DeviceSupport {
    pub fn method(self) -> Option<AuthenticationType> {
        match self {
            DeviceSupport::Nothing => None,
            DeviceSupport::Biometric => Some(AuthenticationType::Biometric),
            DeviceSupport::DeviceCredential => Some(AuthenticationType::DeviceCredential),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error("{} is not available on this device", .0.display_name())]
    Unsupported(AuthenticationType),
}

/// Methods a user may switch to: never the current one, and device-backed
/// methods only when the platform offers them.
pub fn authentication_options(
    current: AuthenticationType,
    device: DeviceSupport,
) -> Vec<AuthenticationType> {
    device
        .method()
        .into_iter()
        .chain([
            AuthenticationType::ManualPin4,
            AuthenticationType::ManualPin6,
            AuthenticationType::None,
        ])
        .filter(|method| *method != current)
        .collect()
}

#[derive(Debug, Clone)]
pub struct SettingsScreen {
    pub device: DeviceSupport,
    pub notice: ScreenNotice,
}

impl SettingsScreen {
    pub fn new(device: DeviceSupport) -> Self {
        Self {
            device,
            notice: ScreenNotice::default(),
        }
    }

    pub fn security_title(&self, bridge: &FlowBridge) -> String {
        let current = bridge.gate().lock_state().authentication_type;
        format!("Security: {}", current.display_name())
    }

    pub fn options(&self, bridge: &FlowBridge) -> Vec<AuthenticationType> {
        authentication_options(bridge.gate().lock_state().authentication_type, self.device)
    }

    pub async fn open_method_picker(&self, bridge: &FlowBridge) {
        let options = self
            .options(bridge)
            .into_iter()
            .map(|method| method.display_name().to_owned())
            .collect();
        bridge
            .overlay()
            .present_panel(PanelContent::Options {
                title: "Select a new authentication mode".to_owned(),
                options,
            })
            .await;
    }

    /// Switches the authentication method. The user proves the current
    /// method first; the secret is then resealed for the new one.
    pub async fn change_method(
        &mut self,
        bridge: &FlowBridge,
        method: AuthenticationType,
        new_pin: Option<&str>,
    ) -> Result<(), SettingsError> {
        let result = self.reseal_for(bridge, method, new_pin).await;
        bridge.overlay().dismiss_panel().await;
        match &result {
            Ok(()) => {
                let title = self.security_title(bridge);
                self.notice.set_info(title);
            }
            Err(SettingsError::Auth(AuthError::Cancelled)) => self.notice.clear_notice(),
            Err(err) => self.notice.set_error(err.to_string()),
        }
        result
    }

    async fn reseal_for(
        &self,
        bridge: &FlowBridge,
        method: AuthenticationType,
        new_pin: Option<&str>,
    ) -> Result<(), SettingsError> {
        if !self.options(bridge).contains(&method) {
            return Err(SettingsError::Unsupported(method));
        }
        if method.pin_length().is_some() {
            validate_pin(method, new_pin.unwrap_or_default())?;
        }
        let secret = bridge.gate().authenticate().await?;
        bridge.vault().seal(&secret, method, new_pin)?;
        bridge.gate().set_authentication_type(method);
        Ok(())
    }

    /// The auto-lock row is hidden when nothing ever locks.
    pub fn auto_lock_visible(&self, bridge: &FlowBridge) -> bool {
        bridge.gate().lock_state().authentication_type.is_gated()
    }

    pub fn toggle_auto_lock(&self, bridge: &FlowBridge) -> bool {
        let enabled = !bridge.gate().lock_after_background();
        bridge.gate().set_lock_after_background(enabled);
        enabled
    }

    /// Reveals the mnemonic after a fresh authentication.
    pub async fn show_mnemonic(&mut self, bridge: &FlowBridge) -> Option<Secret> {
        match bridge.gate().authenticate().await {
            Ok(secret) => Some(secret),
            Err(AuthError::Cancelled) => None,
            Err(err) => {
                self.notice.set_error(err.to_string());
                None
            }
        }
    }
}
