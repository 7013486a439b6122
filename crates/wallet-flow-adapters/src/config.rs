use serde::{Deserialize, Serialize};
use thiserror::Error;
use wallet_flow_core::{
    Amount, AuthenticationType, GateSettings, GestureConfig, ValidationError, WorkflowRequest,
};

use crate::crypto::KdfParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowAdapterConfig {
    pub authentication_type: AuthenticationType,
    pub max_auth_attempts: u32,
    pub lock_after_background: bool,
    pub kdf_memory_kib: u32,
    pub kdf_iterations: u32,
    pub kdf_pbkdf2_rounds: u32,
    pub swipe_track_length: f64,
    pub swipe_thumb_size: f64,
    pub swipe_confirm_ratio: f64,
    pub building_label: String,
    pub broadcasting_label: String,
    pub build_failure_heading: String,
    pub failure_heading: String,
    pub coin_ticker: String,
    pub panel_hide_ms: u64,
    pub network_fee_units: u64,
}

impl Default for FlowAdapterConfig {
    fn default() -> Self {
        let gesture = GestureConfig::default();
        let kdf = KdfParams::default();
        Self {
            authentication_type: AuthenticationType::ManualPin6,
            max_auth_attempts: 3,
            lock_after_background: true,
            kdf_memory_kib: kdf.memory_kib,
            kdf_iterations: kdf.iterations,
            kdf_pbkdf2_rounds: kdf.pbkdf2_rounds,
            swipe_track_length: gesture.track_length,
            swipe_thumb_size: gesture.thumb_size,
            swipe_confirm_ratio: gesture.confirm_threshold_ratio,
            building_label: "Creating transaction...".to_owned(),
            broadcasting_label: "Broadcasting...".to_owned(),
            build_failure_heading: "Unable to create transaction".to_owned(),
            failure_heading: "Unable to send transaction".to_owned(),
            coin_ticker: "xNAV".to_owned(),
            panel_hide_ms: 250,
            network_fee_units: 10_000,
        }
    }
}

impl FlowAdapterConfig {
    /// Parses a partial JSON document over the defaults and checks geometry.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.gesture_config().validate()?;
        if config.max_auth_attempts == 0 {
            return Err(ValidationError::rejected(
                "max_auth_attempts",
                "must allow at least one attempt",
            )
            .into());
        }
        Ok(config)
    }

    pub fn gate_settings(&self) -> GateSettings {
        GateSettings {
            authentication_type: self.authentication_type,
            lock_after_background: self.lock_after_background,
            max_attempts: self.max_auth_attempts,
        }
    }

    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            track_length: self.swipe_track_length,
            thumb_size: self.swipe_thumb_size,
            confirm_threshold_ratio: self.swipe_confirm_ratio,
        }
    }

    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.kdf_memory_kib,
            iterations: self.kdf_iterations,
            pbkdf2_rounds: self.kdf_pbkdf2_rounds,
        }
    }

    pub fn network_fee(&self) -> Amount {
        Amount::from_units(self.network_fee_units)
    }

    /// A request pre-filled with the configured labels and ticker.
    pub fn request(&self, review_title: &str) -> WorkflowRequest {
        WorkflowRequest::new(review_title)
            .busy_labels(&self.building_label, &self.broadcasting_label)
            .build_failure_heading(&self.build_failure_heading)
            .failure_heading(&self.failure_heading)
            .ticker(&self.coin_ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FlowAdapterConfig::from_json_str(
            r#"{"authentication_type":"Biometric","max_auth_attempts":5}"#,
        )
        .expect("parse config");
        assert_eq!(config.authentication_type, AuthenticationType::Biometric);
        assert_eq!(config.gate_settings().max_attempts, 5);
        assert_eq!(config.coin_ticker, "xNAV");
        assert_eq!(config.gesture_config(), GestureConfig::default());
    }

    #[test]
    fn bad_geometry_is_rejected() {
        let err = FlowAdapterConfig::from_json_str(r#"{"swipe_thumb_size":400.0}"#)
            .expect_err("thumb larger than track");
        assert!(matches!(err, ConfigError::Invalid(ValidationError::InvalidGeometry(_))));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        assert!(FlowAdapterConfig::from_json_str(r#"{"max_auth_attempts":0}"#).is_err());
        assert!(matches!(
            FlowAdapterConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn request_uses_configured_labels() {
        let config = FlowAdapterConfig {
            building_label: "Preparing...".to_owned(),
            ..FlowAdapterConfig::default()
        };
        let request = config.request("Send");
        assert_eq!(request.building_label, "Preparing...");
        assert_eq!(request.broadcasting_label, "Broadcasting...");
        assert_eq!(request.ticker, "xNAV");
    }
}
