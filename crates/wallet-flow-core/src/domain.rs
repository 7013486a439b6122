use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

/// Identity of one `execute()` run. Allocated by the orchestrator, strictly
/// increasing, and used to validate every resumed continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvocationId(pub u64);

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationType {
    Biometric,
    DeviceCredential,
    ManualPin4,
    ManualPin6,
    None,
}

impl AuthenticationType {
    pub const ALL: [AuthenticationType; 5] = [
        AuthenticationType::Biometric,
        AuthenticationType::DeviceCredential,
        AuthenticationType::ManualPin4,
        AuthenticationType::ManualPin6,
        AuthenticationType::None,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            AuthenticationType::Biometric => "Biometrics",
            AuthenticationType::DeviceCredential => "Device passcode",
            AuthenticationType::ManualPin4 => "4-digit PIN",
            AuthenticationType::ManualPin6 => "6-digit PIN",
            AuthenticationType::None => "None",
        }
    }

    pub fn pin_length(self) -> Option<usize> {
        match self {
            AuthenticationType::ManualPin4 => Some(4),
            AuthenticationType::ManualPin6 => Some(6),
            _ => None,
        }
    }

    /// Unlocked through the platform keychain rather than a typed PIN.
    pub fn is_device_backed(self) -> bool {
        matches!(
            self,
            AuthenticationType::Biometric | AuthenticationType::DeviceCredential
        )
    }

    pub fn is_gated(self) -> bool {
        self != AuthenticationType::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    pub is_locked: bool,
    pub authentication_type: AuthenticationType,
}

/// The spending credential. Only obtained through a successful
/// authentication and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

impl SummaryRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Presentation inputs for one workflow run, supplied by the screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub review_title: String,
    pub rows: Vec<SummaryRow>,
    pub ticker: String,
    pub building_label: String,
    pub broadcasting_label: String,
    pub swipe_title: String,
    /// Heading for failures before anything was sent.
    pub build_failure_heading: String,
    pub failure_heading: String,
}

impl WorkflowRequest {
    pub fn new(review_title: impl Into<String>) -> Self {
        Self {
            review_title: review_title.into(),
            rows: Vec::new(),
            ticker: "xNAV".to_owned(),
            building_label: "Creating transaction...".to_owned(),
            broadcasting_label: "Broadcasting...".to_owned(),
            swipe_title: "Swipe to confirm".to_owned(),
            build_failure_heading: "Unable to create transaction".to_owned(),
            failure_heading: "Unable to send transaction".to_owned(),
        }
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push(SummaryRow::new(label, value));
        self
    }

    pub fn busy_labels(
        mut self,
        building: impl Into<String>,
        broadcasting: impl Into<String>,
    ) -> Self {
        self.building_label = building.into();
        self.broadcasting_label = broadcasting.into();
        self
    }

    pub fn failure_heading(mut self, heading: impl Into<String>) -> Self {
        self.failure_heading = heading.into();
        self
    }

    /// Uses one heading for every failure stage.
    pub fn failure_headings(mut self, heading: impl Into<String>) -> Self {
        let heading = heading.into();
        self.build_failure_heading = heading.clone();
        self.failure_heading = heading;
        self
    }

    pub fn build_failure_heading(mut self, heading: impl Into<String>) -> Self {
        self.build_failure_heading = heading.into();
        self
    }

    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = ticker.into();
        self
    }
}

/// What a builder hands back: the opaque payload and the fee it will cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction<P> {
    pub payload: P,
    pub fee: Amount,
}

#[derive(Debug, Clone)]
pub struct PendingTransaction<P> {
    pub invocation: InvocationId,
    pub payload: P,
    pub fee: Amount,
    pub summary: Vec<SummaryRow>,
    pub built_at_ms: TimestampMs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReceipt {
    pub txid: Option<String>,
    /// Panel to leave on screen after success instead of dismissing.
    pub follow_up: Option<PanelContent>,
}

impl BroadcastReceipt {
    pub fn with_txid(txid: impl Into<String>) -> Self {
        Self {
            txid: Some(txid.into()),
            follow_up: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelContent {
    Review {
        invocation: InvocationId,
        title: String,
        rows: Vec<SummaryRow>,
        fee: String,
        swipe_title: String,
    },
    Error {
        heading: String,
        message: String,
    },
    Share {
        title: String,
        payload: String,
    },
    Options {
        title: String,
        options: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayEntry {
    Busy(String),
    Panel(PanelContent),
}
