use std::net::IpAddr;

use wallet_flow_adapters::{InMemoryWallet, ServerEntry, ServerProto};
use wallet_flow_core::ValidationError;

use super::state::ScreenNotice;

pub const PROTO_OPTIONS: [ServerProto; 2] = [ServerProto::Tcp, ServerProto::Ssl];

pub fn proto_label(proto: ServerProto) -> &'static str {
    match proto {
        ServerProto::Tcp => "tcp",
        ServerProto::Ssl => "ssl",
    }
}

/// Add-server form. Adding a server is not a sensitive action, so it never
/// goes through the gate or the swipe workflow.
#[derive(Debug, Clone)]
pub struct AddServerScreen {
    pub host: String,
    pub port: String,
    pub proto: Option<ServerProto>,
    pub network: String,
    pub notice: ScreenNotice,
}

impl AddServerScreen {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            host: String::new(),
            port: String::new(),
            proto: Some(PROTO_OPTIONS[0]),
            network: network.into(),
            notice: ScreenNotice::default(),
        }
    }

    /// Index of the selected proto in `PROTO_OPTIONS`; unknown falls back to 0.
    pub fn selected_proto_index(&self) -> usize {
        self.proto
            .and_then(|p| PROTO_OPTIONS.iter().position(|o| *o == p))
            .unwrap_or(0)
    }

    pub fn select_proto(&mut self, index: usize) {
        self.proto = PROTO_OPTIONS.get(index).copied();
    }

    pub fn validate(&self) -> Result<ServerEntry, ValidationError> {
        let host = self.host.trim();
        let port_text = self.port.trim();
        let details = || ValidationError::rejected("server", "Please input server details.");

        let (Some(proto), false, false, false) = (
            self.proto,
            host.is_empty(),
            port_text.is_empty(),
            self.network.is_empty(),
        ) else {
            return Err(details());
        };
        if !is_valid_host(host) {
            return Err(ValidationError::rejected("host", "Invalid server"));
        }
        let port = match port_text.parse::<u32>() {
            Ok(0) => return Err(details()),
            Ok(port) => u16::try_from(port)
                .map_err(|_| ValidationError::rejected("port", "Invalid port"))?,
            Err(_) => return Err(ValidationError::rejected("port", "Invalid port")),
        };

        Ok(ServerEntry {
            host: host.to_owned(),
            port,
            proto,
            network: self.network.clone(),
        })
    }

    /// Validates and registers the server. Returns the entry on success so
    /// the caller can navigate back.
    pub fn submit(&mut self, wallet: &InMemoryWallet) -> Option<ServerEntry> {
        match self.validate() {
            Ok(server) => {
                self.notice.clear_notice();
                tracing::info!(
                    host = %server.host,
                    port = server.port,
                    proto = proto_label(server.proto),
                    "server added"
                );
                wallet.add_server(server.clone());
                Some(server)
            }
            Err(err) => {
                tracing::debug!(%err, "add server rejected");
                self.notice.set_error(err.to_string());
                None
            }
        }
    }
}

/// An IP literal or a DNS hostname.
pub fn is_valid_host(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    let labels: Vec<&str> = host.trim_end_matches('.').split('.').collect();
    // All-numeric dotted names are malformed IPs, not hostnames.
    if labels.iter().all(|l| l.bytes().all(|b| b.is_ascii_digit())) {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}
