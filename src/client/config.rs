// ABOUTME: Transmitter configuration: SMSC address, bind credentials and timing knobs
// ABOUTME: Plain structs with defaults and chained with_* setters

use crate::client::keepalive::KeepAliveConfig;
use std::time::Duration;

/// Credentials sent in bind_transmitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindCredentials {
    /// System identifier for authentication
    pub system_id: String,
    /// Password for authentication
    pub password: String,
    /// SMSC specific classification of the ESME (optional, defaults to empty string)
    pub system_type: Option<String>,
}

impl BindCredentials {
    pub fn new(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: None,
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = Some(system_type.into());
        self
    }

    pub(crate) fn system_type_or_default(&self) -> &str {
        self.system_type.as_deref().unwrap_or("")
    }
}

/// Everything a `Transmitter` needs to open and run a session.
///
/// # Example
///
/// ```rust
/// use smpp_transmitter::client::{KeepAliveConfig, TransmitterConfig};
/// use std::time::Duration;
///
/// let config = TransmitterConfig::new("localhost:2775", "system_id", "password")
///     .with_system_type("MYAPP")
///     .with_request_timeout(Duration::from_secs(5))
///     .with_keep_alive(KeepAliveConfig::new(Duration::from_secs(60)));
/// assert_eq!(config.credentials.system_type.as_deref(), Some("MYAPP"));
/// ```
#[derive(Debug, Clone)]
pub struct TransmitterConfig {
    /// SMSC endpoint, anything `TcpStream::connect` accepts (e.g. `"host:2775"`)
    pub addr: String,
    pub credentials: BindCredentials,
    /// Deadline for each submit_sm / query_sm response (default: 10 seconds)
    pub request_timeout: Duration,
    /// TCP connect deadline (default: 10 seconds)
    pub connect_timeout: Duration,
    /// Deadline for bind_transmitter_resp (default: 10 seconds)
    pub bind_timeout: Duration,
    /// How long close waits for unbind_resp (default: 1 second)
    pub unbind_timeout: Duration,
    /// Resolution of request deadlines (default: 50 milliseconds)
    pub expiry_sweep_interval: Duration,
    /// Periodic enquire_link (default: disabled)
    pub keep_alive: KeepAliveConfig,
}

impl TransmitterConfig {
    pub fn new(
        addr: impl Into<String>,
        system_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::with_credentials(addr, BindCredentials::new(system_id, password))
    }

    pub fn with_credentials(addr: impl Into<String>, credentials: BindCredentials) -> Self {
        Self {
            addr: addr.into(),
            credentials,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            bind_timeout: Duration::from_secs(10),
            unbind_timeout: Duration::from_secs(1),
            expiry_sweep_interval: Duration::from_millis(50),
            keep_alive: KeepAliveConfig::disabled(),
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.credentials = self.credentials.with_system_type(system_type);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_bind_timeout(mut self, timeout: Duration) -> Self {
        self.bind_timeout = timeout;
        self
    }

    pub fn with_unbind_timeout(mut self, timeout: Duration) -> Self {
        self.unbind_timeout = timeout;
        self
    }

    pub fn with_expiry_sweep_interval(mut self, interval: Duration) -> Self {
        self.expiry_sweep_interval = interval;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAliveConfig) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
