//! Client configuration

use std::time::Duration;

use crate::alert::DEFAULT_CUE_INTERVAL;

/// Connection settings for one terminal
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the HTTP API, e.g. `http://localhost:3000`
    pub http_base_url: String,
    /// Address of the event bus, e.g. `localhost:8081`
    pub bus_addr: String,
    /// Bearer token (minted by the credential service)
    pub token: String,
    /// Client name reported at the bus handshake, for server logs
    pub client_name: Option<String>,
    /// Alert cue repetition interval
    pub cue_interval: Duration,
}

impl ClientConfig {
    pub fn new(
        http_base_url: impl Into<String>,
        bus_addr: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http_base_url: http_base_url.into(),
            bus_addr: bus_addr.into(),
            token: token.into(),
            client_name: None,
            cue_interval: DEFAULT_CUE_INTERVAL,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn with_cue_interval(mut self, interval: Duration) -> Self {
        self.cue_interval = interval;
        self
    }
}
