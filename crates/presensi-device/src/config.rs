//! Terminal configuration.

use serde::{Deserialize, Serialize};

/// Static configuration of one terminal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Backend base URL, e.g. `http://192.168.100.43:3000`.
    #[serde(default)]
    pub server_url: String,
    /// Device API key issued by the admin panel.
    #[serde(default)]
    pub api_key: String,
    /// Network name, shown on the connecting screen.
    #[serde(default)]
    pub wifi_ssid: String,
    /// Network credential. Never logged.
    #[serde(default)]
    pub wifi_password: String,
}

impl TerminalConfig {
    /// Whether enough is present to talk to the backend.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.server_url.is_empty() && !self.api_key.is_empty()
    }
}
