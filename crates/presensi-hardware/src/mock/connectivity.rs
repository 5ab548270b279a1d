//! Mock network link with a toggleable state.

use crate::{Result, traits::Connectivity};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock network link. Starts connected; toggled through the handle to
/// exercise the idle/network-error reconciliation.
#[derive(Debug)]
pub struct MockConnectivity {
    connected: Arc<AtomicBool>,
    ssid: String,
}

impl MockConnectivity {
    /// Create a new mock link (initially connected) and its handle.
    pub fn new(ssid: impl Into<String>) -> (Self, MockConnectivityHandle) {
        let connected = Arc::new(AtomicBool::new(true));
        let link = Self {
            connected: Arc::clone(&connected),
            ssid: ssid.into(),
        };
        (link, MockConnectivityHandle { connected })
    }
}

impl Connectivity for MockConnectivity {
    async fn is_connected(&self) -> Result<bool> {
        Ok(self.connected.load(Ordering::SeqCst))
    }

    fn ssid(&self) -> &str {
        &self.ssid
    }
}

/// Handle for toggling a [`MockConnectivity`] from tests.
#[derive(Debug, Clone)]
pub struct MockConnectivityHandle {
    connected: Arc<AtomicBool>,
}

impl MockConnectivityHandle {
    /// Set the link state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_toggle() {
        let (link, handle) = MockConnectivity::new("NISA 2.4");
        assert!(link.is_connected().await.unwrap());
        assert_eq!(link.ssid(), "NISA 2.4");

        handle.set_connected(false);
        assert!(!link.is_connected().await.unwrap());
    }
}
