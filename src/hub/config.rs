//! Hub configuration

use std::time::Duration;

use crate::relay::DEFAULT_BOUNDARY;

/// Relay hub configuration options
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Period of the liveness sweep
    pub sweep_interval: Duration,

    /// Send START/STOP control messages on viewer attach/detach
    pub signaling: bool,

    /// Multipart boundary token
    pub boundary: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(30),
            signaling: false,
            boundary: DEFAULT_BOUNDARY.to_string(),
        }
    }
}

impl HubConfig {
    /// Set the liveness sweep period
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Enable or disable START/STOP signaling
    pub fn signaling(mut self, enabled: bool) -> Self {
        self.signaling = enabled;
        self
    }

    /// Set the multipart boundary token
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }
}
