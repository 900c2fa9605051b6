//! Hub configuration.

use serde::{Deserialize, Serialize};

/// Settings for the broadcast hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Capacity of each connection's outbound queue. A connection whose
    /// queue is full when a frame arrives is disconnected.
    pub outbound_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
        }
    }
}

impl HubConfig {
    /// Returns a copy with `outbound_capacity` forced to at least 1
    /// (`tokio::sync::mpsc::channel` panics on zero).
    pub fn validated(mut self) -> Self {
        if self.outbound_capacity == 0 {
            tracing::warn!("outbound_capacity of 0 is invalid, using 1");
            self.outbound_capacity = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_config_default() {
        assert_eq!(HubConfig::default().outbound_capacity, 256);
    }

    #[test]
    fn test_validated_clamps_zero_capacity() {
        let cfg = HubConfig { outbound_capacity: 0 }.validated();
        assert_eq!(cfg.outbound_capacity, 1);
    }
}
