use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the observer service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Seconds between two polls of the chain observer
    pub poll_interval_secs: u64,
    /// Buffer size for the event channel to the logic layer
    pub channel_buffer_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { poll_interval_secs: 5, channel_buffer_size: 100 }
    }
}

impl ServiceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(eyre::eyre!("poll_interval_secs must be at least 1"));
        }
        if self.channel_buffer_size == 0 {
            return Err(eyre::eyre!("channel_buffer_size must be at least 1"));
        }
        Ok(())
    }
}
