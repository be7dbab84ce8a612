//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and retry settings for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Deadline for each read attempt (ms)
    pub read_timeout_ms: u64,
    /// Attempts per request, including the first
    pub attempts: u32,
    /// Pause after each successful write (ms)
    pub post_write_delay_ms: u64,
    /// Wait for acknowledgements of write-only commands
    pub confirm_acks: bool,
}

impl SessionConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn post_write_delay(&self) -> Duration {
        Duration::from_millis(self.post_write_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 100,
            attempts: 3,
            post_write_delay_ms: 80,
            confirm_acks: false,
        }
    }
}
