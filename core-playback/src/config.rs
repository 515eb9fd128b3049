//! # Engine Configuration
//!
//! Timing, healing and volume settings for the playback engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Period of the position sync poller.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Healing attempts allowed per track lineage (a substitute shares the
    /// counter of the track it replaced).
    ///
    /// Default: 2.
    #[serde(default = "default_max_heal_attempts")]
    pub max_heal_attempts: u32,

    /// Remote error codes meaning "blocked or restricted"; these trigger
    /// healing instead of a stall.
    ///
    /// Default: `[101, 150]`.
    #[serde(default = "default_blocked_error_codes")]
    pub blocked_error_codes: Vec<i32>,

    /// Delay between streaming SDK readiness checks.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_sdk_retry_interval")]
    pub sdk_retry_interval: Duration,

    /// Readiness checks before giving up with `AdapterInitTimeout`.
    ///
    /// Default: 50.
    #[serde(default = "default_sdk_max_attempts")]
    pub sdk_max_attempts: u32,

    /// Volume used when nothing is persisted and when unmuting from a
    /// session that started muted.
    ///
    /// Default: 80.
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    /// Settings key holding the persisted volume.
    #[serde(default = "default_volume_key")]
    pub volume_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_heal_attempts: default_max_heal_attempts(),
            blocked_error_codes: default_blocked_error_codes(),
            sdk_retry_interval: default_sdk_retry_interval(),
            sdk_max_attempts: default_sdk_max_attempts(),
            default_volume: default_volume(),
            volume_key: default_volume_key(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be > 0".to_string());
        }

        if self.sdk_max_attempts == 0 {
            return Err("sdk_max_attempts must be > 0".to_string());
        }

        if self.default_volume > 100 {
            return Err("default_volume must be between 0 and 100".to_string());
        }

        if self.volume_key.trim().is_empty() {
            return Err("volume_key cannot be empty".to_string());
        }

        Ok(())
    }

    /// `true` when a remote error `code` means the asset is blocked.
    pub fn is_blocked_code(&self, code: i32) -> bool {
        self.blocked_error_codes.contains(&code)
    }

    /// Upper bound on the time spent waiting for the streaming SDK.
    pub fn sdk_wait_budget(&self) -> Duration {
        self.sdk_retry_interval.saturating_mul(self.sdk_max_attempts)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_max_heal_attempts() -> u32 {
    2
}

fn default_blocked_error_codes() -> Vec<i32> {
    vec![101, 150]
}

fn default_sdk_retry_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_sdk_max_attempts() -> u32 {
    50
}

fn default_volume() -> u8 {
    80
}

fn default_volume_key() -> String {
    "vs_volume".to_string()
}
