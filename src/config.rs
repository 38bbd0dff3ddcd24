//! System configuration parameters
//!
//! All tunable parameters for the EnvHub controller. Values are plain data
//! so deployments can override them from a JSON blob at provisioning time.

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Origin tag stamped on every outbound telemetry record.
    pub origin: String,

    // --- Blink / update cadence ---
    /// Selectable blink intervals (seconds), cycled by the rate button and
    /// addressed by the remote desired-state index.
    pub blink_intervals_secs: [u64; 3],
    /// Blink period applied at boot, before any selection is made.
    pub initial_blink_secs: u64,

    // --- Indicators ---
    /// How long the send/receive indicator stays lit per flash (milliseconds).
    pub flash_duration_ms: u64,

    // --- Timing ---
    /// Digital input poll interval (milliseconds).
    pub input_poll_interval_ms: u64,
    /// Cloud client service interval (seconds).
    pub cloud_work_interval_secs: u64,
    /// Status display / presence sampling interval (seconds).
    pub status_refresh_secs: u64,

    // --- Presence ---
    /// Light level (millivolts) at or above which presence is reported.
    pub presence_threshold_mv: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            origin: "Sphere".to_string(),

            // Blink / update cadence
            blink_intervals_secs: [120, 3600, 7200],
            initial_blink_secs: 10,

            // Indicators
            flash_duration_ms: 150,

            // Timing
            input_poll_interval_ms: 1,
            cloud_work_interval_secs: 1,
            status_refresh_secs: 1,

            // Presence
            presence_threshold_mv: 1500.0,
        }
    }
}

impl SystemConfig {
    /// Blink interval for a (pre-clamped) index.
    pub fn blink_interval(&self, index: usize) -> Duration {
        Duration::from_secs(self.blink_intervals_secs[index % self.blink_intervals_secs.len()])
    }

    pub fn initial_blink(&self) -> Duration {
        Duration::from_secs(self.initial_blink_secs)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    pub fn input_poll_interval(&self) -> Duration {
        Duration::from_millis(self.input_poll_interval_ms)
    }

    pub fn cloud_work_interval(&self) -> Duration {
        Duration::from_secs(self.cloud_work_interval_secs)
    }

    pub fn status_refresh(&self) -> Duration {
        Duration::from_secs(self.status_refresh_secs)
    }
}
