//! Settings models for `.mentions-monitor/config.toml`.
//!
//! This module defines the structure of the settings file that controls
//! where the backend lives and how often it is polled.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Represents settings from `.mentions-monitor/config.toml`.
///
/// Every field is optional in the file; missing fields take the defaults
/// the dashboard has always used.
///
/// # Example
///
/// ```toml
/// # .mentions-monitor/config.toml
/// api_base_url = "http://localhost:8000"
/// status_poll_interval_secs = 5
/// retention_hours = 24
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct MonitorSettings {
    /// Base URL of the mentions backend.
    pub api_base_url: String,

    /// Seconds between two status poll ticks.
    pub status_poll_interval_secs: u64,

    /// Seconds between two log fetches for the selected company.
    pub log_poll_interval_secs: u64,

    /// Hours a completed record stays visible after its last update.
    pub retention_hours: u64,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Default mention limit for new pipeline runs.
    pub default_limit: u32,

    /// Whether new pipeline runs execute every step.
    pub all_steps: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            status_poll_interval_secs: 5,
            log_poll_interval_secs: 5,
            retention_hours: 24,
            request_timeout_secs: 30,
            default_limit: 100,
            all_steps: true,
        }
    }
}
