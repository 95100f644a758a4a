//! Configuration models that aggregate all settings.
//!
//! This module provides the `AppConfig` structure handed to sessions and
//! binaries once the settings file has been loaded and validated.

use mm_protocol::config_models::MonitorSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from the `.mentions-monitor/` directory.
///
/// # Example
///
/// ```rust,no_run
/// use mm_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Polling {} every {:?}",
///          config.settings.api_base_url,
///          config.status_poll_interval());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings from `config.toml`, after environment overrides.
    pub settings: MonitorSettings,

    /// The `.mentions-monitor/` directory, if one was found.
    pub config_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.settings.status_poll_interval_secs)
    }

    pub fn log_poll_interval(&self) -> Duration {
        Duration::from_secs(self.settings.log_poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs)
    }

    /// How long a completed record stays in the active set.
    ///
    /// Saturates for values too large to represent.
    pub fn retention(&self) -> chrono::Duration {
        i64::try_from(self.settings.retention_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }
}
