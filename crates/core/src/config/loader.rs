//! Configuration file loader for the `.mentions-monitor/` directory.
//!
//! This module loads `.mentions-monitor/config.toml`, applies environment
//! overrides and validates the result.

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use mm_protocol::config_models::MonitorSettings;
use std::path::Path;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".mentions-monitor";

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "MENTIONS_API_URL";

/// Ten years; anything longer is a typo.
pub const MAX_RETENTION_HOURS: u64 = 24 * 365 * 10;

/// Loads configuration from the `.mentions-monitor/` directory.
///
/// # Arguments
///
/// * `root` - Directory containing the `.mentions-monitor/` folder
///
/// # Returns
///
/// An `AppConfig` with the loaded settings. A missing directory or a missing
/// `config.toml` yields the default settings rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - `config.toml` exists but cannot be read
/// - `config.toml` has invalid TOML syntax
/// - A setting fails validation (zero interval, unparsable URL)
///
/// # Example
///
/// ```rust,no_run
/// use mm_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Backend at {}", config.settings.api_base_url);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    load_config_with_env(root, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with_env<F>(root: &Path, env: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mm_dir = root.join(CONFIG_DIR);

    let mut settings = if mm_dir.exists() {
        load_settings(&mm_dir)?
    } else {
        MonitorSettings::default()
    };

    if let Some(url) = env(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
        settings.api_base_url = url;
    }

    validate_settings(&settings, &mm_dir.join("config.toml"))?;

    Ok(AppConfig {
        settings,
        config_dir: mm_dir.exists().then_some(mm_dir),
    })
}

/// Loads settings from `config.toml`.
fn load_settings(mm_dir: &Path) -> ConfigResult<MonitorSettings> {
    let config_path = mm_dir.join("config.toml");

    // If config.toml doesn't exist, return default
    if !config_path.exists() {
        return Ok(MonitorSettings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: MonitorSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path,
            source,
        })?;

    Ok(settings)
}

/// Rejects settings that would stall or break polling.
pub fn validate_settings(settings: &MonitorSettings, path: &Path) -> ConfigResult<()> {
    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: path.to_path_buf(),
        reason,
    };

    if settings.status_poll_interval_secs == 0 {
        return Err(invalid("status_poll_interval_secs must be positive".to_string()));
    }
    if settings.log_poll_interval_secs == 0 {
        return Err(invalid("log_poll_interval_secs must be positive".to_string()));
    }
    if settings.request_timeout_secs == 0 {
        return Err(invalid("request_timeout_secs must be positive".to_string()));
    }
    if settings.retention_hours > MAX_RETENTION_HOURS {
        return Err(invalid(format!(
            "retention_hours must be at most {}",
            MAX_RETENTION_HOURS
        )));
    }
    if let Err(e) = reqwest::Url::parse(&settings.api_base_url) {
        return Err(invalid(format!(
            "api_base_url '{}' is not a valid URL: {}",
            settings.api_base_url, e
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[tokio::test]
    async fn test_load_config_full_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let mm_dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&mm_dir).expect("Failed to create config dir");

        let config_toml = r#"
api_base_url = "http://backend:9000"
status_poll_interval_secs = 2
log_poll_interval_secs = 3
retention_hours = 12
request_timeout_secs = 10
default_limit = 250
all_steps = false
"#;
        fs::write(mm_dir.join("config.toml"), config_toml).expect("Failed to write config.toml");

        let config = load_config_with_env(root, no_env).expect("Failed to load config");

        assert_eq!(config.settings.api_base_url, "http://backend:9000");
        assert_eq!(config.settings.status_poll_interval_secs, 2);
        assert_eq!(config.settings.log_poll_interval_secs, 3);
        assert_eq!(config.settings.default_limit, 250);
        assert!(!config.settings.all_steps);
        assert_eq!(config.retention(), chrono::Duration::hours(12));
        assert_eq!(config.config_dir.as_deref(), Some(mm_dir.as_path()));
    }

    #[tokio::test]
    async fn test_load_config_empty_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config(dir.path())
            .await
            .expect("Should handle missing .mentions-monitor");

        assert_eq!(config.settings.status_poll_interval_secs, 5);
        assert_eq!(config.settings.retention_hours, 24);
        assert!(config.config_dir.is_none());
    }

    #[tokio::test]
    async fn test_load_config_partial() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mm_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&mm_dir).expect("Failed to create config dir");
        fs::write(mm_dir.join("config.toml"), "retention_hours = 48")
            .expect("Failed to write config.toml");

        let config = load_config_with_env(dir.path(), no_env).expect("Should handle partial config");

        assert_eq!(config.settings.retention_hours, 48);
        assert_eq!(config.settings.api_base_url, "http://localhost:8000");
        assert_eq!(config.settings.default_limit, 100);
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mm_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&mm_dir).expect("Failed to create config dir");
        fs::write(mm_dir.join("config.toml"), "retention_hours = [invalid toml")
            .expect("Failed to write config.toml");

        let result = load_config_with_env(dir.path(), no_env);

        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("config.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_interval() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mm_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&mm_dir).expect("Failed to create config dir");
        fs::write(mm_dir.join("config.toml"), "status_poll_interval_secs = 0")
            .expect("Failed to write config.toml");

        let result = load_config_with_env(dir.path(), no_env);

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("status_poll_interval_secs"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_huge_retention() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mm_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&mm_dir).expect("Failed to create config dir");
        fs::write(mm_dir.join("config.toml"), "retention_hours = 9223372036854775807")
            .expect("Failed to write config.toml");

        let result = load_config_with_env(dir.path(), no_env);

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("retention_hours"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[test]
    fn test_retention_saturates_instead_of_panicking() {
        let mut config = AppConfig::default();
        config.settings.retention_hours = u64::MAX;

        assert_eq!(config.retention(), chrono::Duration::MAX);
    }

    #[tokio::test]
    async fn test_load_config_rejects_bad_url() {
        let dir = tempdir().expect("Failed to create temp dir");

        let result = load_config_with_env(dir.path(), |key| {
            (key == API_URL_ENV).then(|| "not a url".to_string())
        });

        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_env_overrides_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mm_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&mm_dir).expect("Failed to create config dir");
        fs::write(mm_dir.join("config.toml"), "api_base_url = \"http://from-file:8000\"")
            .expect("Failed to write config.toml");

        let config = load_config_with_env(dir.path(), |key| {
            (key == API_URL_ENV).then(|| "http://from-env:8000".to_string())
        })
        .expect("Failed to load config");

        assert_eq!(config.settings.api_base_url, "http://from-env:8000");
    }
}
