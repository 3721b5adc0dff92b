use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub provider: ProviderConfig,

    pub cache: CacheConfig,

    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/foodcache.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,

    /// Overridden by `FOODCACHE_APP_ID` when set.
    pub app_id: String,

    /// Overridden by `FOODCACHE_APP_KEY` when set.
    #[serde(skip_serializing)]
    pub app_key: String,

    /// Per-request timeout in seconds (default: 10). Expiry counts as the
    /// provider being unavailable.
    pub request_timeout_seconds: u32,

    /// Maximum number of foods kept from one search response
    pub search_limit: usize,

    pub autocomplete_limit: usize,

    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.edamam.com".to_string(),
            app_id: String::new(),
            app_key: String::new(),
            request_timeout_seconds: 10,
            search_limit: 20,
            autocomplete_limit: 10,
            user_agent: format!("foodcache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Food metadata changes rarely (default: 90 days)
    pub food_retention_days: u32,

    /// Search rankings drift upstream (default: 168 hours)
    pub search_retention_hours: u32,

    /// Prefix completions churn fast (default: 24 hours)
    pub autocomplete_retention_hours: u32,

    /// Rows deleted per sweep statement (default: 500)
    pub sweep_batch_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            food_retention_days: 90,
            search_retention_hours: 7 * 24,
            autocomplete_retention_hours: 24,
            sweep_batch_size: 500,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn food_retention(&self) -> Duration {
        Duration::days(i64::from(self.food_retention_days))
    }

    #[must_use]
    pub fn search_retention(&self) -> Duration {
        Duration::hours(i64::from(self.search_retention_hours))
    }

    #[must_use]
    pub fn autocomplete_retention(&self) -> Duration {
        Duration::hours(i64::from(self.autocomplete_retention_hours))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    pub sweep_interval_minutes: u32,

    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_minutes: 60,
            cron_expression: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Port for the Prometheus scrape endpoint; no listener when unset.
    pub metrics_port: Option<u16>,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "foodcache".to_string());

        Self {
            metrics_enabled: true,
            metrics_port: None,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Provider credentials from the environment (or `.env`) win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(app_id) = std::env::var("FOODCACHE_APP_ID") {
            self.provider.app_id = app_id;
        }
        if let Ok(app_key) = std::env::var("FOODCACHE_APP_KEY") {
            self.provider.app_key = app_key;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("foodcache").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".foodcache").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.is_empty() {
            anyhow::bail!("Provider base URL cannot be empty");
        }

        if self.provider.request_timeout_seconds == 0 {
            anyhow::bail!("Provider request timeout must be > 0");
        }

        if self.cache.food_retention_days == 0
            || self.cache.search_retention_hours == 0
            || self.cache.autocomplete_retention_hours == 0
        {
            anyhow::bail!("Cache retention windows must be > 0");
        }

        if self.cache.sweep_batch_size == 0 {
            anyhow::bail!("Sweep batch size must be > 0");
        }

        if self.scheduler.enabled
            && self.scheduler.sweep_interval_minutes == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler interval must be > 0 or cron expression must be set");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.food_retention_days, 90);
        assert_eq!(config.cache.search_retention_hours, 168);
        assert_eq!(config.cache.autocomplete_retention_hours, 24);
        assert_eq!(config.scheduler.sweep_interval_minutes, 60);
        assert_eq!(config.provider.base_url, "https://api.edamam.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retention_windows_are_ordered() {
        let cache = CacheConfig::default();
        assert!(cache.food_retention() > cache.search_retention());
        assert!(cache.search_retention() > cache.autocomplete_retention());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.provider.app_key = "secret".to_string();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[provider]"));
        assert!(toml_str.contains("[cache]"));
        assert!(!toml_str.contains("secret"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [cache]
            autocomplete_retention_hours = 6
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.cache.autocomplete_retention_hours, 6);

        assert_eq!(config.cache.food_retention_days, 90);
        assert_eq!(config.provider.search_limit, 20);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.cache.sweep_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.search_retention_hours = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.sweep_interval_minutes = 0;
        assert!(config.validate().is_err());
        config.scheduler.cron_expression = Some("0 */5 * * * *".to_string());
        assert!(config.validate().is_ok());
    }
}
