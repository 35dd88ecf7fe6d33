//! Configuration loading, validation, and management for Choreboard.
//!
//! Loads configuration from `~/.choreboard/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use choreboard_core::Money;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.choreboard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine rules and limits
    #[serde(default)]
    pub engine: EngineConfig,

    /// Repository backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Activity feed
    #[serde(default)]
    pub activity: ActivityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// IANA name of the household's reference time zone, e.g.
    /// `"America/New_York"`. Recurrence intervals are counted in calendar
    /// days of this zone, across DST changes.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Longest accepted chore title, in characters
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,

    /// Longest accepted adjustment reason, in characters
    #[serde(default = "default_max_reason_len")]
    pub max_reason_len: usize,

    /// Largest reward a chore may promise, in cents
    #[serde(default = "default_max_reward_cents")]
    pub max_reward_cents: i64,

    /// Largest manual adjustment in either direction, in cents
    #[serde(default = "default_max_adjustment_cents")]
    pub max_adjustment_cents: i64,
}

fn default_time_zone() -> String {
    "UTC".into()
}
fn default_max_title_len() -> usize {
    100
}
fn default_max_reason_len() -> usize {
    200
}
fn default_max_reward_cents() -> i64 {
    100_00
}
fn default_max_adjustment_cents() -> i64 {
    1_000_00
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            max_title_len: default_max_title_len(),
            max_reason_len: default_max_reason_len(),
            max_reward_cents: default_max_reward_cents(),
            max_adjustment_cents: default_max_adjustment_cents(),
        }
    }
}

impl EngineConfig {
    /// The reference time zone for calendar-day arithmetic.
    pub fn time_zone(&self) -> Result<Tz, ConfigError> {
        self.time_zone.trim().parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "engine.time_zone '{}' is not a known time zone: {e}",
                self.time_zone
            ))
        })
    }

    pub fn max_reward(&self) -> Money {
        Money::from_cents(self.max_reward_cents)
    }

    pub fn max_adjustment(&self) -> Money {
        Money::from_cents(self.max_adjustment_cents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.time_zone()?;
        if self.max_title_len == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_title_len must be > 0".into(),
            ));
        }
        if self.max_reason_len == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_reason_len must be > 0".into(),
            ));
        }
        if self.max_reward_cents <= 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_reward_cents must be > 0".into(),
            ));
        }
        if self.max_adjustment_cents <= 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_adjustment_cents must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Which repository backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    AppConfig::config_dir().join("choreboard.sqlite")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Mirror every activity event to the tracing log
    #[serde(default = "default_true")]
    pub tracing: bool,

    /// Maximum events kept by the in-memory activity log
    #[serde(default = "default_retain")]
    pub retain: usize,
}

fn default_true() -> bool {
    true
}
fn default_retain() -> usize {
    5_000
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            tracing: true,
            retain: default_retain(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.choreboard/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load `path`, apply environment overrides, then validate.
    ///
    /// Environment overrides (highest priority):
    /// - `CHOREBOARD_DATABASE` — SQLite database path
    /// - `CHOREBOARD_TIME_ZONE` — reference time zone name
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("CHOREBOARD_DATABASE") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(zone) = var("CHOREBOARD_TIME_ZONE") {
            self.engine.time_zone = zone;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".choreboard")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.activity.retain == 0 {
            return Err(ConfigError::ValidationError(
                "activity.retain must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.max_reason_len, 200);
        assert_eq!(config.engine.max_reward(), Money::from_cents(10_000));
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert!(config.store.path.ends_with("choreboard.sqlite"));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.engine.max_title_len, config.engine.max_title_len);
        assert_eq!(parsed.store.path, config.store.path);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
[engine]
time_zone = "America/New_York"

[store]
backend = "memory"
"#,
        )
        .unwrap();
        assert_eq!(config.engine.time_zone, "America/New_York");
        assert_eq!(config.engine.max_title_len, 100);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.activity.tracing);
        assert_eq!(config.engine.time_zone().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.engine.max_adjustment(), Money::from_cents(100_000));
    }

    #[test]
    fn unknown_time_zone_rejected() {
        let config = AppConfig {
            engine: EngineConfig {
                time_zone: "Mars/Olympus".into(),
                ..EngineConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn non_positive_reward_cap_rejected() {
        let err = AppConfig::from_toml("[engine]\nmax_reward_cents = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_reward_cents"));

        let err = AppConfig::from_toml("[engine]\nmax_adjustment_cents = -1\n").unwrap_err();
        assert!(err.to_string().contains("max_adjustment_cents"));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = AppConfig::from_toml(
            "[engine]\ntime_zone = \"Europe/Berlin\"\n\n[store]\npath = \"/srv/a.sqlite\"\n",
        )
        .unwrap();
        config.apply_overrides(|name| match name {
            "CHOREBOARD_DATABASE" => Some("/srv/b.sqlite".into()),
            "CHOREBOARD_TIME_ZONE" => Some("Asia/Tokyo".into()),
            _ => None,
        });
        assert_eq!(config.store.path, PathBuf::from("/srv/b.sqlite"));
        assert_eq!(config.engine.time_zone().unwrap(), chrono_tz::Asia::Tokyo);

        config.apply_overrides(|_| Some("Nowhere/Special".into()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn unset_overrides_keep_file_values() {
        let mut config = AppConfig::from_toml("[engine]\ntime_zone = \"Europe/Berlin\"\n").unwrap();
        config.apply_overrides(|_| None);
        assert_eq!(config.engine.time_zone, "Europe/Berlin");
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.engine.time_zone().unwrap(), Tz::UTC);
    }

    #[test]
    fn load_from_file_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine\nbroken").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        match err {
            ConfigError::ParseError { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn load_from_file_reads_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[activity]\nretain = 10\ntracing = false\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.activity.retain, 10);
        assert!(!config.activity.tracing);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("max_reason_len = 200"));
        assert!(toml_str.contains("time_zone = \"UTC\""));
        assert!(toml_str.contains("max_adjustment_cents = 100000"));
        assert!(toml_str.contains("backend = \"sqlite\""));
    }
}
