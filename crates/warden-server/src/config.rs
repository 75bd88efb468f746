//! Configuration loading and typed config structures for the Warden server.
//!
//! The configuration lives in `warden-config.yaml` next to the binary
//! (or wherever `WARDEN_CONFIG` points). Every section has defaults, so
//! a missing or empty file still yields a runnable server.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use warden_logs::DEFAULT_LOG_EXTENSION;
use warden_logs::tokenizer::{DEFAULT_ENTER_MARKER, DEFAULT_EXIT_MARKER, EventMarkers};

use crate::server::ServerConfig;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "warden-config.yaml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "WARDEN_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but cannot be used.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
///
/// Mirrors the structure of `warden-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WardenConfig {
    /// Listen address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Directories and files the server reads and writes.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Admin log grammar.
    #[serde(default)]
    pub logs: LogsConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WardenConfig {
    /// Load configuration from a YAML file.
    ///
    /// After parsing, environment variable overrides are applied:
    /// - `WARDEN_HOST` and `WARDEN_PORT` override `server`
    /// - `WARDEN_LOGS_DIR`, `WARDEN_DATA_DIR`, `WARDEN_CHANGELOG` and
    ///   `WARDEN_GROUP_MAP` override `paths`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `WARDEN_CONFIG` or [`DEFAULT_CONFIG_FILE`], falling back
    /// to defaults (plus environment overrides) when the file is absent.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        if path.exists() {
            let config = Self::from_file(&path)?;
            Ok((config, Some(path)))
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok((config, None))
        }
    }

    fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override fields from the process environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("WARDEN_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("WARDEN_PORT")
            && let Ok(port) = val.trim().parse()
        {
            self.server.port = port;
        }
        if let Some(val) = lookup("WARDEN_LOGS_DIR") {
            self.paths.logs_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("WARDEN_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("WARDEN_CHANGELOG") {
            self.paths.changelog = PathBuf::from(val);
        }
        if let Some(val) = lookup("WARDEN_GROUP_MAP") {
            self.paths.group_map = PathBuf::from(val);
        }
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logs.extension.trim_start_matches('.').trim().is_empty() {
            return Err(ConfigError::Invalid("logs.extension is empty".to_owned()));
        }
        for (key, pattern) in [
            ("logs.enter_marker", &self.logs.enter_marker),
            ("logs.exit_marker", &self.logs.exit_marker),
        ] {
            Regex::new(pattern).map_err(|e| ConfigError::Invalid(format!("{key}: {e}")))?;
        }
        Ok(())
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathsConfig {
    /// Root of the admin log tree.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Root that group folders are resolved against.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Changelog file.
    #[serde(default = "default_changelog")]
    pub changelog: PathBuf,

    /// JSON file mapping group names to folders under `data_dir`.
    #[serde(default = "default_group_map")]
    pub group_map: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: default_logs_dir(),
            data_dir: default_data_dir(),
            changelog: default_changelog(),
            group_map: default_group_map(),
        }
    }
}

/// Admin log settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogsConfig {
    /// Log file extension, with or without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Regular expression marking a stash being buried.
    #[serde(default = "default_enter_marker")]
    pub enter_marker: String,

    /// Regular expression marking a stash being dug up.
    #[serde(default = "default_exit_marker")]
    pub exit_marker: String,
}

impl LogsConfig {
    /// The configured markers.
    pub fn markers(&self) -> EventMarkers {
        EventMarkers {
            enter: self.enter_marker.clone(),
            exit: self.exit_marker.clone(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            enter_marker: default_enter_marker(),
            exit_marker: default_exit_marker(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("mpmissions")
}

fn default_changelog() -> PathBuf {
    PathBuf::from("changelog.txt")
}

fn default_group_map() -> PathBuf {
    PathBuf::from("groups.json")
}

fn default_extension() -> String {
    DEFAULT_LOG_EXTENSION.to_owned()
}

fn default_enter_marker() -> String {
    DEFAULT_ENTER_MARKER.to_owned()
}

fn default_exit_marker() -> String {
    DEFAULT_EXIT_MARKER.to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WardenConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logs.extension, "ADM");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_is_defaults() {
        let config = WardenConfig::parse_without_env("   \n").unwrap();
        assert_eq!(config, WardenConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r#"
server:
  port: 9000
paths:
  logs_dir: "/srv/dayz/profiles"
logs:
  extension: ".adm"
"#;
        let config = WardenConfig::parse_without_env(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.paths.logs_dir, PathBuf::from("/srv/dayz/profiles"));
        assert_eq!(config.paths.changelog, PathBuf::from("changelog.txt"));
        assert_eq!(config.logs.extension, ".adm");
        assert_eq!(config.logs.enter_marker, DEFAULT_ENTER_MARKER);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = WardenConfig::parse_without_env("server: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn overrides_replace_values() {
        let vars: BTreeMap<&str, &str> = [
            ("WARDEN_HOST", "127.0.0.1"),
            ("WARDEN_PORT", "9100"),
            ("WARDEN_LOGS_DIR", "/logs"),
            ("WARDEN_GROUP_MAP", "/etc/groups.json"),
        ]
        .into_iter()
        .collect();
        let mut config = WardenConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| (*v).to_owned()));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.paths.logs_dir, PathBuf::from("/logs"));
        assert_eq!(config.paths.group_map, PathBuf::from("/etc/groups.json"));
        assert_eq!(config.paths.data_dir, PathBuf::from("mpmissions"));
    }

    #[test]
    fn unparseable_port_override_is_ignored() {
        let mut config = WardenConfig::default();
        config.apply_overrides(|key| (key == "WARDEN_PORT").then(|| "eighty".to_owned()));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut config = WardenConfig::default();
        config.logs.extension = ".".to_owned();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = WardenConfig::default();
        config.logs.exit_marker = "(unclosed".to_owned();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
