//! Process configuration, assembled once at start-up.
//!
//! Precedence: explicit overrides (CLI), then environment, then an optional
//! TOML file, then built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://learn.sqlite3";
pub const DEFAULT_MEDIA_BASE_URL: &str = "http://localhost:8080";

pub const ENV_DATABASE_URL: &str = "LEARN_DB_URL";
pub const ENV_MEDIA_BASE_URL: &str = "LEARN_MEDIA_BASE_URL";
pub const ENV_LOG: &str = "LEARN_LOG";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid media base url {value:?}: {source}")]
    InvalidMediaUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("database url cannot be empty")]
    EmptyDatabaseUrl,
}

/// Values supplied on the command line; `None` defers to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub media_base_url: Option<String>,
    pub log_filter: Option<String>,
}

/// Shape of the optional TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    database_url: Option<String>,
    media_base_url: Option<String>,
    log: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub media_base_url: Url,
    /// `EnvFilter` directive; `None` means the binary's default.
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Build the configuration from overrides, the process environment and
    /// the optional config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or a value
    /// is invalid.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::load_with(overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or a value
    /// is invalid.
    pub fn load_with(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match overrides.config_path.as_deref() {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let database_url = overrides
            .database_url
            .or_else(|| lookup(ENV_DATABASE_URL))
            .or(file.database_url)
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        let database_url = database_url.trim().to_owned();
        if database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        let media_raw = overrides
            .media_base_url
            .or_else(|| lookup(ENV_MEDIA_BASE_URL))
            .or(file.media_base_url)
            .unwrap_or_else(|| DEFAULT_MEDIA_BASE_URL.to_owned());
        let media_base_url =
            Url::parse(media_raw.trim()).map_err(|source| ConfigError::InvalidMediaUrl {
                value: media_raw.clone(),
                source,
            })?;

        let log_filter = overrides
            .log_filter
            .or_else(|| lookup(ENV_LOG))
            .or(file.log);

        Ok(Self {
            database_url,
            media_base_url,
            log_filter,
        })
    }

    /// Defaults only; handy for tests and in-memory runs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only if the built-in defaults are invalid.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::load_with(ConfigOverrides::default(), |_| None)
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{name}-{}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::defaults().unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.media_base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn overrides_beat_env_and_env_beats_file() {
        let path = write_temp(
            "learn-config-precedence",
            r#"
            database_url = "sqlite://from-file.sqlite3"
            media_base_url = "https://file.example.com"
            log = "warn"
            "#,
        );
        let overrides = ConfigOverrides {
            config_path: Some(path.clone()),
            database_url: Some("sqlite::memory:".into()),
            ..ConfigOverrides::default()
        };
        let env = env_of(&[(ENV_MEDIA_BASE_URL, "https://env.example.com")]);

        let config = AppConfig::load_with(overrides, env).unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.media_base_url.as_str(), "https://env.example.com/");
        assert_eq!(config.log_filter.as_deref(), Some("warn"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let env = env_of(&[(ENV_DATABASE_URL, "   ")]);
        let config = AppConfig::load_with(ConfigOverrides::default(), env).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn invalid_media_url_is_rejected() {
        let env = env_of(&[(ENV_MEDIA_BASE_URL, "not a url")]);
        let err = AppConfig::load_with(ConfigOverrides::default(), env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMediaUrl { .. }));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let path = write_temp("learn-config-unknown", "jwt_secret = \"x\"\n");
        let overrides = ConfigOverrides {
            config_path: Some(path.clone()),
            ..ConfigOverrides::default()
        };
        let err = AppConfig::load_with(overrides, |_| None).unwrap_err();
        std::fs::remove_file(path).ok();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let overrides = ConfigOverrides {
            config_path: Some(PathBuf::from("/definitely/not/here.toml")),
            ..ConfigOverrides::default()
        };
        let err = AppConfig::load_with(overrides, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
