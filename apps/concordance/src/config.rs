//! # Configuration
//!
//! Settings are resolved from four layers, highest priority first:
//!
//! 1. CLI flags
//! 2. Environment (`CONCORDANCE_API_KEY`, `CONCORDANCE_RATE_LIMIT`)
//! 3. An optional TOML file passed with `--config`
//! 4. Built-in defaults
//!
//! ## File Format
//!
//! ```toml
//! database = "concordance.redb"
//! backend = "redb"
//! host = "0.0.0.0"
//! port = 8080
//! rate_limit = 100
//! ```

use crate::AppError;
use concordance_core::StorageBackend;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "CONCORDANCE_API_KEY";
pub const RATE_LIMIT_ENV: &str = "CONCORDANCE_RATE_LIMIT";

const DEFAULT_DATABASE: &str = "concordance.redb";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Which store adapter to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process-local graph, lost on exit.
    Memory,
    /// ACID redb database file.
    #[default]
    Redb,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
        }
    }
}

// =============================================================================
// FILE LAYER
// =============================================================================

/// The optional TOML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub rate_limit: Option<u32>,
}

impl FileConfig {
    /// Parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("read {}: {}", path.display(), e)))?;
        Self::parse(&raw).map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| AppError::Config(e.to_string()))
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Values supplied on the command line. `None` defers to lower layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub rate_limit: Option<u32>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Bearer token; `None` disables authentication.
    pub api_key: Option<String>,
}

impl Settings {
    /// Merge the layers. `env` looks up an environment variable.
    pub fn resolve(
        cli: Overrides,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let env_rate_limit = env(RATE_LIMIT_ENV)
            .map(|raw| {
                raw.trim().parse::<u32>().map_err(|_| {
                    AppError::Config(format!("{} must be a number, got {:?}", RATE_LIMIT_ENV, raw))
                })
            })
            .transpose()?;

        Ok(Self {
            database: cli
                .database
                .or(file.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            backend: cli.backend.or(file.backend).unwrap_or_default(),
            host: cli
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            rate_limit: cli
                .rate_limit
                .or(env_rate_limit)
                .or(file.rate_limit)
                .unwrap_or(DEFAULT_RATE_LIMIT),
            api_key: env(API_KEY_ENV).filter(|k| !k.is_empty()),
        })
    }

    /// Resolve against the process environment, reading `config` if given.
    pub fn load(cli: Overrides, config: Option<&Path>) -> Result<Self, AppError> {
        let file = config.map(FileConfig::load).transpose()?.unwrap_or_default();
        Self::resolve(cli, file, |key| std::env::var(key).ok())
    }

    /// Open the configured store.
    pub fn open_store(&self) -> Result<StorageBackend, AppError> {
        match self.backend {
            Backend::Memory => Ok(StorageBackend::default()),
            Backend::Redb => Ok(StorageBackend::redb(&self.database)?),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings =
            Settings::resolve(Overrides::default(), FileConfig::default(), env_of(&[]))
                .expect("resolve");
        assert_eq!(settings.database, PathBuf::from("concordance.redb"));
        assert_eq!(settings.backend, Backend::Redb);
        assert_eq!(settings.addr(), "127.0.0.1:8080");
        assert_eq!(settings.rate_limit, 100);
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn file_is_parsed() {
        let file = FileConfig::parse(
            r#"
            database = "/var/lib/concordance.redb"
            backend = "memory"
            host = "0.0.0.0"
            port = 9000
            rate_limit = 5
            "#,
        )
        .expect("parse");
        assert_eq!(file.backend, Some(Backend::Memory));
        assert_eq!(file.port, Some(9000));
        assert_eq!(file.rate_limit, Some(5));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(matches!(
            FileConfig::parse("colour = \"blue\""),
            Err(AppError::Config(_))
        ));
        assert!(FileConfig::parse("backend = \"postgres\"").is_err());
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file = FileConfig {
            port: Some(9000),
            rate_limit: Some(5),
            ..FileConfig::default()
        };
        let env = env_of(&[(RATE_LIMIT_ENV, "50"), (API_KEY_ENV, "secret")]);

        let settings =
            Settings::resolve(Overrides::default(), file.clone(), &env).expect("resolve");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.rate_limit, 50);
        assert_eq!(settings.api_key.as_deref(), Some("secret"));

        let cli = Overrides {
            rate_limit: Some(0),
            port: Some(7000),
            ..Overrides::default()
        };
        let settings = Settings::resolve(cli, file, &env).expect("resolve");
        assert_eq!(settings.port, 7000);
        assert_eq!(settings.rate_limit, 0);
    }

    #[test]
    fn malformed_rate_limit_env_is_an_error() {
        let result = Settings::resolve(
            Overrides::default(),
            FileConfig::default(),
            env_of(&[(RATE_LIMIT_ENV, "fast")]),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let settings = Settings::resolve(
            Overrides::default(),
            FileConfig::default(),
            env_of(&[(API_KEY_ENV, "")]),
        )
        .expect("resolve");
        assert!(settings.api_key.is_none());
    }
}
