//! Application configuration.
//!
//! Settings are layered with the `config` crate: an optional TOML file is
//! read first and `SAMARITAN__*` environment variables override it, using
//! `__` as the section separator (for example `SAMARITAN__DATABASE__URL`).

use crate::identity::{
    domain::RoleMappingError,
    services::{ClaimsConfig, ClaimsResolver},
};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Prefix of environment variables read by [`SamaritanConfig::load`].
pub const ENV_PREFIX: &str = "SAMARITAN";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamaritanConfig {
    /// Claim layout and role mapping of the identity provider.
    pub identity: ClaimsConfig,
    /// `PostgreSQL` connection settings.
    pub database: DatabaseConfig,
    /// Log filter and output format.
    pub logging: LoggingConfig,
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub connect_timeout_secs: u64,
    /// Milliseconds after which a join, leave or status update is aborted.
    pub statement_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/samaritan".to_owned(),
            max_connections: 10,
            connect_timeout_secs: 5,
            statement_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    /// Returns the pool checkout timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the per-transaction statement timeout.
    #[must_use]
    pub const fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

/// Log filter and output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A configuration source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    /// The identity section is inconsistent.
    #[error("invalid identity configuration: {0}")]
    Identity(#[from] RoleMappingError),

    /// The database URL is blank.
    #[error("database url must not be empty")]
    BlankDatabaseUrl,

    /// The pool size is zero.
    #[error("database max_connections must be at least 1")]
    EmptyPool,

    /// The statement timeout is zero.
    #[error("database statement_timeout_ms must be at least 1")]
    ZeroStatementTimeout,
}

impl SamaritanConfig {
    /// Loads configuration from an optional TOML file overlaid with
    /// `SAMARITAN__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Load`] when a source cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        Self::load_with_environment(path, environment())
    }

    /// Loads configuration from an optional TOML file overlaid with the
    /// given environment source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Load`] when a source cannot be parsed.
    pub fn load_with_environment(
        path: Option<&Path>,
        environment: Environment,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = Config::builder();
        if let Some(file) = path {
            builder = builder.add_source(File::from(file).format(FileFormat::Toml));
        }
        let settings = builder.add_source(environment).build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses configuration from TOML text without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Load`] when the text is not valid TOML
    /// or does not match the configuration shape.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Checks every section and builds the claims resolver, so that
    /// misconfiguration fails at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Identity`] for an inconsistent role
    /// mapping or claim layout, and the database variants for unusable
    /// connection settings.
    pub fn validate(&self) -> Result<ClaimsResolver, ConfigurationError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::BlankDatabaseUrl);
        }
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::EmptyPool);
        }
        if self.database.statement_timeout_ms == 0 {
            return Err(ConfigurationError::ZeroStatementTimeout);
        }
        Ok(ClaimsResolver::new(&self.identity)?)
    }
}

/// Returns the `SAMARITAN__*` environment source used by
/// [`SamaritanConfig::load`].
#[must_use]
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
