//! # hs-config
//!
//! Runtime settings for the server binary. Sources, later ones winning:
//! built-in defaults, an optional `hostel-solve.toml`, then `HOSTEL__*`
//! environment variables (`HOSTEL__SERVER__PORT=8080`). A `.env` file in the
//! working directory is loaded into the environment first.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "hostel-solve.toml";
const ENV_PREFIX: &str = "HOSTEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub local_store: LocalStoreSettings,
    /// Seed demo accounts (and issues, for the local store) on startup.
    pub demo_data: bool,
    pub log: LogSettings,
    /// The `.env` file that was applied, if one was found.
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "secret_string")]
    pub url: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalStoreSettings {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub format: LogFormat,
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Loads `.env`, then reads settings from [`DEFAULT_CONFIG_FILE`] and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = dotenvy::dotenv().ok();
        let mut settings = Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?;
        settings.env_file = env_file;
        Ok(settings)
    }

    /// Reads settings from `path` (if it exists) layered over the defaults,
    /// with environment variables on top.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000_i64)?
            .set_default("server.static_dir", "static")?
            .set_default("database.url", "sqlite://hostel-solve.db")?
            .set_default("local_store.root", "data")?
            .set_default("demo_data", true)?
            .set_default("log.filter", "info,sqlx=warn")?
            .set_default("log.format", "pretty")?
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "server.host",
                reason: "must not be empty".into(),
            });
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                key: "server.port",
                reason: "must be between 1 and 65535".into(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
