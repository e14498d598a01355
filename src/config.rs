//! Configuration management for the soil sample service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when `SOIL_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Model artifact shipped with the crate
pub const DEFAULT_MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/artifacts/model.onnx");

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Relational store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL; `DATABASE_URL` overrides it
    pub url: String,
    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://soil.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Prediction model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Mount the prediction endpoint
    pub enabled: bool,
    /// Path to the ONNX artifact
    pub path: PathBuf,
    /// Number of threads for ONNX inference (default: 1)
    pub onnx_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            onnx_threads: 1,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,
    /// Log format (json, pretty)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file, the environment, and `DATABASE_URL`
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("SOIL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// The file is optional. `SOIL__SECTION__KEY` variables override it, and
    /// `DATABASE_URL` overrides `database.url`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("SOIL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())
            .context("Failed to apply DATABASE_URL override")?
            .build()
            .context("Failed to build configuration")?;

        let mut config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.database.url = normalize_database_url(&config.database.url);

        Ok(config)
    }
}

/// Rewrite SQLAlchemy-style SQLite URLs into the form sqlx expects.
///
/// `sqlite:///soil.db` is relative and `sqlite:////var/soil.db` absolute in
/// SQLAlchemy; sqlx reads everything after `sqlite://` as the path.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("sqlite:///") {
        Some(rest) => format!("sqlite://{rest}"),
        None => url.to_string(),
    }
}
