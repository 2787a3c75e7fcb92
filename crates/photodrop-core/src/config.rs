//! Configuration module
//!
//! Settings are read from the process environment (and a `.env` file when
//! present). Every value has a default so the relay starts with no
//! configuration at all.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 3000;
const STORAGE_PATH: &str = "photos";
const UPLOAD_FIELD: &str = "image";

/// Base configuration shared by every HTTP-facing service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

/// Relay configuration
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub base: BaseConfig,
    pub storage_backend: StorageBackend,
    /// Directory holding stored objects (local backend only)
    pub storage_path: String,
    /// Multipart field carrying the uploaded file
    pub upload_field: String,
}

#[derive(Clone, Debug)]
pub struct Config(pub Box<RelayConfig>);

impl Config {
    fn as_relay(&self) -> &RelayConfig {
        &self.0
    }

    /// Load configuration from the environment, reading `.env` first.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(backend) => backend.parse()?,
            None => StorageBackend::Local,
        };

        let config = Config(Box::new(RelayConfig {
            base: BaseConfig {
                server_port,
                cors_origins,
                environment,
            },
            storage_backend,
            storage_path: var("STORAGE_PATH").unwrap_or_else(|| STORAGE_PATH.to_string()),
            upload_field: var("UPLOAD_FIELD")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| UPLOAD_FIELD.to_string()),
        }));

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let relay = self.as_relay();

        if relay.base.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be greater than zero"));
        }

        if relay.base.cors_origins.is_empty() {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS must list at least one origin, or '*'"
            ));
        }

        if relay.storage_backend == StorageBackend::Local && relay.storage_path.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "STORAGE_PATH must be set when using local storage backend"
            ));
        }

        if relay.upload_field.is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_FIELD must not be empty"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment().to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.as_relay().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_relay().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_relay().base.environment
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_relay().storage_backend
    }

    pub fn storage_path(&self) -> &str {
        &self.as_relay().storage_path
    }

    pub fn upload_field(&self) -> &str {
        &self.as_relay().upload_field
    }
}
