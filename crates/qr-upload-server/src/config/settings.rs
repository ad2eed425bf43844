use anyhow::Result;
use config::{Config, Environment, File};
use qr_session_store::{StoreConfig, MAX_SWEEP_PERIOD};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for TTL and sweep interval settings (one day)
const MAX_SECONDS: u64 = MAX_SWEEP_PERIOD.as_secs();

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub sessions: SessionSettings,
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionSettings {
    pub default_ttl_seconds: u64,
    pub max_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub sweep_batch_size: usize,
    pub id_retry_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 120,
            max_ttl_seconds: 15 * 60,
            sweep_interval_seconds: 60,
            sweep_batch_size: 256,
            id_retry_limit: 5,
        }
    }
}

impl From<&SessionSettings> for StoreConfig {
    fn from(s: &SessionSettings) -> Self {
        Self {
            default_ttl: Duration::from_secs(s.default_ttl_seconds),
            max_ttl: Duration::from_secs(s.max_ttl_seconds),
            sweep_interval: Duration::from_secs(s.sweep_interval_seconds),
            sweep_batch_size: s.sweep_batch_size,
            id_retry_limit: s.id_retry_limit,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UploadConfig {
    /// Schemes accepted for `image_url` on upload completion
    pub allowed_url_schemes: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_url_schemes: vec!["https".to_string(), "http".to_string()],
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            // Example: APP__SERVER__PORT=9000, APP__UPLOAD__ALLOWED_URL_SCHEMES=https
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_url_schemes")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.sessions;

        if s.default_ttl_seconds == 0 || s.max_ttl_seconds == 0 {
            anyhow::bail!("sessions.default_ttl_seconds and sessions.max_ttl_seconds must be > 0");
        }
        if s.default_ttl_seconds > s.max_ttl_seconds {
            anyhow::bail!(
                "sessions.default_ttl_seconds ({}) exceeds sessions.max_ttl_seconds ({})",
                s.default_ttl_seconds,
                s.max_ttl_seconds
            );
        }
        if s.max_ttl_seconds > MAX_SECONDS {
            anyhow::bail!(
                "sessions.max_ttl_seconds ({}) exceeds the limit of {}",
                s.max_ttl_seconds,
                MAX_SECONDS
            );
        }
        if s.sweep_interval_seconds == 0 || s.sweep_interval_seconds > MAX_SECONDS {
            anyhow::bail!(
                "sessions.sweep_interval_seconds must be between 1 and {}",
                MAX_SECONDS
            );
        }
        if s.sweep_batch_size == 0 || s.id_retry_limit == 0 {
            anyhow::bail!("sessions.sweep_batch_size and sessions.id_retry_limit must be > 0");
        }
        if self.upload.allowed_url_schemes.is_empty() {
            anyhow::bail!("upload.allowed_url_schemes must not be empty");
        }

        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::from(&self.sessions)
    }
}
