use crate::job_controller::state::DEFAULT_JOB_RETENTION;
use crate::pipeline::dispatch::{DispatchConfig, DEFAULT_BATCH_SIZE};
use crate::services::data_sources::DEFAULT_MAX_DATASETS;
use dotenvy::dotenv;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "MAILFLOW_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid or missing environment variable: {0}")]
    Env(#[from] envy::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Server settings, read from `MAILFLOW_*` environment variables (a `.env`
/// file is honoured). Every field has a default.
#[derive(Clone, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,

    /// URL the send endpoint accepts POSTs on.
    pub send_endpoint_url: String,
    /// Account key sent with every request to the send endpoint.
    pub user_key: String,

    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub batch_timeout_secs: u64,
    pub test_send_timeout_secs: u64,

    pub max_upload_bytes: usize,
    /// Uploaded datasets kept in memory; the oldest is dropped first.
    pub max_datasets: usize,
    /// Seconds a finished job's status and report stay available.
    pub job_retention_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: "mailflow.sqlite".to_string(),
            send_endpoint_url: "http://localhost:8081/send-emails".to_string(),
            user_key: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: 1_000,
            batch_timeout_secs: 10,
            test_send_timeout_secs: 10,
            max_upload_bytes: 10 * 1024 * 1024,
            max_datasets: DEFAULT_MAX_DATASETS,
            job_retention_secs: DEFAULT_JOB_RETENTION.as_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        let config = envy::prefixed(ENV_PREFIX).from_env::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "MAILFLOW_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.send_endpoint_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "MAILFLOW_SEND_ENDPOINT_URL must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
            batch_timeout: Duration::from_secs(self.batch_timeout_secs),
        }
    }

    pub fn test_send_timeout(&self) -> Duration {
        Duration::from_secs(self.test_send_timeout_secs)
    }

    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
