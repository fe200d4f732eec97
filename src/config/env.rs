use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

use crate::{domain::Credentials, tasks::PollPolicy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub antiplagiat: AntiplagiatConfig,
    pub polling: PollingConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct AntiplagiatConfig {
    pub endpoint: Url,
    pub credentials: Credentials,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval: Duration,
    pub max_active_checks: usize,
}

impl PollingConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.max_attempts,
            interval: self.interval,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid url in {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to read secrets file {}: {source}", .path.display())]
    SecretsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse secrets file {}: {source}", .path.display())]
    SecretsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
