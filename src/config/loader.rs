use std::{env, fmt::Display, fs, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::domain::Credentials;

use super::env::{
    AntiplagiatConfig, AppConfig, ConfigError, DirectoryConfig, LoggingConfig, PollingConfig,
};

const DEFAULT_SECRETS_FILE: &str = "secret.json";

/// Older deployments keep their secrets in a JSON file next to the binary.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsFile {
    pub bot_token: Option<String>,
    pub secure_info_login: Option<String>,
    pub secure_info_password: Option<String>,
    pub anti_plagiat_site: Option<String>,
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let secrets = load_secrets_file(env::var("SECRETS_FILE").ok().filter(|v| !v.is_empty()))?;
    AppConfig::from_sources(
        |key| env::var(key).ok().filter(|v| !v.is_empty()),
        secrets.unwrap_or_default(),
    )
}

/// An explicitly named file must exist; the default one is optional.
fn load_secrets_file(explicit: Option<String>) -> Result<Option<SecretsFile>, ConfigError> {
    let required = explicit.is_some();
    let path = PathBuf::from(explicit.unwrap_or_else(|| DEFAULT_SECRETS_FILE.to_string()));
    if !required && !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::SecretsRead {
        path: path.clone(),
        source,
    })?;
    let secrets = serde_json::from_str(&raw)
        .map_err(|source| ConfigError::SecretsParse { path: path.clone(), source })?;
    tracing::debug!(target: "config", path = %path.display(), "secrets file loaded");
    Ok(Some(secrets))
}

impl AppConfig {
    /// Environment values win over the secrets file.
    pub(crate) fn from_sources<F>(lookup: F, secrets: SecretsFile) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .or(secrets.bot_token)
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let raw_endpoint = lookup("ANTIPLAGIAT_URL")
            .or(secrets.anti_plagiat_site)
            .ok_or(ConfigError::Missing("ANTIPLAGIAT_URL"))?;
        let endpoint = Url::parse(&raw_endpoint).map_err(|source| ConfigError::InvalidUrl {
            key: "ANTIPLAGIAT_URL",
            source,
        })?;

        let credentials = Credentials {
            login: lookup("ANTIPLAGIAT_LOGIN")
                .or(secrets.secure_info_login)
                .ok_or(ConfigError::Missing("ANTIPLAGIAT_LOGIN"))?,
            password: lookup("ANTIPLAGIAT_PASSWORD")
                .or(secrets.secure_info_password)
                .ok_or(ConfigError::Missing("ANTIPLAGIAT_PASSWORD"))?,
        };

        let antiplagiat = AntiplagiatConfig {
            endpoint,
            credentials,
            request_timeout: Duration::from_secs(at_least_one(
                &lookup,
                "ANTIPLAGIAT_TIMEOUT_SECS",
                60,
            )?),
        };

        let polling = PollingConfig {
            max_attempts: at_least_one(&lookup, "POLL_MAX_ATTEMPTS", 5)?,
            interval: Duration::from_secs(parse_or(&lookup, "POLL_INTERVAL_SECS", 10)?),
            max_active_checks: at_least_one(&lookup, "MAX_ACTIVE_CHECKS", 32)?,
        };

        let directories = DirectoryConfig {
            logs_dir: lookup("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
        };

        let logging = LoggingConfig {
            level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        Ok(Self {
            telegram_bot_token,
            antiplagiat,
            polling,
            directories,
            logging,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
            key,
            value,
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}

fn at_least_one<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + From<u8> + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value < T::from(1) {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}
