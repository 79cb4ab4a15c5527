//! Process-level settings read from the environment.
//!
//! `.env` files are loaded by `main` through `dotenvy` before
//! [`Settings::from_env`] runs. Partner credentials are per channel and live
//! in the channel config store, not here.

use std::time::Duration;

use thiserror::Error;

use crate::db;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    /// App id Saleor puts in `recipient.id`; webhooks addressed elsewhere are rejected.
    pub saleor_app_id: String,
    /// Bearer token guarding the channel configuration endpoints.
    pub config_api_token: String,
    pub atobarai_http_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: db::database_url_from_env(),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            saleor_app_id: required("SALEOR_APP_ID")?,
            config_api_token: required("CONFIG_API_TOKEN")?,
            atobarai_http_timeout: Duration::from_secs(parse_or("ATOBARAI_HTTP_TIMEOUT_SECS", 15)?),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
