//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use pvz_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set outside development")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: SocketAddr,
    /// `None` selects the in-memory backend.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// True when `jwt_secret` is the built-in development value.
    pub jwt_secret_is_default: bool,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub db_connect_attempts: u32,
    pub db_connect_backoff: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match var("ENVIRONMENT").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "ENVIRONMENT",
                    reason: format!("unknown environment '{other}'"),
                });
            }
        };

        let (jwt_secret, jwt_secret_is_default) = match var("JWT_SECRET") {
            Some(secret) => (secret, false),
            None if environment == Environment::Development => (DEV_JWT_SECRET.to_string(), true),
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        Ok(Self {
            http_addr: parse_or(var("HTTP_ADDR"), "HTTP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            database_url: var("DATABASE_URL"),
            jwt_secret,
            jwt_secret_is_default,
            environment,
            log_format: parse_or(var("LOG_FORMAT"), "LOG_FORMAT", LogFormat::Json)?,
            db_connect_attempts: parse_or(var("DB_CONNECT_ATTEMPTS"), "DB_CONNECT_ATTEMPTS", 3)?,
            db_connect_backoff: Duration::from_secs(parse_or(
                var("DB_CONNECT_BACKOFF_SECS"),
                "DB_CONNECT_BACKOFF_SECS",
                3,
            )?),
        })
    }
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
