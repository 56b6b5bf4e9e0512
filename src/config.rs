use std::{env, net::SocketAddr, str::FromStr};

use axum::http::HeaderValue;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    /// Expected `aud` claim; unset accepts any audience.
    pub jwt_audience: Option<String>,
    pub host: String,
    pub port: u16,
    /// `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
}

impl Config {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => parse_origins(&raw)?,
            Err(_) => None,
        };

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://todos.db"),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_audience: env::var("JWT_AUDIENCE").ok().filter(|s| !s.is_empty()),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 8080)?,
            allowed_origins,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: "HOST",
            value: raw,
            reason: e.to_string(),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// `*` anywhere in the list, or an empty list, means any origin.
fn parse_origins(raw: &str) -> Result<Option<Vec<String>>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return Ok(None);
    }

    if let Some(bad) = origins.iter().find(|origin| HeaderValue::from_str(origin).is_err()) {
        return Err(ConfigError::Invalid {
            key: "CORS_ALLOWED_ORIGINS",
            value: bad.clone(),
            reason: "not a valid header value".to_string(),
        });
    }

    Ok(Some(origins))
}
