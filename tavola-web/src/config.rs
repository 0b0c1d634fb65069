use std::env;
use std::net::SocketAddr;

use chrono::{TimeDelta, Utc};
use dotenvy::dotenv;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_SESSION_HOURS: i64 = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    database_url: Option<String>,
    secret_key: Option<String>,
    pub listen_addr: SocketAddr,
    pub session_lifetime: TimeDelta,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                name: "LISTEN_ADDR",
                value: listen_addr.clone(),
            })?;

        let session_lifetime = match lookup("SESSION_HOURS") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .and_then(TimeDelta::try_hours)
                .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
                .ok_or(ConfigError::Invalid {
                    name: "SESSION_HOURS",
                    value,
                })?,
            None => TimeDelta::hours(DEFAULT_SESSION_HOURS),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            secret_key: lookup("SECRET_KEY").filter(|v| !v.is_empty()),
            listen_addr,
            session_lifetime,
        })
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn secret_key(&self) -> Result<&str, ConfigError> {
        self.secret_key
            .as_deref()
            .ok_or(ConfigError::Missing("SECRET_KEY"))
    }
}
