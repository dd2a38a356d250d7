//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Secret used when `TALLY_JWT_SECRET` is unset. Only fit for development.
const DEV_JWT_SECRET: &str = "tally-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on
    pub bind_addr: IpAddr,

    /// HTTP port
    pub http_port: u16,

    /// SQLite database file
    pub db_path: String,

    /// Secret for signing JWTs
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    pub jwt_lifetime_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: 5000,
            db_path: "tally.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 30 * 24 * 60 * 60,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let jwt_secret = match lookup("TALLY_JWT_SECRET") {
            Some(secret) if secret.trim().is_empty() => {
                return Err(ConfigError::InvalidValue("TALLY_JWT_SECRET".to_string()))
            }
            Some(secret) => secret,
            None => {
                warn!("TALLY_JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        let config = ServerConfig {
            bind_addr: parse_or(&lookup, "TALLY_BIND_ADDR", defaults.bind_addr)?,
            http_port: parse_or(&lookup, "TALLY_HTTP_PORT", defaults.http_port)?,
            db_path: lookup("TALLY_DB_PATH").unwrap_or(defaults.db_path),
            jwt_secret,
            jwt_lifetime_secs: parse_or(
                &lookup,
                "TALLY_JWT_LIFETIME_SECS",
                defaults.jwt_lifetime_secs,
            )?,
        };

        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "TALLY_JWT_LIFETIME_SECS".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
