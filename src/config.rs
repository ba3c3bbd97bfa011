//! Configuration
//! Mission: Load process-wide settings once at startup into an immutable value

use anyhow::{bail, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

const MIN_SECRET_LEN: usize = 32;

/// Command line / environment surface. Every field can come from either.
#[derive(Parser, Debug)]
#[command(name = "classnotes")]
#[command(about = "Educational content backend: users, notes and bearer-token auth")]
pub struct Cli {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "classnotes.db")]
    pub database_path: PathBuf,

    /// Shared HS256 signing secret for access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token lifetime in minutes
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value_t = 30)]
    pub access_token_expire_minutes: i64,

    /// Secret required by POST /auth/initialize
    #[arg(long, env = "INITIALIZE_SECRET_KEY", hide_env_values = true)]
    pub initialize_secret_key: String,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        if self.jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.initialize_secret_key.trim().is_empty() {
            bail!("INITIALIZE_SECRET_KEY must not be empty");
        }
        if self.access_token_expire_minutes < 0 {
            bail!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be non-negative, got {}",
                self.access_token_expire_minutes
            );
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be within 4..=31, got {}", self.bcrypt_cost);
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            warn!(
                "JWT_SECRET is shorter than {} bytes; use a longer secret in production",
                MIN_SECRET_LEN
            );
        }

        Ok(Config {
            bind_addr: self.bind_addr,
            database_path: self.database_path,
            jwt_secret: self.jwt_secret,
            access_token_ttl: chrono::Duration::minutes(self.access_token_expire_minutes),
            initialize_secret_key: self.initialize_secret_key,
            bcrypt_cost: self.bcrypt_cost,
        })
    }
}

/// Immutable runtime configuration, shared behind an `Arc`.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub access_token_ttl: chrono::Duration,
    pub initialize_secret_key: String,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Defaults for everything except the two secrets.
    pub fn new(jwt_secret: impl Into<String>, initialize_secret_key: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_path: PathBuf::from("classnotes.db"),
            jwt_secret: jwt_secret.into(),
            access_token_ttl: chrono::Duration::minutes(30),
            initialize_secret_key: initialize_secret_key.into(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl.num_seconds())
            .field("initialize_secret_key", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
