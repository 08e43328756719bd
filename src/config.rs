use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

use crate::constants::SESSION_MAX_AGE_SECS;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The address the server listens on.
    pub bind_addr: SocketAddr,
    /// Session lifetime in seconds.
    pub session_max_age_secs: i64,
    /// Optional token required by the initial-setup action.
    pub setup_token: Option<String>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            session_max_age_secs: env::var("SESSION_MAX_AGE_SECS")
                .unwrap_or_else(|_| SESSION_MAX_AGE_SECS.to_string())
                .parse()
                .context("Invalid SESSION_MAX_AGE_SECS")?,
            setup_token: env::var("SETUP_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }
}
