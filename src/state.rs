use deadpool_postgres::Pool;
use std::time::Duration;

use crate::config::Config;
use crate::constants::{RATE_LIMIT_MAX_ATTEMPTS, RATE_LIMIT_WINDOW_SECS};
use crate::error::Result;
use crate::security::rate_limit::RateLimiter;

/// The application's state: one database pool and one rate limiter per
/// process, handed to the pipeline and handlers by injection rather than
/// through globals.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The per-IP login attempt limiter.
    pub rate_limiter: RateLimiter,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("PostgreSQL pool initialized");

        let rate_limiter = RateLimiter::new(
            RATE_LIMIT_MAX_ATTEMPTS,
            Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
        );
        tracing::info!(
            max_attempts = RATE_LIMIT_MAX_ATTEMPTS,
            window_secs = RATE_LIMIT_WINDOW_SECS,
            "Rate limiter initialized"
        );

        Ok(AppState {
            db,
            rate_limiter,
            config: config.clone(),
        })
    }
}
