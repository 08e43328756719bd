use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod constants;
mod db;
mod error;
mod state;

mod models {
    pub mod identity;
    pub mod session;
    pub mod user;
}

mod repositories {
    pub mod session;
    pub mod settings;
}

mod security {
    pub mod csrf;
    pub mod rate_limit;
}

mod services {
    pub mod auth;
}

mod handlers {
    pub mod auth;
    pub mod pages;
    pub mod setup;
}

mod middleware_layer {
    pub mod pipeline;
}

mod validation {
    pub mod auth;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let state = AppState::new(&config)?;
    db::init_schema(&state.db).await?;
    tracing::info!("Database schema ready");

    let app = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/setup", get(handlers::pages::setup_page))
        .route("/api/setup", post(handlers::setup::configure))
        .route(
            "/auth/login",
            get(handlers::pages::login_page).post(handlers::auth::login),
        )
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/error", get(handlers::pages::error_page))
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::pipeline::request_pipeline,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .with_state(state.clone());

    // Background cleanup of expired sessions and stale rate-limit entries
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(constants::CLEANUP_INTERVAL_SECS)).await;
            match repositories::session::sweep(&cleanup_state.db).await {
                Ok(removed) => {
                    tracing::info!(removed, "Session sweep completed");
                }
                Err(e) => {
                    tracing::error!("Session sweep failed: {}", e);
                }
            }
            let stale = cleanup_state.rate_limiter.cleanup();
            if stale > 0 {
                tracing::info!(stale, "Rate limit entries evicted");
            }
        }
    });

    tracing::info!("Server listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
