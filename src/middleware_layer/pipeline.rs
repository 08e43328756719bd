use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use tower_cookies::{Cookie, Cookies};

use crate::{
    constants::{
        is_path_in, ERROR_PATH, HOME_PATH, LOGIN_PATH, NO_AUTH_PATHS, PUBLIC_PATHS,
        RATE_LIMITED_PATHS, SESSION_COOKIE, SETUP_PATH, SETUP_PATHS,
    },
    error::Result,
    models::identity::RequestIdentity,
    repositories::{session as session_repo, settings as settings_repo},
    security::{csrf, rate_limit::RateLimiter},
    state::AppState,
};

/// Terminal decision of a pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Proceed to the next stage.
    Continue,
    /// Short-circuit with a redirect to the given path.
    Redirect(String),
    /// Short-circuit with a small status response.
    Reject(StatusCode, String),
}

impl Outcome {
    /// Converts a short-circuit outcome into a response; `Continue` is `None`.
    fn short_circuit(self) -> Option<Response> {
        match self {
            Outcome::Continue => None,
            Outcome::Redirect(path) => Some(Redirect::to(&path).into_response()),
            Outcome::Reject(status, body) => Some((status, body).into_response()),
        }
    }
}

/// Statically-served resources that bypass the pipeline entirely.
///
/// The error page is included so that a storage outage cannot turn the
/// fail-closed redirect into a redirect loop.
fn is_prerendered(path: &str) -> bool {
    path.starts_with("/assets/")
        || matches!(
            path,
            "/favicon.ico" | "/apple-touch-icon.png" | "/apple-touch-icon-precomposed.png"
        )
}

/// Methods that never mutate state and therefore get a fresh CSRF token.
fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Setup gate: unconfigured systems are funneled to the setup flow, and the
/// setup flow becomes inaccessible once configured.
fn setup_outcome(configured: bool, path: &str) -> Outcome {
    if !configured && !is_path_in(path, SETUP_PATHS) && !is_path_in(path, PUBLIC_PATHS) {
        return Outcome::Redirect(SETUP_PATH.to_string());
    }

    if configured && is_path_in(path, SETUP_PATHS) {
        return Outcome::Redirect(HOME_PATH.to_string());
    }

    Outcome::Continue
}

/// Rate-limit stage for mutating requests to rate-limited paths.
///
/// Returns the outcome plus the remaining-attempts count to expose to the
/// login page, when applicable.
fn rate_limit_outcome(
    limiter: &RateLimiter,
    method: &Method,
    path: &str,
    ip: &str,
) -> (Outcome, Option<u32>) {
    if *method != Method::POST || !is_path_in(path, RATE_LIMITED_PATHS) {
        return (Outcome::Continue, None);
    }

    if !limiter.allow(ip) {
        let remaining = limiter.remaining(ip);
        tracing::warn!(ip, path, "Rate limit exceeded");

        if path == LOGIN_PATH {
            return (Outcome::Redirect(LOGIN_PATH.to_string()), Some(remaining));
        }
        return (
            Outcome::Reject(
                StatusCode::TOO_MANY_REQUESTS,
                "Too Many Requests".to_string(),
            ),
            Some(remaining),
        );
    }

    let remaining = (path == LOGIN_PATH).then(|| limiter.remaining(ip));
    (Outcome::Continue, remaining)
}

/// Extracts the client IP, preferring the forwarding header over the socket
/// address.
fn client_ip(req: &Request<Body>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// An expired cookie used to clear a bad value from the client.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}

/// The request-authentication pipeline.
///
/// Every request passes through here exactly once. Stages run in a fixed
/// order and may exit early with a redirect or a small status response; any
/// stage error fails closed into the generic error redirect.
pub async fn request_pipeline(
    State(state): State<AppState>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if is_prerendered(&path) || path == ERROR_PATH {
        return next.run(req).await;
    }

    let ip = client_ip(&req);
    let method = req.method().clone();

    match run_stages(&state, &cookies, &ip, &method, &path, req, next).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(%ip, %path, error = %e, "Pipeline error, failing closed");
            Redirect::to(ERROR_PATH).into_response()
        }
    }
}

async fn run_stages(
    state: &AppState,
    cookies: &Cookies,
    ip: &str,
    method: &Method,
    path: &str,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let mut identity = RequestIdentity::default();

    // Setup gate
    let configured = settings_repo::is_configured(&state.db).await?;
    if let Some(response) = setup_outcome(configured, path).short_circuit() {
        tracing::info!(ip, path, configured, "Setup gate redirect");
        return Ok(response);
    }

    // CSRF: fresh token on safe methods, carried from the cookie otherwise
    if is_safe_method(method) {
        let token = csrf::generate_token();
        cookies.add(csrf::build_cookie(token.clone()));
        identity.csrf_token = Some(token);
        tracing::debug!(ip, "CSRF token issued");
    } else if let Some(cookie) = cookies.get(csrf::CSRF_COOKIE) {
        identity.csrf_token = Some(cookie.value().to_string());
    }

    // Rate limiting for sensitive POST endpoints
    let (outcome, remaining) = rate_limit_outcome(&state.rate_limiter, method, path, ip);
    identity.rate_limit_remaining = remaining;
    if let Some(response) = outcome.short_circuit() {
        return Ok(response);
    }

    // Session resolution for paths that require authentication
    if !is_path_in(path, NO_AUTH_PATHS) {
        let Some(session_id) = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string())
        else {
            return Ok(Redirect::to(LOGIN_PATH).into_response());
        };

        if !session_repo::is_valid_session_id(&session_id) {
            tracing::warn!(ip, "Malformed session cookie");
            cookies.remove(removal_cookie(SESSION_COOKIE));
            return Ok(Redirect::to(LOGIN_PATH).into_response());
        }

        match session_repo::resolve(&state.db, &session_id).await? {
            Some(user) => identity.user = Some(user),
            None => {
                cookies.remove(removal_cookie(SESSION_COOKIE));
                return Ok(Redirect::to(LOGIN_PATH).into_response());
            }
        }
    }

    // Dispatch with the populated request-scoped identity
    req.extensions_mut().insert(identity);
    let response = next.run(req).await;

    // Audit log for the auth namespace
    if path.starts_with("/auth/") {
        tracing::info!(
            ip,
            method = %method,
            path,
            status = response.status().as_u16(),
            "Auth endpoint accessed"
        );
    }

    Ok(response)
}
