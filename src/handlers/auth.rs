use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::Duration;
use serde::Deserialize;
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::{
    constants::{HOME_PATH, LOGIN_PATH, SESSION_COOKIE},
    error::{AppError, Result},
    models::identity::RequestIdentity,
    models::user::SessionUser,
    repositories::session as session_repo,
    security::csrf,
    services::auth as auth_service,
    state::AppState,
    validation::auth::validate_username,
};

/// The login form payload.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(rename = "_csrf")]
    pub csrf_token: String,
}

/// The logout form payload.
#[derive(Deserialize)]
pub struct LogoutForm {
    #[serde(rename = "_csrf")]
    pub csrf_token: String,
}

/// Builds the session cookie with its fixed security attributes.
fn session_cookie(session_id: String, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(CookieDuration::seconds(max_age_secs));

    let is_production = std::env::var("APP_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);
    if is_production {
        cookie.set_secure(true);
    }

    cookie
}

/// An expired cookie used to clear a value from the client.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}

/// Validates the submitted CSRF token against the cookie-held one carried in
/// the request identity.
fn require_csrf(identity: &RequestIdentity, submitted: &str) -> Result<()> {
    let stored = identity.csrf_token.as_deref().unwrap_or("");
    if !csrf::validate_token(submitted, stored) {
        return Err(AppError::SecurityViolation(
            "CSRF token mismatch".to_string(),
        ));
    }
    Ok(())
}

/// Handles the login form submission.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    require_csrf(&identity, &form.csrf_token)?;
    validate_username(&form.username)?;

    if !auth_service::verify_admin_credentials(&state.db, &form.username, &form.password).await? {
        return Err(AppError::Authentication(
            "Invalid username or password".to_string(),
        ));
    }

    let user = SessionUser::new(&form.username, "admin");
    let session_id = session_repo::create(
        &state.db,
        &user,
        Duration::seconds(state.config.session_max_age_secs),
    )
    .await?;

    cookies.add(session_cookie(session_id, state.config.session_max_age_secs));
    tracing::info!(username = %form.username, "Login successful, session created");

    Ok(Redirect::to(HOME_PATH).into_response())
}

/// Handles the logout form submission.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    cookies: Cookies,
    Form(form): Form<LogoutForm>,
) -> Result<Response> {
    require_csrf(&identity, &form.csrf_token)?;

    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let session_id = cookie.value().to_string();
        if session_repo::is_valid_session_id(&session_id) {
            session_repo::destroy(&state.db, &session_id).await?;
        }
        cookies.remove(removal_cookie(SESSION_COOKIE));
    }
    cookies.remove(removal_cookie(csrf::CSRF_COOKIE));

    tracing::info!("Session cleared on logout");
    Ok(Redirect::to(LOGIN_PATH).into_response())
}
