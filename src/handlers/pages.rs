//! Minimal page handlers. Real template rendering is out of scope; these
//! exist so the pipeline has downstream routes to dispatch to.

use axum::{response::Html, Extension};

use crate::models::identity::RequestIdentity;
use crate::security::csrf::CSRF_FORM_FIELD;

/// The authenticated landing page.
pub async fn home(Extension(identity): Extension<RequestIdentity>) -> Html<String> {
    let username = identity
        .user
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or("unknown");
    let token = identity.csrf_token.as_deref().unwrap_or("");

    Html(format!(
        r#"<!DOCTYPE html>
<html><body>
<h1>Dashboard</h1>
<p>Signed in as {username}</p>
<form method="post" action="/auth/logout">
  <input type="hidden" name="{CSRF_FORM_FIELD}" value="{token}">
  <button type="submit">Log out</button>
</form>
</body></html>"#
    ))
}

/// The login page.
pub async fn login_page(Extension(identity): Extension<RequestIdentity>) -> Html<String> {
    let token = identity.csrf_token.as_deref().unwrap_or("");
    let attempts_note = match identity.rate_limit_remaining {
        Some(0) => "<p>Too many login attempts. Please try again later.</p>".to_string(),
        Some(n) => format!("<p>{n} attempts remaining.</p>"),
        None => String::new(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html><body>
<h1>Log in</h1>
{attempts_note}
<form method="post" action="/auth/login">
  <input type="hidden" name="{CSRF_FORM_FIELD}" value="{token}">
  <input name="username" placeholder="Username" autocomplete="username">
  <input name="password" type="password" placeholder="Password" autocomplete="current-password">
  <button type="submit">Log in</button>
</form>
</body></html>"#
    ))
}

/// The initial-setup page.
pub async fn setup_page(Extension(identity): Extension<RequestIdentity>) -> Html<String> {
    let token = identity.csrf_token.as_deref().unwrap_or("");

    Html(format!(
        r#"<!DOCTYPE html>
<html><body>
<h1>Initial setup</h1>
<form method="post" action="/api/setup">
  <input type="hidden" name="{CSRF_FORM_FIELD}" value="{token}">
  <input name="password" type="password" placeholder="Admin password">
  <input name="token" placeholder="Setup token (if required)">
  <button type="submit">Configure</button>
</form>
</body></html>"#
    ))
}

/// The generic error page every fail-closed path redirects to.
pub async fn error_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html><body>
<h1>Something went wrong</h1>
<p>Please try again later.</p>
</body></html>"#,
    )
}
