use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::{
    constants::LOGIN_PATH,
    error::{AppError, Result},
    models::identity::RequestIdentity,
    repositories::settings as settings_repo,
    security::csrf,
    services::auth as auth_service,
    state::AppState,
    validation::auth::validate_password,
};

/// The initial-setup form payload.
#[derive(Deserialize)]
pub struct SetupForm {
    pub password: String,
    #[serde(default)]
    pub token: String,
    #[serde(rename = "_csrf")]
    pub csrf_token: String,
}

/// Handles the one-time initial-setup submission.
///
/// Stores the admin password hash; the insert is conditional on no hash
/// existing yet, so re-setup is refused even under concurrent submissions.
#[axum::debug_handler]
pub async fn configure(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Form(form): Form<SetupForm>,
) -> Result<Response> {
    let stored = identity.csrf_token.as_deref().unwrap_or("");
    if !csrf::validate_token(&form.csrf_token, stored) {
        tracing::warn!("Invalid CSRF token during setup");
        return Err(AppError::SecurityViolation(
            "Invalid security token".to_string(),
        ));
    }

    if let Some(expected) = state.config.setup_token.as_deref() {
        let matches: bool = form.token.as_bytes().ct_eq(expected.as_bytes()).into();
        if !matches {
            tracing::warn!("Invalid setup token");
            return Err(AppError::SecurityViolation(
                "Invalid setup token".to_string(),
            ));
        }
    }

    validate_password(&form.password)?;

    let hash = auth_service::hash_password(&form.password)?;
    if !settings_repo::store_admin_password_hash(&state.db, &hash).await? {
        tracing::warn!("Setup attempted when already configured");
        return Err(AppError::Validation(
            "System is already configured".to_string(),
        ));
    }

    tracing::info!("Initial setup completed");
    Ok(Redirect::to(LOGIN_PATH).into_response())
}
