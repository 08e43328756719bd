use crate::models::user::SessionUser;

/// Request-scoped state populated by the pipeline and consumed by handlers.
///
/// Created fresh per request, attached to the request extensions before
/// dispatch, and discarded when the response is written.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity {
    /// The resolved session user, when the request carries a valid session.
    pub user: Option<SessionUser>,
    /// The CSRF token issued (safe methods) or carried from the cookie
    /// (unsafe methods) for the consuming action to validate.
    pub csrf_token: Option<String>,
    /// Remaining login attempts for this client, set on rate-limited paths.
    pub rate_limit_remaining: Option<u32>,
}
