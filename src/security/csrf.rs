use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tower_cookies::cookie::SameSite;
use tower_cookies::Cookie;

/// Name of the CSRF cookie.
pub const CSRF_COOKIE: &str = "csrf";

/// Name of the hidden form field carrying the submitted token.
pub const CSRF_FORM_FIELD: &str = "_csrf";

/// The size of the CSRF token in bytes.
const CSRF_TOKEN_SIZE: usize = 32;

/// Generates a new random CSRF token (64 lowercase hex characters).
pub fn generate_token() -> String {
    let mut token = [0u8; CSRF_TOKEN_SIZE];
    OsRng.fill_bytes(&mut token);
    hex::encode(token)
}

/// Validates a submitted token against the cookie-held token.
///
/// True iff both are non-empty and equal. The comparison is constant-time so
/// token recovery through timing differences is not possible.
pub fn validate_token(submitted: &str, stored: &str) -> bool {
    if submitted.is_empty() || stored.is_empty() {
        return false;
    }
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Builds the CSRF cookie with its fixed security attributes.
pub fn build_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(CSRF_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_64_hex_chars_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')));
        assert_ne!(a, b);
    }

    #[test]
    fn validation_requires_non_empty_equality() {
        assert!(validate_token("abc123", "abc123"));
        assert!(!validate_token("abc123", "abc124"));
        assert!(!validate_token("abc123", "abc1234"));
        assert!(!validate_token("", "abc123"));
        assert!(!validate_token("abc123", ""));
        assert!(!validate_token("", ""));
    }

    #[test]
    fn cookie_carries_fixed_attributes() {
        let cookie = build_cookie(generate_token());
        assert_eq!(cookie.name(), CSRF_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
    }
}
