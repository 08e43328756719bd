/// Application-wide constants for authentication and security.
/// Single source of truth for all configuration values.

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Session lifetime in seconds (7 days).
pub const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Interval between background cleanup passes, in seconds (1 hour).
pub const CLEANUP_INTERVAL_SECS: u64 = 60 * 60;

/// Attempt budget per client IP within one rate-limit window.
pub const RATE_LIMIT_MAX_ATTEMPTS: u32 = 5;

/// Rate-limit window in seconds (15 minutes).
pub const RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;

/// Well-known redirect targets.
pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/auth/login";
pub const SETUP_PATH: &str = "/setup";
pub const ERROR_PATH: &str = "/error";

/// Paths that belong to the initial-setup flow.
pub const SETUP_PATHS: &[&str] = &["/setup", "/api/setup"];

/// Paths reachable before the system is configured.
pub const PUBLIC_PATHS: &[&str] = &[
    "/setup",
    "/api/setup",
    "/auth/login",
    "/error",
    "/favicon.ico",
    "/apple-touch-icon.png",
    "/apple-touch-icon-precomposed.png",
];

/// Paths whose POST requests consume the per-IP attempt budget.
pub const RATE_LIMITED_PATHS: &[&str] = &["/auth/login", "/api/setup"];

/// Paths that skip the session check. The setup action is included so the
/// first-time flow can complete before any session exists.
pub const NO_AUTH_PATHS: &[&str] = &["/setup", "/api/setup", "/auth/login", "/error"];

/// Exact-match membership test against a path allow-list.
pub fn is_path_in(path: &str, paths: &[&str]) -> bool {
    paths.contains(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_membership_is_exact_match() {
        assert!(is_path_in("/auth/login", RATE_LIMITED_PATHS));
        assert!(!is_path_in("/auth/login/", RATE_LIMITED_PATHS));
        assert!(!is_path_in("/auth/login?x=1", RATE_LIMITED_PATHS));
        assert!(!is_path_in("/auth", RATE_LIMITED_PATHS));
    }

    #[test]
    fn setup_paths_are_public() {
        for path in SETUP_PATHS {
            assert!(is_path_in(path, PUBLIC_PATHS), "{path} must be public");
        }
    }
}
