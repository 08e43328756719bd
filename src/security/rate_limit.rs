use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Per-client attempt counter within one window.
struct AttemptWindow {
    count: u32,
    window_start: Instant,
}

/// In-memory, per-client-IP sliding-window rate limiter.
///
/// One instance is created per process and shared through `AppState`. The
/// whole read-modify-write of a counter happens under the mutex, so
/// concurrent requests for the same key cannot race past the attempt budget.
/// The lock is never held across an await point.
#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<Mutex<HashMap<String, AttemptWindow>>>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// Records an attempt for `key` and reports whether it is allowed.
    ///
    /// First sight of a key starts a fresh window. Once the window elapses
    /// the counter resets to 1 on the next attempt. A denied attempt does
    /// not increment the counter further.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match attempts.get_mut(key) {
            None => {
                attempts.insert(
                    key.to_string(),
                    AttemptWindow {
                        count: 1,
                        window_start: now,
                    },
                );
                true
            }
            Some(entry) if now.duration_since(entry.window_start) >= self.window => {
                entry.count = 1;
                entry.window_start = now;
                true
            }
            Some(entry) if entry.count >= self.max_attempts => false,
            Some(entry) => {
                entry.count += 1;
                true
            }
        }
    }

    /// Remaining attempts for `key` within its active window; never negative.
    pub fn remaining(&self, key: &str) -> u32 {
        let attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match attempts.get(key) {
            None => self.max_attempts,
            Some(entry) if entry.window_start.elapsed() >= self.window => self.max_attempts,
            Some(entry) => self.max_attempts.saturating_sub(entry.count),
        }
    }

    /// Evicts entries whose window has elapsed; returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let before = attempts.len();
        attempts.retain(|_, entry| entry.window_start.elapsed() < self.window);
        before - attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn allows_up_to_max_attempts_then_denies() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));

        for n in 1..=5 {
            assert!(limiter.allow("10.0.0.1"), "attempt {n} should pass");
        }
        assert!(!limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        assert_eq!(limiter.remaining("10.0.0.1"), 0);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.2"));
    }

    #[test]
    fn counter_resets_after_the_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(40));

        assert!(limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));

        thread::sleep(Duration::from_millis(60));

        assert_eq!(limiter.remaining("10.0.0.1"), 2);
        assert!(limiter.allow("10.0.0.1"));
        assert_eq!(limiter.remaining("10.0.0.1"), 1);
    }

    #[test]
    fn remaining_is_full_for_unknown_keys() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        assert_eq!(limiter.remaining("10.0.0.1"), 5);
    }

    #[test]
    fn cleanup_drops_only_stale_entries() {
        let limiter = RateLimiter::new(5, Duration::from_millis(40));

        assert!(limiter.allow("stale"));
        thread::sleep(Duration::from_millis(60));
        assert!(limiter.allow("fresh"));

        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.remaining("fresh"), 4);
    }

    #[test]
    fn concurrent_attempts_never_exceed_the_budget() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                thread::spawn(move || limiter.allow("10.0.0.1"))
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join())
            .filter(|r| matches!(r, Ok(true)))
            .count();

        assert_eq!(allowed, 5);
    }
}
