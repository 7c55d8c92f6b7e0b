//! Failed-login rate limiting with temporary lockout.
//!
//! Tracks failed attempts per client identifier. Once the attempt count
//! reaches the configured maximum the identifier is locked out for a fixed
//! duration; a successful login deletes the counter. Counters live in
//! process memory only and reset on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::SecurityConfig;
use crate::error::{GateError, GateResult};

/// Per-identifier attempt record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptCounter {
    /// Failed attempts since the last reset.
    pub count: u32,
    /// Active lockout expiry, if any.
    pub lockout_until: Option<Instant>,
}

/// Storage for attempt counters, keyed by client identifier.
///
/// The in-process map is the default; multi-instance deployments can back
/// this with a shared cache instead. Lockout state is not shared across
/// instances otherwise.
pub trait AttemptStore: Send + Sync {
    fn get(&self, identifier: &str) -> Option<AttemptCounter>;
    fn set(&self, identifier: &str, counter: AttemptCounter);
    fn delete(&self, identifier: &str);
    /// Delete entries whose lockout has expired, to bound memory.
    fn remove_expired(&self, now: Instant);
    /// Number of identifiers currently tracked.
    fn tracked(&self) -> usize;
}

/// Mutex-guarded in-process attempt store.
#[derive(Default)]
pub struct MemoryAttemptStore {
    counters: Mutex<HashMap<String, AttemptCounter>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for MemoryAttemptStore {
    fn get(&self, identifier: &str) -> Option<AttemptCounter> {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(identifier)
            .copied()
    }

    fn set(&self, identifier: &str, counter: AttemptCounter) {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identifier.to_string(), counter);
    }

    fn delete(&self, identifier: &str) {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(identifier);
    }

    fn remove_expired(&self, now: Instant) {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, counter| match counter.lockout_until {
                Some(until) => until > now,
                None => true,
            });
    }

    fn tracked(&self) -> usize {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The attempt may proceed; this many failures remain before lockout.
    Allowed { remaining_attempts: u32 },
    /// The identifier is locked out for this many more minutes (rounded up).
    LockedOut { remaining_minutes: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Rate limiter for login attempts.
pub struct LoginRateLimiter {
    store: Box<dyn AttemptStore>,
    max_attempts: u32,
    lockout: Duration,
    sweep_started: AtomicBool,
}

impl LoginRateLimiter {
    /// Create a rate limiter over the default in-process store.
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self::with_store(Box::new(MemoryAttemptStore::new()), max_attempts, lockout)
    }

    /// Create a rate limiter over a caller-supplied store.
    pub fn with_store(store: Box<dyn AttemptStore>, max_attempts: u32, lockout: Duration) -> Self {
        Self {
            store,
            max_attempts,
            lockout,
            sweep_started: AtomicBool::new(false),
        }
    }

    /// Create a rate limiter from the security settings.
    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            security.max_login_attempts,
            Duration::from_secs(security.lockout_minutes * 60),
        )
    }

    /// Check whether a login attempt from this identifier may proceed.
    ///
    /// An expired lockout clears the counter before evaluation. Reaching the
    /// attempt maximum starts a new lockout and denies.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut counter = self.store.get(identifier).unwrap_or_default();

        if let Some(until) = counter.lockout_until {
            if until > now {
                return RateLimitDecision::LockedOut {
                    remaining_minutes: minutes_remaining(until, now),
                };
            }
            // Lockout served; start over.
            counter = AttemptCounter::default();
            self.store.delete(identifier);
        }

        if counter.count >= self.max_attempts {
            counter.lockout_until = Some(now + self.lockout);
            self.store.set(identifier, counter);
            return RateLimitDecision::LockedOut {
                remaining_minutes: minutes_remaining(now + self.lockout, now),
            };
        }

        RateLimitDecision::Allowed {
            remaining_attempts: self.max_attempts - counter.count,
        }
    }

    /// Deny-as-error form of [`check`](Self::check), for callers that
    /// propagate denial with `?`. Returns the remaining allowance when the
    /// attempt may proceed.
    pub fn ensure_allowed(&self, identifier: &str) -> GateResult<u32> {
        match self.check(identifier) {
            RateLimitDecision::Allowed { remaining_attempts } => Ok(remaining_attempts),
            RateLimitDecision::LockedOut { remaining_minutes } => {
                Err(GateError::RateLimited { remaining_minutes })
            }
        }
    }

    /// Record a failed login attempt for this identifier.
    pub fn record_failure(&self, identifier: &str) {
        let mut counter = self.store.get(identifier).unwrap_or_default();
        counter.count += 1;
        self.store.set(identifier, counter);
    }

    /// Forget all attempts for this identifier (called on successful login).
    pub fn reset(&self, identifier: &str) {
        self.store.delete(identifier);
    }

    /// Delete entries whose lockout has expired.
    pub fn sweep(&self) {
        self.store.remove_expired(Instant::now());
    }

    /// Number of identifiers currently tracked.
    pub fn tracked(&self) -> usize {
        self.store.tracked()
    }

    /// Start the background sweep task, once per limiter.
    ///
    /// Spawns a tokio task that periodically deletes expired lockout entries
    /// to prevent unbounded memory growth. Subsequent calls are no-ops;
    /// returns whether this call spawned the task.
    pub fn start_sweep_task(self: &Arc<Self>, interval: Duration) -> bool {
        if self.sweep_started.swap(true, Ordering::SeqCst) {
            return false;
        }

        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            loop {
                interval_timer.tick().await;
                limiter.sweep();
            }
        });
        true
    }
}

/// Minutes until `until`, rounded up, never reported as zero.
fn minutes_remaining(until: Instant, now: Instant) -> u64 {
    let millis = until.saturating_duration_since(now).as_millis() as u64;
    (millis + 59_999) / 60_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const LOCKOUT: Duration = Duration::from_secs(15 * 60);

    #[test]
    fn test_fresh_identifier_has_full_allowance() {
        let limiter = LoginRateLimiter::new(5, LOCKOUT);
        assert_eq!(
            limiter.check("client-a"),
            RateLimitDecision::Allowed {
                remaining_attempts: 5
            }
        );
    }

    #[test]
    fn test_failures_reduce_remaining_attempts() {
        let limiter = LoginRateLimiter::new(5, LOCKOUT);

        limiter.record_failure("client-a");
        limiter.record_failure("client-a");

        assert_eq!(
            limiter.check("client-a"),
            RateLimitDecision::Allowed {
                remaining_attempts: 3
            }
        );
    }

    #[test]
    fn test_lockout_after_max_attempts() {
        let limiter = LoginRateLimiter::new(5, LOCKOUT);

        for _ in 0..5 {
            assert!(limiter.check("client-a").is_allowed());
            limiter.record_failure("client-a");
        }

        match limiter.check("client-a") {
            RateLimitDecision::LockedOut { remaining_minutes } => {
                assert_eq!(remaining_minutes, 15);
            }
            other => panic!("expected lockout, got {:?}", other),
        }
    }

    #[test]
    fn test_reset_restores_full_allowance() {
        let limiter = LoginRateLimiter::new(5, LOCKOUT);

        for _ in 0..5 {
            limiter.record_failure("client-a");
        }
        assert!(!limiter.check("client-a").is_allowed());

        limiter.reset("client-a");
        assert_eq!(
            limiter.check("client-a"),
            RateLimitDecision::Allowed {
                remaining_attempts: 5
            }
        );
    }

    #[test]
    fn test_identifiers_are_independent() {
        let limiter = LoginRateLimiter::new(2, LOCKOUT);

        limiter.record_failure("client-a");
        limiter.record_failure("client-a");
        assert!(!limiter.check("client-a").is_allowed());

        assert!(limiter.check("client-b").is_allowed());
    }

    #[test]
    fn test_expired_lockout_clears_counter() {
        let limiter = LoginRateLimiter::new(2, Duration::from_millis(50));

        limiter.record_failure("client-a");
        limiter.record_failure("client-a");
        assert!(!limiter.check("client-a").is_allowed());

        thread::sleep(Duration::from_millis(80));

        assert_eq!(
            limiter.check("client-a"),
            RateLimitDecision::Allowed {
                remaining_attempts: 2
            }
        );
    }

    #[test]
    fn test_sweep_removes_expired_lockouts_only() {
        let limiter = LoginRateLimiter::new(1, Duration::from_millis(50));

        // Locked out entry.
        limiter.record_failure("locked");
        limiter.check("locked");
        // Plain counter without lockout.
        limiter.record_failure("counting");

        assert_eq!(limiter.tracked(), 2);

        thread::sleep(Duration::from_millis(80));
        limiter.sweep();

        assert_eq!(limiter.tracked(), 1);
        assert!(limiter.check("locked").is_allowed());
    }

    #[test]
    fn test_from_config_defaults() {
        let limiter = LoginRateLimiter::from_config(&SecurityConfig::default());
        assert_eq!(
            limiter.check("client-a"),
            RateLimitDecision::Allowed {
                remaining_attempts: 5
            }
        );
    }

    #[test]
    fn test_ensure_allowed_maps_lockout_to_error() {
        let limiter = LoginRateLimiter::new(1, LOCKOUT);

        assert_eq!(limiter.ensure_allowed("client-a").unwrap(), 1);

        limiter.record_failure("client-a");
        match limiter.ensure_allowed("client-a").unwrap_err() {
            GateError::RateLimited { remaining_minutes } => assert_eq!(remaining_minutes, 15),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sweep_task_prunes_expired_lockouts() {
        let limiter = Arc::new(LoginRateLimiter::new(1, Duration::from_millis(20)));

        limiter.record_failure("locked");
        limiter.check("locked");
        assert_eq!(limiter.tracked(), 1);

        assert!(limiter.start_sweep_task(Duration::from_millis(30)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(limiter.tracked(), 0);
    }

    #[tokio::test]
    async fn test_sweep_task_starts_once() {
        let limiter = Arc::new(LoginRateLimiter::new(1, LOCKOUT));

        assert!(limiter.start_sweep_task(Duration::from_secs(60)));
        assert!(!limiter.start_sweep_task(Duration::from_secs(60)));
    }

    #[test]
    fn test_remaining_minutes_rounds_up() {
        let now = Instant::now();
        assert_eq!(minutes_remaining(now + Duration::from_secs(61), now), 2);
        assert_eq!(minutes_remaining(now + Duration::from_secs(1), now), 1);
    }
}
