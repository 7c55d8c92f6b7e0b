//! Client-side session state machine.
//!
//! Drives the authenticated/unauthenticated decision for the app shell:
//! checks the persisted token on startup, gates interactive login through
//! the rate limiter, and persists the session record on success.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::auth::{client_identifier, now_millis, LoginRateLimiter, RateLimitDecision};
use crate::error::{GateError, GateResult};

use super::client::AuthClient;
use super::store::{SessionRecord, SessionStore};

/// Lifetime assumed when the boundary omits `expiresIn` (24 hours).
const DEFAULT_EXPIRES_IN_MS: u64 = 86_400_000;

/// How often expired lockout entries are swept from the rate limiter.
const LOCKOUT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Where the guard currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// A stored token exists and is being verified against the boundary.
    Checking,
    Authenticated,
}

/// Outcome of an interactive login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    /// Wrong password; this many attempts remain before lockout.
    Rejected { remaining_attempts: u32 },
    /// Too many failures; locked out for this many more minutes.
    LockedOut { remaining_minutes: u64 },
}

/// Session guard over a persisted record, the auth boundary, and the
/// failed-login rate limiter.
pub struct SessionGuard {
    state: SessionState,
    client: AuthClient,
    store: Box<dyn SessionStore>,
    limiter: Arc<LoginRateLimiter>,
    identifier: String,
}

impl SessionGuard {
    /// Build a guard and start the limiter's background lockout sweep.
    ///
    /// Must be called within a tokio runtime. The sweep is started at most
    /// once per limiter, so guards sharing one are fine.
    pub fn new(
        client: AuthClient,
        store: Box<dyn SessionStore>,
        limiter: Arc<LoginRateLimiter>,
    ) -> Self {
        limiter.start_sweep_task(LOCKOUT_SWEEP_INTERVAL);
        Self {
            state: SessionState::Unauthenticated,
            client,
            store,
            limiter,
            identifier: client_identifier(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Startup check of the persisted session.
    ///
    /// An absent or locally-expired record clears storage and yields
    /// Unauthenticated without touching the network. Otherwise the token is
    /// verified against the boundary under the startup timeout; a timeout,
    /// transport failure, or negative verdict all yield Unauthenticated. A
    /// token is never trusted merely because it exists.
    pub async fn check_stored_session(&mut self) -> GateResult<bool> {
        let record = match self.store.load()? {
            Some(record) => record,
            None => {
                self.state = SessionState::Unauthenticated;
                return Ok(false);
            }
        };

        if record.is_expired() {
            debug!("Stored session expired by local clock, clearing");
            self.store.clear()?;
            self.state = SessionState::Unauthenticated;
            return Ok(false);
        }

        self.state = SessionState::Checking;
        match self.client.verify_with_timeout(&record.token).await {
            Ok(verdict) if verdict.authenticated => {
                info!("Stored session verified");
                self.state = SessionState::Authenticated;
                Ok(true)
            }
            Ok(_) => {
                debug!("Stored token rejected by boundary, clearing");
                self.store.clear()?;
                self.state = SessionState::Unauthenticated;
                Ok(false)
            }
            Err(e) => {
                // The record stays put: the token may still be good once the
                // boundary is reachable again.
                warn!(error = %e, "Startup verify failed, treating as unauthenticated");
                self.state = SessionState::Unauthenticated;
                Ok(false)
            }
        }
    }

    /// Interactive login with a password.
    ///
    /// The rate limiter gates the attempt before the boundary is called.
    /// On success the session record is persisted and the attempt counter
    /// reset; on rejection the failure is recorded and the caller gets the
    /// remaining allowance (or the lockout it just triggered) for display.
    pub async fn login(&mut self, password: &str) -> GateResult<LoginOutcome> {
        if let Err(GateError::RateLimited { remaining_minutes }) =
            self.limiter.ensure_allowed(&self.identifier)
        {
            return Ok(LoginOutcome::LockedOut { remaining_minutes });
        }

        let verdict = self.client.login(password).await?;

        match (verdict.success, verdict.token) {
            (true, Some(token)) => {
                let expires_in_ms = verdict.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_MS);
                let record = SessionRecord {
                    token,
                    expires_at_ms: now_millis() + expires_in_ms,
                };
                self.store.save(&record)?;
                self.limiter.reset(&self.identifier);
                self.state = SessionState::Authenticated;
                info!("Login succeeded, session persisted");
                Ok(LoginOutcome::LoggedIn)
            }
            _ => {
                self.limiter.record_failure(&self.identifier);
                match self.limiter.check(&self.identifier) {
                    RateLimitDecision::Allowed { remaining_attempts } => {
                        Ok(LoginOutcome::Rejected { remaining_attempts })
                    }
                    RateLimitDecision::LockedOut { remaining_minutes } => {
                        Ok(LoginOutcome::LockedOut { remaining_minutes })
                    }
                }
            }
        }
    }

    /// Explicit logout: clear the persisted record and flip to
    /// Unauthenticated.
    pub fn logout(&mut self) -> GateResult<()> {
        self.store.clear()?;
        self.state = SessionState::Unauthenticated;
        info!("Logged out, session cleared");
        Ok(())
    }

    /// Identifier used for rate limiting (exposed for diagnostics).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &self.state)
            .field("identifier", &self.identifier)
            .finish()
    }
}
