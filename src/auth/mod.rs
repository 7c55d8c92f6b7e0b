//! Authentication module.
//!
//! Password digesting, signed token issuance/verification, failed-login
//! rate limiting, and the login/verify service itself.

mod digest;
mod fingerprint;
mod rate_limit;
mod service;
mod token;

pub use digest::{constant_time_eq, sha256_hex};
pub use fingerprint::client_identifier;
pub use rate_limit::{
    AttemptCounter, AttemptStore, LoginRateLimiter, MemoryAttemptStore, RateLimitDecision,
};
pub use service::{AuthService, IssuedSession};
pub use token::{now_millis, now_seconds, Claims, TokenCodec};
