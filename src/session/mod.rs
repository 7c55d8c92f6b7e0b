//! Client-side session handling.
//!
//! The session guard, the persisted session record, and the HTTP client
//! it uses to talk to the auth boundary.

mod client;
mod guard;
mod store;

pub use client::{AuthClient, STARTUP_VERIFY_TIMEOUT};
pub use guard::{LoginOutcome, SessionGuard, SessionState};
pub use store::{FileSessionStore, SessionRecord, SessionStore};
