//! Watchgate
//!
//! Password gate for a personal anime watchlist app: the server side issues
//! and verifies HMAC-SHA256 signed session tokens over a small HTTP
//! boundary, the client side holds the current token and rate-limits
//! repeated failed logins.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
