//! HTTP boundary module.
//!
//! Request/response bodies and the axum listener for the auth endpoint.

mod request;
mod response;
mod server;

pub use request::AuthRequest;
pub use response::{ErrorBody, LoginBody, VerifyBody};
pub use server::{AppState, GateServer, AUTH_ENDPOINT};
