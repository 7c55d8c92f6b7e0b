//! Error types for the watchgate service.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
