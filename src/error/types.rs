//! Error types for the watchgate service.

use thiserror::Error;

/// Main error type for the gate.
#[derive(Error, Debug)]
pub enum GateError {
    /// Fatal misconfiguration, surfaced to the operator.
    #[error("Configuration error: {message}")]
    Config { message: String, hint: String },

    /// Missing or unusable client input.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// Wrong password or bad token. Kinds are collapsed to a single
    /// client-visible message so callers cannot probe which check failed.
    #[error("Authentication error: {kind}")]
    Auth { kind: AuthErrorKind },

    /// Too many failed login attempts from one identifier.
    #[error("Rate limited: try again in {remaining_minutes} minute(s)")]
    RateLimited { remaining_minutes: u64 },

    /// Network failure or malformed response on the client side.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Password is required")]
    MissingPassword,

    #[error("Token is required")]
    MissingToken,
}

/// Authentication error kinds.
#[derive(Error, Debug)]
pub enum AuthErrorKind {
    #[error("Invalid password")]
    InvalidPassword,

    #[error("Token signature mismatch")]
    InvalidSignature,

    #[error("Malformed token: {message}")]
    MalformedToken { message: String },

    #[error("Token expired {expired_seconds}s ago")]
    TokenExpired { expired_seconds: u64 },

    #[error("Token does not carry an authenticated claim")]
    NotAuthenticated,
}

impl GateError {
    /// Shorthand for a configuration error with a remediation hint.
    pub fn config(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Whether this error corresponds to a rejected credential or token,
    /// as opposed to an operator-side or transport failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Result type alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;
