//! Login and verify operations over the configured credential.

use crate::config::{PasswordSource, Secrets, PASSWORD_DIGEST_VAR, PASSWORD_PLAINTEXT_VAR};
use crate::error::{AuthErrorKind, GateError, GateResult};

use super::digest::{constant_time_eq, sha256_hex};
use super::token::{Claims, TokenCodec};

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    /// Lifetime reported to the client, in milliseconds.
    pub expires_in_ms: u64,
}

/// Server-side authentication service.
///
/// Holds the password source resolved at startup and the token codec.
/// Stateless across requests.
pub struct AuthService {
    password_source: Option<PasswordSource>,
    codec: TokenCodec,
    token_ttl_seconds: u64,
}

impl AuthService {
    pub fn new(secrets: &Secrets, token_ttl_seconds: u64) -> Self {
        Self {
            password_source: secrets.password_source.clone(),
            codec: TokenCodec::new(&secrets.token_secret),
            token_ttl_seconds,
        }
    }

    /// Validate a password and issue a session token.
    ///
    /// The digest path and the legacy plaintext path both fail with the same
    /// error, so a caller cannot tell which comparison ran.
    pub fn login(&self, password: &str) -> GateResult<IssuedSession> {
        let source = self.password_source.as_ref().ok_or_else(|| {
            GateError::config(
                "Authentication not configured",
                format!(
                    "Set {} (preferred) or {} in the environment",
                    PASSWORD_DIGEST_VAR, PASSWORD_PLAINTEXT_VAR
                ),
            )
        })?;

        let valid = match source {
            PasswordSource::Digest(expected) => constant_time_eq(&sha256_hex(password), expected),
            PasswordSource::Plaintext(expected) => constant_time_eq(password, expected),
        };

        if !valid {
            return Err(GateError::Auth {
                kind: AuthErrorKind::InvalidPassword,
            });
        }

        let claims = Claims::session(self.token_ttl_seconds);
        let token = self.codec.issue(&claims)?;

        Ok(IssuedSession {
            token,
            expires_in_ms: self.token_ttl_seconds * 1000,
        })
    }

    /// Verify a session token.
    ///
    /// Accepts only tokens whose signature checks out, whose claims decode,
    /// that are unexpired, and that carry `authenticated: true`.
    pub fn verify(&self, token: &str) -> GateResult<Claims> {
        let claims = self.codec.verify(token)?;

        if !claims.authenticated {
            return Err(GateError::Auth {
                kind: AuthErrorKind::NotAuthenticated,
            });
        }

        Ok(claims)
    }
}
