//! HTTP client for the auth boundary.

use std::time::Duration;

use serde_json::Value;

use crate::error::{GateError, GateResult};
use crate::http::{AuthRequest, LoginBody, VerifyBody, AUTH_ENDPOINT};

/// Timeout applied to the startup verify call only, so a dead boundary
/// cannot block app entry. Interactive login has no timeout.
pub const STARTUP_VERIFY_TIMEOUT: Duration = Duration::from_secs(3);

/// Client for the login/verify endpoint.
pub struct AuthClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AuthClient {
    /// Create a client for a gate at `base_url` (scheme://host:port).
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), AUTH_ENDPOINT),
        }
    }

    /// Submit a password. Returns the boundary's verdict, success or not;
    /// transport failures and non-auth server errors become `Err`.
    pub async fn login(&self, password: &str) -> GateResult<LoginBody> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&AuthRequest::login(password))
            .send()
            .await
            .map_err(transport)?;

        let body: Value = response.json().await.map_err(transport)?;
        parse_verdict(body)
    }

    /// Ask the boundary whether a token is valid.
    pub async fn verify(&self, token: &str) -> GateResult<VerifyBody> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&AuthRequest::verify(token))
            .send()
            .await
            .map_err(transport)?;

        let body: Value = response.json().await.map_err(transport)?;
        parse_verdict(body)
    }

    /// Verify with the startup timeout applied.
    pub async fn verify_with_timeout(&self, token: &str) -> GateResult<VerifyBody> {
        tokio::time::timeout(STARTUP_VERIFY_TIMEOUT, self.verify(token))
            .await
            .map_err(|_| GateError::Transport {
                message: format!(
                    "verify timed out after {}s",
                    STARTUP_VERIFY_TIMEOUT.as_secs()
                ),
            })?
    }
}

/// Interpret a boundary response body.
///
/// Verdicts (success true/false) deserialize into the typed body; anything
/// without a `success` field is a validation/configuration/internal error
/// and surfaces as a transport-level failure with the server's message.
fn parse_verdict<T: serde::de::DeserializeOwned>(body: Value) -> GateResult<T> {
    if body.get("success").is_some() {
        return serde_json::from_value(body).map_err(GateError::Serialization);
    }

    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unrecognized response from auth boundary")
        .to_string();
    Err(GateError::Transport { message })
}

fn transport(err: reqwest::Error) -> GateError {
    GateError::Transport {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_verdicts_parse() {
        let ok: LoginBody =
            parse_verdict(json!({"success": true, "token": "t", "expiresIn": 86400000u64}))
                .unwrap();
        assert!(ok.success);
        assert_eq!(ok.expires_in, Some(86_400_000));

        let rejected: LoginBody =
            parse_verdict(json!({"success": false, "error": "Invalid password"})).unwrap();
        assert!(!rejected.success);
    }

    #[test]
    fn test_verify_verdicts_parse() {
        let rejected: VerifyBody = parse_verdict(json!({
            "success": false,
            "authenticated": false,
            "error": "Invalid or expired token"
        }))
        .unwrap();
        assert!(!rejected.authenticated);
    }

    #[test]
    fn test_non_verdict_body_is_a_transport_error() {
        let err = parse_verdict::<LoginBody>(json!({"error": "Password is required"})).unwrap_err();
        match err {
            GateError::Transport { message } => assert_eq!(message, "Password is required"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
