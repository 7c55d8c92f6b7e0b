//! Response bodies for the auth endpoint.

use serde::{Deserialize, Serialize};

/// Body of a login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginBody {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Token lifetime in milliseconds.
    #[serde(
        rename = "expiresIn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginBody {
    pub fn issued(token: String, expires_in_ms: u64) -> Self {
        Self {
            success: true,
            token: Some(token),
            expires_in: Some(expires_in_ms),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            token: None,
            expires_in: None,
            error: Some(error.into()),
        }
    }
}

/// Body of a verify response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyBody {
    pub success: bool,
    pub authenticated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyBody {
    pub fn authenticated() -> Self {
        Self {
            success: true,
            authenticated: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            authenticated: false,
            error: Some(error.into()),
        }
    }
}

/// Body of a validation, configuration, or internal failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    /// Remediation hint for operator-facing configuration errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Internal detail, attached only outside production mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            hint: None,
            detail: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach internal detail unless running in production mode.
    pub fn with_detail_unless_production(mut self, detail: impl Into<String>, production: bool) -> Self {
        if !production {
            self.detail = Some(detail.into());
        }
        self
    }
}
