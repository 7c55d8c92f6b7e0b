//! Request body for the auth endpoint.

use serde::{Deserialize, Serialize};

/// A request to the auth endpoint, dispatched on the `action` field.
///
/// The credential fields are optional at the serde level so that a present
/// action with a missing field can be answered with a targeted 400 instead
/// of a generic parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuthRequest {
    Login {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    Verify {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

impl AuthRequest {
    pub fn login(password: impl Into<String>) -> Self {
        Self::Login {
            password: Some(password.into()),
        }
    }

    pub fn verify(token: impl Into<String>) -> Self {
        Self::Verify {
            token: Some(token.into()),
        }
    }
}
