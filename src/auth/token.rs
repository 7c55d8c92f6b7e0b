//! HMAC-SHA256 signed token issuance and verification.
//!
//! Tokens are three URL-safe base64 segments joined by `.`:
//! a fixed header, the claims payload, and an HMAC-SHA256 signature over
//! `header.payload`. No padding characters in any segment.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::error::{AuthErrorKind, GateError, GateResult};

/// Fixed token header. Serialized literally so issuance is deterministic.
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Claims carried by a session token.
///
/// Field names match the wire format of previously issued tokens:
/// `timestamp` is the issuance time in milliseconds, `exp` the expiry in
/// epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub authenticated: bool,
    #[serde(rename = "timestamp")]
    pub issued_at_ms: u64,
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl Claims {
    /// Claims for a fresh authenticated session expiring `ttl_seconds` from now.
    pub fn session(ttl_seconds: u64) -> Self {
        Self {
            authenticated: true,
            issued_at_ms: now_millis(),
            expires_at: Some(now_seconds() + ttl_seconds),
        }
    }
}

/// Stateless codec over a configured signing secret.
pub struct TokenCodec {
    key: hmac::Key,
}

impl TokenCodec {
    /// Create a codec signing with the given secret.
    pub fn new(secret: &str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
        }
    }

    /// Serialize and sign the claims into a three-segment token.
    pub fn issue(&self, claims: &Claims) -> GateResult<String> {
        let header_segment = URL_SAFE_NO_PAD.encode(HEADER);
        let payload_segment = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);

        let signing_input = format!("{}.{}", header_segment, payload_segment);
        let tag = hmac::sign(&self.key, signing_input.as_bytes());
        let signature_segment = URL_SAFE_NO_PAD.encode(tag.as_ref());

        Ok(format!("{}.{}", signing_input, signature_segment))
    }

    /// Verify a token and return its claims.
    ///
    /// The signature is recomputed over the first two segments and compared
    /// in constant time. A wrong segment count, an undecodable payload, a
    /// signature mismatch, and an expired `exp` all fail; callers must not
    /// distinguish these cases in anything sent back to a client.
    pub fn verify(&self, token: &str) -> GateResult<Claims> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(GateError::Auth {
                kind: AuthErrorKind::MalformedToken {
                    message: format!("expected 3 segments, got {}", segments.len()),
                },
            });
        }

        let signing_input = format!("{}.{}", segments[0], segments[1]);
        let signature = URL_SAFE_NO_PAD.decode(segments[2]).map_err(|_| GateError::Auth {
            kind: AuthErrorKind::InvalidSignature,
        })?;

        hmac::verify(&self.key, signing_input.as_bytes(), &signature).map_err(|_| {
            GateError::Auth {
                kind: AuthErrorKind::InvalidSignature,
            }
        })?;

        let payload = URL_SAFE_NO_PAD.decode(segments[1]).map_err(|_| GateError::Auth {
            kind: AuthErrorKind::MalformedToken {
                message: "payload is not valid base64url".to_string(),
            },
        })?;

        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| GateError::Auth {
            kind: AuthErrorKind::MalformedToken {
                message: "payload is not a claims object".to_string(),
            },
        })?;

        if let Some(expires_at) = claims.expires_at {
            let now = now_seconds();
            if now >= expires_at {
                return Err(GateError::Auth {
                    kind: AuthErrorKind::TokenExpired {
                        expired_seconds: now - expires_at,
                    },
                });
            }
        }

        Ok(claims)
    }
}

/// Current time in epoch seconds.
pub fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-signing-secret")
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let claims = Claims::session(86_400);

        let token = codec.issue(&claims).unwrap();
        let decoded = codec.verify(&token).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_round_trip_without_expiry() {
        let codec = codec();
        let claims = Claims {
            authenticated: true,
            issued_at_ms: 1_700_000_000_000,
            expires_at: None,
        };

        let token = codec.issue(&claims).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), claims);
    }

    #[test]
    fn test_token_has_three_unpadded_segments() {
        let token = codec().issue(&Claims::session(60)).unwrap();
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_tampering_any_segment_invalidates() {
        let codec = codec();
        let token = codec.issue(&Claims::session(86_400)).unwrap();

        for i in 0..token.len() {
            let original = token.as_bytes()[i];
            if original == b'.' {
                continue;
            }
            let replacement = if original == b'A' { b'B' } else { b'A' };
            let mut tampered = token.clone().into_bytes();
            tampered[i] = replacement;
            let tampered = String::from_utf8(tampered).unwrap();

            assert!(
                codec.verify(&tampered).is_err(),
                "flipping byte {} went undetected",
                i
            );
        }
    }

    #[test]
    fn test_wrong_segment_count_rejected() {
        let codec = codec();
        assert!(matches!(
            codec.verify("a.b"),
            Err(GateError::Auth {
                kind: AuthErrorKind::MalformedToken { .. }
            })
        ));
        assert!(codec.verify("a.b.c.d").is_err());
        assert!(codec.verify("").is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = codec().issue(&Claims::session(86_400)).unwrap();
        let other = TokenCodec::new("a-different-secret");
        assert!(matches!(
            other.verify(&token),
            Err(GateError::Auth {
                kind: AuthErrorKind::InvalidSignature
            })
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let claims = Claims {
            authenticated: true,
            issued_at_ms: now_millis(),
            expires_at: Some(now_seconds() - 1),
        };

        let token = codec.issue(&claims).unwrap();
        assert!(matches!(
            codec.verify(&token),
            Err(GateError::Auth {
                kind: AuthErrorKind::TokenExpired { .. }
            })
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();

        // Just inside the lifetime: accepted.
        let live = Claims {
            authenticated: true,
            issued_at_ms: now_millis(),
            expires_at: Some(now_seconds() + 5),
        };
        assert!(codec.verify(&codec.issue(&live).unwrap()).is_ok());

        // exp == now counts as expired.
        let edge = Claims {
            authenticated: true,
            issued_at_ms: now_millis(),
            expires_at: Some(now_seconds()),
        };
        assert!(codec.verify(&codec.issue(&edge).unwrap()).is_err());
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let codec = codec();
        // Sign a token whose payload is valid base64 but not a claims object.
        let header = URL_SAFE_NO_PAD.encode(HEADER);
        let payload = URL_SAFE_NO_PAD.encode(b"not json at all");
        let signing_input = format!("{}.{}", header, payload);
        let tag = hmac::sign(&codec.key, signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(tag.as_ref()));

        assert!(matches!(
            codec.verify(&token),
            Err(GateError::Auth {
                kind: AuthErrorKind::MalformedToken { .. }
            })
        ));
    }
}
