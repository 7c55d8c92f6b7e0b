//! Best-effort client identifier for rate limiting.
//!
//! A heuristic fingerprint from signals available on the machine, not a
//! security boundary. Two clients on the same host share an identifier,
//! which only makes the lockout stricter.

use super::digest::sha256_hex;

/// Derive a stable identifier for this client.
///
/// Combines the hostname, the machine id where present, the current user,
/// and the OS/arch pair, then hashes the result so none of the raw signals
/// travel anywhere.
pub fn client_identifier() -> String {
    let mut parts = Vec::new();

    if let Ok(name) = hostname::get() {
        parts.push(name.to_string_lossy().to_string());
    }

    if let Ok(machine_id) = std::fs::read_to_string("/etc/machine-id") {
        parts.push(machine_id.trim().to_string());
    }

    if let Ok(user) = std::env::var("USER") {
        parts.push(user);
    }

    parts.push(format!(
        "{}:{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    ));

    let digest = sha256_hex(&parts.join("|"));
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_is_stable() {
        assert_eq!(client_identifier(), client_identifier());
    }

    #[test]
    fn test_identifier_shape() {
        let id = client_identifier();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
