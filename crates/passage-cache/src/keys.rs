//! Key builders for every coordination store entry.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. The configured store prefix
//! is applied by the Redis client, not here.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`.
///
/// Raw identifiers (emails, usernames, client keys) are never embedded in
/// store keys; their digest is.
pub fn digest(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

// ── Revocation ─────────────────────────────────────────────

/// Deny-list entry for a single credential id.
pub fn denied_jti(jti: &str) -> String {
    format!("deny:jti:{jti}")
}

// ── Registration ───────────────────────────────────────────

/// Lease guarding registration of a normalized email.
pub fn register_email_lock(email: &str) -> String {
    format!("lock:register:email:{}", digest(email))
}

/// Lease guarding registration of a normalized username.
pub fn register_username_lock(username: &str) -> String {
    format!("lock:register:username:{}", digest(username))
}

/// Outcome stamp for a completed registration of `(email, username)`.
pub fn register_stamp(email: &str, username: &str) -> String {
    format!("idem:register:{}", digest(&format!("{email}|{username}")))
}

/// Outcome stamp for a client-supplied idempotency key.
pub fn request_stamp(idempotency_key: &str) -> String {
    format!("idem:req:register:{}", digest(idempotency_key))
}

// ── Rate limiting ──────────────────────────────────────────

/// Fixed-window counter for an identity on a route.
pub fn rate_limit(identity: &str, route: &str) -> String {
    format!("rl:{identity}:{route}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_sha256() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_register_keys_hide_raw_identifiers() {
        let key = register_email_lock("a@x.com");
        assert!(key.starts_with("lock:register:email:"));
        assert!(!key.contains("a@x.com"));
        assert_ne!(register_stamp("a@x.com", "ab"), register_stamp("a@x.co", "mab"));
    }

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(rate_limit("10.0.0.1", "/api/auth/login"), "rl:10.0.0.1:/api/auth/login");
    }
}
