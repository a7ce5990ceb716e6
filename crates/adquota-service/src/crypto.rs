//! Cryptographic utilities: webhook signature verification and viewer
//! fingerprints.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the fingerprint hash.
const FINGERPRINT_LEN: usize = 16;

/// Compute HMAC-SHA256 and return the hex-encoded result.
///
/// # Panics
///
/// This function will never panic in practice. The `expect` call is guarded
/// by the invariant that HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    let result = mac.finalize();

    hex::encode(result.into_bytes())
}

/// Constant-time string comparison to prevent timing attacks when verifying
/// signatures.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Derive a coarse viewer fingerprint from network/client signals.
///
/// This is a dedup bucket, not an identity: viewers sharing an address and
/// user agent collapse into one fingerprint, and that imprecision is
/// accepted.
#[must_use]
pub fn viewer_fingerprint(client_ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_ip.as_bytes());
    hasher.update(b"|");
    hasher.update(user_agent.as_bytes());
    let digest = hasher.finalize();

    hex::encode(digest)[..FINGERPRINT_LEN].to_string()
}
