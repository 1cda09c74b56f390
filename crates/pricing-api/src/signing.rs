//! # Quote Signing
//!
//! A quote handed to the storefront carries an HMAC-SHA256 signature over
//! the breakdown fingerprint. When the order comes back, the server re-prices
//! it and checks the signature against the new fingerprint. Any change in
//! prices, stock-relevant settings or coupon state in between makes the
//! signature stale.
//!
//! ```text
//!   quote:  breakdown ──fingerprint()──► sha256 hex ──HMAC(secret)──► signature
//!   order:  re-priced breakdown ──► same pipeline ──► constant-time compare
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies quote fingerprints
#[derive(Clone)]
pub struct QuoteSigner {
    secret: String,
}

impl QuoteSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Hex HMAC-SHA256 of `fingerprint`
    pub fn sign(&self, fingerprint: &str) -> String {
        compute_hmac_sha256(&self.secret, fingerprint)
    }

    pub fn verify(&self, fingerprint: &str, signature: &str) -> bool {
        constant_time_compare(&self.sign(fingerprint), signature)
    }
}

impl std::fmt::Debug for QuoteSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteSigner").field("secret", &"[REDACTED]").finish()
    }
}

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    // new_from_slice only rejects keys for fixed-size MACs; HMAC takes any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.is_empty() || a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
