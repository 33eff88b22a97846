//! Signing and verification of approval callback requests.
//!
//! Callbacks carry a unix timestamp and a signature header of the form `v0=<hex>`, where the hex digest is
//! `HMAC-SHA256(secret, "v0:{timestamp}:{body}")` over the raw request body. Verification rejects requests
//! whose timestamp is outside the replay window before any signature work is done, so an attacker replaying a
//! captured request learns nothing about the signature check.

use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Requests whose timestamp differs from the current time by more than this many seconds are rejected,
/// regardless of whether the signature is valid.
pub const REPLAY_WINDOW_SECS: i64 = 300;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("The request timestamp is outside the replay window")]
    StaleTimestamp,
    #[error("The request timestamp could not be parsed")]
    MalformedTimestamp,
    #[error("The signature does not match the request body")]
    InvalidSignature,
}

/// Computes the `v0=`-prefixed signature for the given timestamp and body.
pub fn sign_callback(secret: &str, timestamp: i64, body: &str) -> String {
    let base = format!("v0:{timestamp}:{body}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base.as_bytes());
    let digest = mac.finalize().into_bytes();
    format!("v0={}", hex::encode(digest))
}

/// Verifies a callback against the current wall clock. See [`verify_callback_at`].
pub fn verify_callback(secret: &str, timestamp: &str, body: &str, signature: &str) -> Result<(), SignatureError> {
    verify_callback_at(secret, timestamp, body, signature, chrono::Utc::now().timestamp())
}

/// Verifies a callback as of the given unix time.
///
/// The replay window is checked first and independently of the signature. The signature comparison itself is
/// constant time over the full signature string.
pub fn verify_callback_at(
    secret: &str,
    timestamp: &str,
    body: &str,
    signature: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let ts: i64 = timestamp.trim().parse().map_err(|_| {
        warn!("Rejecting callback with unparseable timestamp {timestamp:?}");
        SignatureError::MalformedTimestamp
    })?;
    if (now - ts).abs() > REPLAY_WINDOW_SECS {
        warn!("Rejecting callback with stale timestamp {ts} (now {now})");
        return Err(SignatureError::StaleTimestamp);
    }
    let expected = sign_callback(secret, ts, body);
    if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
        Ok(())
    } else {
        warn!("Rejecting callback with invalid signature");
        Err(SignatureError::InvalidSignature)
    }
}
