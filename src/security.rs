use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Header carrying the Sanity webhook signature
pub const SIGNATURE_HEADER_NAME: &str = "sanity-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

/// Constant-time string comparison to prevent timing attacks
/// Use this for comparing API keys, webhook signatures, and other sensitive values
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Compute the `v1` signature for a webhook payload.
pub fn sign_payload(body: &str, timestamp: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Build a complete signature header value (`t=<ts>,v1=<sig>`).
pub fn encode_signature_header(body: &str, timestamp: &str, secret: &str) -> String {
    format!("t={},v1={}", timestamp, sign_payload(body, timestamp, secret))
}

/// Check a `sanity-webhook-signature` header against the raw request body.
///
/// The header looks like `t=1700000000000,v1=<base64url>`. Anything that
/// does not parse is treated as an invalid signature.
pub fn verify_sanity_signature(body: &str, header: &str, secret: &str) -> bool {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return false;
    };
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    constant_time_compare(&sign_payload(body, timestamp, secret), signature)
}
