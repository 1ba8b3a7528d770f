//! Verification gate: subscription handshake (GET) and payload signature (POST).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SUBSCRIBE_MODE: &str = "subscribe";
const SIGNATURE_PREFIX: &str = "sha256=";

/// Check a subscription handshake. Returns the challenge to echo back on success
/// (empty when the platform sent none), or None when mode or token do not match.
/// A relay without a configured verify token never passes.
pub fn verify_handshake(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: Option<&str>,
) -> Option<String> {
    let expected = expected_token?;
    if mode == Some(SUBSCRIBE_MODE) && token == Some(expected) {
        Some(challenge.unwrap_or_default().to_string())
    } else {
        None
    }
}

fn keyed_mac(secret: &str) -> HmacSha256 {
    // HMAC takes keys of any length; new_from_slice cannot fail here.
    HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length")
}

/// `sha256=<hex>` for `body` keyed with `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Check the `x-hub-signature-256` value against the raw body.
///
/// No secret configured means every payload passes. Otherwise a missing header or empty
/// body fails, and the header must equal `sha256=` followed by the lowercase hex digest.
pub fn verify_signature(secret: Option<&str>, signature: Option<&str>, body: &[u8]) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(signature) = signature else {
        return false;
    };
    if body.is_empty() {
        return false;
    }
    let Some(hex_sig) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    // Exact string match: uppercase hex decodes fine but is not the expected value.
    if hex_sig.len() != 64 || hex_sig.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let mut mac = keyed_mac(secret);
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
