//! # Payment gateway signatures
//!
//! The gateway signs two kinds of messages with secrets we share with it.
//!
//! * The checkout callback. After the customer pays, the browser hands us the gateway's order id, payment id and a
//!   signature. The signature is the hex-encoded HMAC-SHA256 of
//!
//!   ```text
//!      {gateway_order_id}|{gateway_payment_id}
//!   ```
//!
//!   keyed with the gateway *key secret*.
//! * Webhook calls. The signature header carries the hex-encoded HMAC-SHA256 of the raw request body, keyed with the
//!   *webhook secret*.
//!
//! Comparisons are constant-time. An empty secret is always an error and never verifies anything.
use hmac::{Hmac, Mac};
use livique_common::Secret;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The signing secret has not been configured")]
    MissingSecret,
    #[error("Could not initialise the signature MAC: {0}")]
    InvalidKey(String),
}

fn mac_for(secret: &Secret<String>) -> Result<HmacSha256, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    HmacSha256::new_from_slice(secret.reveal().as_bytes()).map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

/// The gateway sends lowercase hex. Anything else, including surrounding whitespace or uppercase digits, is rejected
/// before the constant-time comparison.
fn verify_hex(mac: HmacSha256, signature: &str) -> bool {
    let canonical = signature.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !canonical {
        return false;
    }
    match hex::decode(signature) {
        Ok(bytes) => mac.verify_slice(&bytes).is_ok(),
        Err(_) => false,
    }
}

/// Computes the hex-encoded checkout signature for the given gateway order and payment ids.
pub fn calculate_payment_signature(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    secret: &Secret<String>,
) -> Result<String, SignatureError> {
    let mut mac = mac_for(secret)?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the signature the gateway returned at checkout.
pub fn verify_payment_signature(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    signature: &str,
    secret: &Secret<String>,
) -> Result<bool, SignatureError> {
    let mut mac = mac_for(secret)?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    Ok(verify_hex(mac, signature))
}

pub fn calculate_webhook_signature(body: &[u8], secret: &Secret<String>) -> Result<String, SignatureError> {
    let mut mac = mac_for(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a webhook signature against the exact bytes that were received.
pub fn verify_webhook_signature(body: &[u8], signature: &str, secret: &Secret<String>) -> Result<bool, SignatureError> {
    let mut mac = mac_for(secret)?;
    mac.update(body);
    Ok(verify_hex(mac, signature))
}
