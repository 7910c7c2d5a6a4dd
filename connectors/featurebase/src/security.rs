//! Featurebase webhook signature verification.
//!
//! Featurebase signs `"{timestamp}.{raw body}"` with HMAC-SHA256 using the
//! webhook secret and sends the hex digest in `X-Webhook-Signature`, with the
//! Unix timestamp (seconds) in `X-Webhook-Timestamp`.

use chrono::Utc;
use hmac::{Hmac, Mac, digest::InvalidLength};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Largest accepted distance, in seconds, between the webhook timestamp and
/// the local clock.
pub const TIMESTAMP_TOLERANCE_SECS: u64 = 300;

/// Outcome of a signature check. `error` is set whenever `is_valid` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

/// Verifies a webhook delivery against the current time.
#[must_use]
pub fn verify_featurebase_webhook(
    signature: &str,
    timestamp: &str,
    raw_body: &str,
    secret: &str,
) -> VerificationResult {
    verify_at(Utc::now().timestamp(), signature, timestamp, raw_body, secret)
}

/// Verifies a webhook delivery as if the clock read `now` (Unix seconds).
#[must_use]
pub fn verify_at(
    now: i64,
    signature: &str,
    timestamp: &str,
    raw_body: &str,
    secret: &str,
) -> VerificationResult {
    if signature.is_empty() || timestamp.is_empty() || secret.is_empty() {
        return VerificationResult::invalid("Missing signature, timestamp, or secret");
    }

    let Ok(sent_at) = timestamp.trim().parse::<i64>() else {
        return VerificationResult::invalid(format!(
            "Verification failed: invalid timestamp '{timestamp}'"
        ));
    };

    if now.abs_diff(sent_at) > TIMESTAMP_TOLERANCE_SECS {
        return VerificationResult::invalid("Webhook timestamp too old or too far in the future");
    }

    let expected = match signature_bytes(secret, timestamp, raw_body) {
        Ok(bytes) => bytes,
        Err(e) => return VerificationResult::invalid(format!("Verification failed: {e}")),
    };
    let provided = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(e) => return VerificationResult::invalid(format!("Verification failed: {e}")),
    };

    // Slices of different lengths compare unequal.
    if bool::from(provided.as_slice().ct_eq(expected.as_slice())) {
        VerificationResult::valid()
    } else {
        VerificationResult::invalid("Invalid signature")
    }
}

/// Hex-encoded HMAC-SHA256 of `"{timestamp}.{body}"`.
///
/// # Errors
///
/// Returns [`InvalidLength`] if the secret is rejected as an HMAC key.
pub fn compute_signature(
    secret: &str,
    timestamp: &str,
    body: &str,
) -> Result<String, InvalidLength> {
    signature_bytes(secret, timestamp, body).map(hex::encode)
}

fn signature_bytes(secret: &str, timestamp: &str, body: &str) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
