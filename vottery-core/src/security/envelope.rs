//! Reversible session envelope encoding.
//!
//! This is a lightweight packaging format, not a security boundary: the
//! encoding is base64 over JSON and provides no confidentiality. Production
//! configuration wraps payloads in an envelope carrying a timestamp, the
//! per-instance nonce, and the device identifier, and enforces a freshness
//! window on decode. A device-identifier mismatch is logged, not rejected.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, VotteryError};

/// Maximum envelope age accepted in production (1 hour).
pub const ENVELOPE_MAX_AGE_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    data: Value,
    /// Unix timestamp in milliseconds at encode time
    timestamp: i64,
    nonce: String,
    device_id: String,
}

/// Encode a payload. Development configuration is a direct base64 encoding
/// of the serialized payload; production wraps it in the envelope first.
pub fn encode(payload: &Value, production: bool, nonce: &str, device_id: &str) -> Result<String> {
    let json = if production {
        let envelope = Envelope {
            data: payload.clone(),
            timestamp: Utc::now().timestamp_millis(),
            nonce: nonce.to_string(),
            device_id: device_id.to_string(),
        };
        serde_json::to_string(&envelope)
            .map_err(|e| VotteryError::SerializationError(e.to_string()))?
    } else {
        serde_json::to_string(payload)
            .map_err(|e| VotteryError::SerializationError(e.to_string()))?
    };
    Ok(BASE64.encode(json))
}

/// Decode a blob produced by [`encode`].
///
/// In production, `max_age_ms` enforces a freshness window (stale blobs
/// fail with [`VotteryError::StaleEnvelope`]); pass `None` for payloads
/// with their own lifetime rules, such as session records under the
/// session TTL. A device-identifier mismatch is warned about without
/// rejecting. Parse failures degrade: first a single-level decode of the
/// base64 text is attempted, and as a last resort the raw input is
/// returned unchanged as a string value.
pub fn decode(
    blob: &str,
    production: bool,
    current_device_id: &str,
    max_age_ms: Option<i64>,
) -> Result<Value> {
    let text = match BASE64
        .decode(blob)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(text) => text,
        // Not base64 at all: hand the raw input back unchanged
        None => return Ok(Value::String(blob.to_string())),
    };

    if production {
        if let Ok(envelope) = serde_json::from_str::<Envelope>(&text) {
            if let Some(max_ms) = max_age_ms {
                let age_ms = Utc::now().timestamp_millis() - envelope.timestamp;
                if age_ms > max_ms {
                    return Err(VotteryError::StaleEnvelope { age_ms, max_ms });
                }
            }
            if envelope.device_id != current_device_id {
                warn!(
                    embedded = %envelope.device_id,
                    current = %current_device_id,
                    "Envelope device identifier does not match current device"
                );
            }
            return Ok(envelope.data);
        }
    }

    // Development blob, or a production blob without a parseable envelope:
    // single-level decode of the inner text
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Ok(value),
        Err(_) => Ok(Value::String(text)),
    }
}
