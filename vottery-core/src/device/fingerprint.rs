//! Device identifier derivation and the structured session fingerprint.
//!
//! The identifier is a deterministic encoding of ambient signals, not a
//! stable cross-session identity: any contributing signal changing (resize,
//! rotation, language switch) changes the result. It is also reversible in
//! principle and carries no cryptographic rigor; it exists to bind a session
//! to the environment that created it, nothing more.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::signals::{ConnectionInfo, DeviceSignals, UNKNOWN_SIGNAL};

/// Length of the derived device identifier.
pub const DEVICE_ID_LEN: usize = 32;

/// How many trailing characters of the canvas data-URL feed the identifier.
const CANVAS_TAIL_LEN: usize = 32;

/// Derive the 32-character device identifier from collected signals.
///
/// Signals are pipe-delimited, base64-encoded, stripped of non-alphanumeric
/// characters and truncated. Deterministic for a fixed signal set.
pub fn derive_device_id(signals: &DeviceSignals) -> String {
    let canvas_tail = signals
        .canvas_data_url
        .as_deref()
        .map(canvas_url_tail)
        .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string());

    let raw = [
        signals.user_agent.as_str(),
        signals.language.as_str(),
        &signals.screen_resolution(),
        &signals.timezone_offset_minutes.to_string(),
        &signals.concurrency_signal(),
        &signals.memory_signal(),
        &canvas_tail,
    ]
    .join("|");

    BASE64
        .encode(raw)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(DEVICE_ID_LEN)
        .collect()
}

fn canvas_url_tail(url: &str) -> String {
    let len = url.chars().count();
    url.chars().skip(len.saturating_sub(CANVAS_TAIL_LEN)).collect()
}

/// Screen metrics embedded in the fingerprint record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width: u32,
    pub height: u32,
}

/// Hardware block of the fingerprint, skippable for privacy or performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
}

/// Options controlling fingerprint assembly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintOptions {
    /// Include concurrency / memory / connection details. The Wasm layer
    /// maps a query-parameter opt-out onto this flag.
    pub include_hardware: bool,
    /// Include the canvas snapshot. Skipped in development configuration.
    pub include_canvas: bool,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            include_hardware: true,
            include_canvas: true,
        }
    }
}

/// Structured fingerprint handed to downstream registration calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub device_id: String,
    /// Unix timestamp in milliseconds at assembly time
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<ScreenMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<HardwareMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Fingerprint {
    /// Assemble the full fingerprint from signals and the observed referrer.
    pub fn assemble(
        signals: &DeviceSignals,
        device_id: &str,
        referrer: &str,
        options: &FingerprintOptions,
    ) -> Self {
        let hardware = options.include_hardware.then(|| HardwareMetrics {
            concurrency: signals.hardware_concurrency,
            memory_gb: signals.device_memory_gb,
            connection: signals.connection.clone(),
        });
        let canvas = if options.include_canvas {
            signals.canvas_data_url.clone()
        } else {
            None
        };

        Self {
            device_id: device_id.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            user_agent: Some(signals.user_agent.clone()),
            platform: Some(signals.platform.clone()),
            language: Some(signals.language.clone()),
            timezone: Some(signals.timezone.clone()),
            referrer: Some(referrer.to_string()),
            screen: Some(ScreenMetrics {
                width: signals.screen_width,
                height: signals.screen_height,
            }),
            hardware,
            canvas,
            error: None,
        }
    }

    /// Minimal fallback produced when assembly fails internally.
    pub fn fallback(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            user_agent: None,
            platform: None,
            language: None,
            timezone: None,
            referrer: None,
            screen: None,
            hardware: None,
            canvas: None,
            error: Some("generation_failed".to_string()),
        }
    }
}
