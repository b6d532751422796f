//! Raw ambient browser signals feeding device detection.
//!
//! Signal collection happens at the host boundary (the Wasm layer reads
//! `navigator.*`, `screen.*` and friends); this module only defines the
//! record those reads produce. A missing signal substitutes [`UNKNOWN_SIGNAL`]
//! for strings and `None` for numeric values, so collection never fails.

use serde::{Deserialize, Serialize};

/// Sentinel substituted for any string signal the host cannot provide.
pub const UNKNOWN_SIGNAL: &str = "unknown";

/// Network connection details (`navigator.connection`), when exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Effective connection type (e.g. "4g")
    pub effective_type: String,
    /// Downlink estimate in Mbps
    pub downlink_mbps: f64,
    /// Round-trip estimate in milliseconds
    pub rtt_ms: f64,
}

/// Ambient environment signals read once per page load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSignals {
    /// Full user-agent string (`navigator.userAgent`)
    pub user_agent: String,
    /// Platform string (`navigator.platform`)
    pub platform: String,
    /// Preferred language tag (`navigator.language`)
    pub language: String,
    /// Screen width in CSS pixels
    pub screen_width: u32,
    /// Screen height in CSS pixels
    pub screen_height: u32,
    /// IANA timezone name (e.g. "Europe/Paris")
    pub timezone: String,
    /// Offset from UTC in minutes (`Date.getTimezoneOffset` convention)
    pub timezone_offset_minutes: i32,
    /// Logical processor count (`navigator.hardwareConcurrency`)
    pub hardware_concurrency: Option<u32>,
    /// Approximate device memory in GiB (`navigator.deviceMemory`)
    pub device_memory_gb: Option<f64>,
    /// Data-URL snapshot of a freshly rendered probe canvas
    pub canvas_data_url: Option<String>,
    /// Network connection details, when the host exposes them
    pub connection: Option<ConnectionInfo>,
    /// Whether `window.PublicKeyCredential` exists
    pub webauthn_available: bool,
}

impl Default for DeviceSignals {
    fn default() -> Self {
        Self {
            user_agent: UNKNOWN_SIGNAL.to_string(),
            platform: UNKNOWN_SIGNAL.to_string(),
            language: UNKNOWN_SIGNAL.to_string(),
            screen_width: 0,
            screen_height: 0,
            timezone: UNKNOWN_SIGNAL.to_string(),
            timezone_offset_minutes: 0,
            hardware_concurrency: None,
            device_memory_gb: None,
            canvas_data_url: None,
            connection: None,
            webauthn_available: false,
        }
    }
}

impl DeviceSignals {
    /// Screen dimensions rendered as "WxH".
    pub fn screen_resolution(&self) -> String {
        format!("{}x{}", self.screen_width, self.screen_height)
    }

    /// Hardware concurrency rendered for fingerprint input, with the
    /// unknown sentinel when the host did not expose it.
    pub(crate) fn concurrency_signal(&self) -> String {
        self.hardware_concurrency
            .map(|c| c.to_string())
            .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string())
    }

    /// Device memory rendered for fingerprint input.
    pub(crate) fn memory_signal(&self) -> String {
        self.device_memory_gb
            .map(|m| m.to_string())
            .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string())
    }
}
