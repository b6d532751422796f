//! User-agent classification and biometric capability hints.
//!
//! Classification is a best-effort, non-authoritative read of the user-agent
//! string. Tablet patterns are checked before the generic mobile patterns,
//! and Safari detection explicitly excludes Chrome (Chrome's user-agent also
//! contains "Safari"). Biometric hints are heuristics derived from the OS
//! plus WebAuthn presence, not verified platform capabilities.

use serde::{Deserialize, Serialize};

use super::fingerprint::derive_device_id;
use super::signals::DeviceSignals;

/// Coarse device class derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    Ios,
    Android,
    Windows,
    MacOs,
    Linux,
    Unknown,
}

/// Browser family, first-match priority: Chrome, Firefox, Safari, Edge, Opera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Opera,
    Unknown,
}

/// Biometric capability hint exposed to the signup flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricCapability {
    TouchId,
    FaceId,
    Fingerprint,
    PlatformAuthentication,
}

impl std::fmt::Display for BiometricCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::TouchId => "Touch ID",
            Self::FaceId => "Face ID",
            Self::Fingerprint => "Fingerprint",
            Self::PlatformAuthentication => "Platform Authentication",
        };
        f.write_str(label)
    }
}

/// Tablet patterns, checked before the generic mobile patterns.
const TABLET_PATTERNS: [&str; 5] = ["ipad", "tablet", "kindle", "silk", "playbook"];

/// Generic mobile patterns.
const MOBILE_PATTERNS: [&str; 6] = [
    "iphone",
    "ipod",
    "mobi",
    "blackberry",
    "windows phone",
    "opera mini",
];

impl DeviceClass {
    /// Classify from a user-agent string. Android without "Mobile" is a
    /// tablet per the Android user-agent convention.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if TABLET_PATTERNS.iter().any(|p| ua.contains(p)) {
            return Self::Tablet;
        }
        if ua.contains("android") {
            return if ua.contains("mobi") {
                Self::Mobile
            } else {
                Self::Tablet
            };
        }
        if MOBILE_PATTERNS.iter().any(|p| ua.contains(p)) {
            return Self::Mobile;
        }
        Self::Desktop
    }
}

impl Os {
    /// Classify the OS family. iOS is checked before macOS because iPad
    /// user-agents contain "like Mac OS X".
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
            Self::Ios
        } else if ua.contains("android") {
            Self::Android
        } else if ua.contains("windows") {
            Self::Windows
        } else if ua.contains("mac os") || ua.contains("macintosh") {
            Self::MacOs
        } else if ua.contains("linux") {
            Self::Linux
        } else {
            Self::Unknown
        }
    }
}

impl Browser {
    /// Classify the browser with first-match priority Chrome, Firefox,
    /// Safari, Edge, Opera. Chromium-based Edge and Opera user-agents
    /// contain "Chrome" and therefore classify as Chrome; the later arms
    /// only catch legacy user-agents.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("chrome") {
            Self::Chrome
        } else if ua.contains("firefox") {
            Self::Firefox
        } else if ua.contains("safari") {
            Self::Safari
        } else if ua.contains("edge") || ua.contains("edg/") {
            Self::Edge
        } else if ua.contains("opera") || ua.contains("opr/") {
            Self::Opera
        } else {
            Self::Unknown
        }
    }
}

/// Best-effort description of the current browsing environment.
///
/// Computed once per page load and immutable afterwards. The `device_id` is
/// stable only while none of the contributing signals change; a screen
/// resize, rotation, or language change produces a different identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub class: DeviceClass,
    pub os: Os,
    pub browser: Browser,
    /// Whether `window.PublicKeyCredential` exists
    pub webauthn_available: bool,
    /// Touch ID implied: iOS with WebAuthn present (heuristic)
    pub touch_id_hint: bool,
    /// Face ID implied: iOS with WebAuthn present (heuristic)
    pub face_id_hint: bool,
    /// Fingerprint implied: Android or Windows with WebAuthn present (heuristic)
    pub fingerprint_hint: bool,
    /// 32-character per-session device identifier
    pub device_id: String,
}

impl DeviceInfo {
    /// Capability list for the biometric registration step.
    ///
    /// Falls back to a single `PlatformAuthentication` entry when WebAuthn
    /// exists but no OS-specific hint matched, and to an empty list when
    /// WebAuthn is absent.
    pub fn biometric_capabilities(&self) -> Vec<BiometricCapability> {
        if !self.webauthn_available {
            return Vec::new();
        }
        let mut capabilities = Vec::new();
        if self.touch_id_hint {
            capabilities.push(BiometricCapability::TouchId);
        }
        if self.face_id_hint {
            capabilities.push(BiometricCapability::FaceId);
        }
        if self.fingerprint_hint {
            capabilities.push(BiometricCapability::Fingerprint);
        }
        if capabilities.is_empty() {
            capabilities.push(BiometricCapability::PlatformAuthentication);
        }
        capabilities
    }
}

/// Derive a [`DeviceInfo`] from collected signals. Infallible: unknown or
/// missing signals degrade to `Unknown` variants and sentinel values.
pub fn detect(signals: &DeviceSignals) -> DeviceInfo {
    let os = Os::from_user_agent(&signals.user_agent);
    let webauthn = signals.webauthn_available;

    DeviceInfo {
        class: DeviceClass::from_user_agent(&signals.user_agent),
        os,
        browser: Browser::from_user_agent(&signals.user_agent),
        webauthn_available: webauthn,
        touch_id_hint: os == Os::Ios && webauthn,
        face_id_hint: os == Os::Ios && webauthn,
        fingerprint_hint: (os == Os::Android || os == Os::Windows) && webauthn,
        device_id: derive_device_id(signals),
    }
}
