//! WebAssembly bindings for the Vottery client security context.
//!
//! [`Security`] wraps the core session provider over browser-ambient
//! inputs: `navigator.*` and `screen.*` feed device detection, per-tab
//! `sessionStorage` backs the storage trait, and deferred work (fingerprint
//! assembly, the session commit) rides `requestIdleCallback` with a bounded
//! timeout. Structured results cross the boundary as JSON strings.

mod schedule;
mod signals;
mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::AbortController;

use vottery_core::security::DEV_MODE_KEY;
use vottery_core::{
    is_dev_hostname, DeviceInfo, EphemeralStorage, FingerprintOptions, SecurityConfig,
    SecuritySession, SessionRecord, SessionStatus,
};

use crate::storage::TabStorage;

/// Upper bound before deferred work runs even on a busy main thread.
const IDLE_TIMEOUT_MS: u32 = 2_000;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Host-supplied configuration overrides, parsed from a JSON string.
/// Absent fields fall back to hostname-derived defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HostConfig {
    production: Option<bool>,
    force_bypass: bool,
    trusted_origins: Option<Vec<String>>,
}

/// Device detection result handed to the host.
#[derive(Serialize)]
struct DeviceReport {
    #[serde(flatten)]
    info: DeviceInfo,
    /// Human-readable biometric method labels, in registration order
    biometric_capabilities: Vec<String>,
}

/// Session validation result handed to the host.
#[derive(Serialize)]
struct SessionCheck {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SessionRecord>,
}

/// The client security context handle exposed to JavaScript.
#[wasm_bindgen]
pub struct Security {
    inner: Rc<RefCell<SecuritySession<TabStorage>>>,
    /// Cancels deferred work queued by this handle
    pending: RefCell<AbortController>,
    lite_fingerprint: bool,
}

#[wasm_bindgen]
impl Security {
    /// Build a security context from ambient browser state.
    ///
    /// `config_json` may override `production`, `force_bypass` and
    /// `trusted_origins`; when `production` is absent it is inferred from
    /// the page hostname. WebAuthn availability uses the presence
    /// heuristic; use [`init_security`] to probe the platform
    /// authenticator instead.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Security, JsValue> {
        Self::build(config_json.as_deref(), None)
    }

    /// Detected device information with biometric capability labels, as
    /// JSON.
    pub fn device_info(&self) -> Result<String, JsValue> {
        let inner = self.inner.borrow();
        let device = inner.device();
        let report = DeviceReport {
            info: device.clone(),
            biometric_capabilities: device
                .biometric_capabilities()
                .iter()
                .map(ToString::to_string)
                .collect(),
        };
        serde_json::to_string(&report).map_err(to_js)
    }

    /// Validate the page referrer off the first paint.
    ///
    /// Returns a promise resolving to JSON `{is_valid, source}` on the next
    /// idle period. The underlying result is cached, so later calls resolve
    /// with the same value.
    pub fn check_referrer(&self) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        let signal = self.pending.borrow().signal();

        future_to_promise(async move {
            schedule::idle_tick(IDLE_TIMEOUT_MS).await;
            if signal.aborted() {
                return Err(JsValue::from_str("security context disposed"));
            }
            let validation = inner.borrow_mut().check_referrer();
            serde_json::to_string(&validation)
                .map(|json| JsValue::from_str(&json))
                .map_err(to_js)
        })
    }

    /// Assemble the device fingerprint off the critical path.
    ///
    /// Returns a promise resolving to the fingerprint JSON once the
    /// browser reaches an idle period (bounded by the idle timeout).
    /// `options_json` may set `include_hardware` / `include_canvas`; the
    /// page-level lite flag forces hardware details off.
    pub fn generate_fingerprint(&self, options_json: Option<String>) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        let signal = self.pending.borrow().signal();
        let lite = self.lite_fingerprint;

        future_to_promise(async move {
            let mut options: FingerprintOptions = match options_json.as_deref() {
                Some(raw) => serde_json::from_str(raw).map_err(to_js)?,
                None => FingerprintOptions::default(),
            };
            if lite {
                options.include_hardware = false;
            }

            schedule::idle_tick(IDLE_TIMEOUT_MS).await;
            if signal.aborted() {
                return Err(JsValue::from_str("security context disposed"));
            }

            let mut session = inner.borrow_mut();
            let fingerprint = session.generate_fingerprint(&options);
            serde_json::to_string(fingerprint)
                .map(|json| JsValue::from_str(&json))
                .map_err(to_js)
        })
    }

    /// Encode a JSON payload into a session envelope blob.
    pub fn encrypt_data(&self, payload_json: &str) -> Result<String, JsValue> {
        let value: Value = serde_json::from_str(payload_json).map_err(to_js)?;
        self.inner.borrow().encrypt_data(&value).map_err(to_js)
    }

    /// Decode an envelope blob back to its JSON payload.
    pub fn decrypt_data(&self, blob: &str) -> Result<String, JsValue> {
        let value = self.inner.borrow().decrypt_data(blob).map_err(to_js)?;
        serde_json::to_string(&value).map_err(to_js)
    }

    /// Create a session from a JSON payload.
    ///
    /// The identifier returns immediately; the storage write lands on the
    /// next idle period and is skipped if the handle is disposed first.
    pub fn create_session(&self, user_data_json: &str) -> Result<String, JsValue> {
        let value: Value = serde_json::from_str(user_data_json).map_err(to_js)?;
        let prepared = self.inner.borrow().prepare_session(value).map_err(to_js)?;
        let session_id = prepared.session_id.clone();

        let inner = Rc::clone(&self.inner);
        let signal = self.pending.borrow().signal();
        schedule::defer(IDLE_TIMEOUT_MS, Some(signal), move || {
            inner.borrow().commit_session(&prepared);
        });

        Ok(session_id)
    }

    /// Validate the stored session, as JSON `{valid, reason?, session?}`.
    pub fn validate_session(&self) -> Result<String, JsValue> {
        let check = match self.inner.borrow().validate_session() {
            SessionStatus::Valid(record) => SessionCheck {
                valid: true,
                reason: None,
                session: Some(record),
            },
            SessionStatus::Invalid(reason) => SessionCheck {
                valid: false,
                reason: Some(reason.to_string()),
                session: None,
            },
        };
        serde_json::to_string(&check).map_err(to_js)
    }

    /// Remove every session-scoped key, cancelling any still-pending
    /// session commit first. The persisted developer flag survives.
    pub fn clear_session(&self) {
        self.abort_pending();
        self.inner.borrow().clear_session();
    }

    /// Cancel deferred work queued by this handle.
    pub fn dispose(&self) {
        self.pending.borrow().abort();
    }
}

impl Security {
    fn build(config_json: Option<&str>, webauthn_probe: Option<bool>) -> Result<Self, JsValue> {
        let host: HostConfig = match config_json {
            Some(raw) => serde_json::from_str(raw).map_err(to_js)?,
            None => HostConfig::default(),
        };

        let store = TabStorage::from_window();
        let persisted_dev = store.get(DEV_MODE_KEY).as_deref() == Some("true");
        let env = signals::collect_environment(persisted_dev);

        let defaults = SecurityConfig::default();
        let config = SecurityConfig {
            production: host
                .production
                .unwrap_or_else(|| !is_dev_hostname(&env.hostname)),
            force_bypass: host.force_bypass,
            trusted_origins: host.trusted_origins.unwrap_or(defaults.trusted_origins),
        };

        let mut device_signals = signals::collect_signals();
        if let Some(available) = webauthn_probe {
            device_signals.webauthn_available = available;
        }
        if config.production {
            // The probe feeds the device identifier, so it cannot be
            // deferred past construction
            device_signals.canvas_data_url = signals::canvas_probe();
        }

        let session =
            SecuritySession::new(config, store, device_signals, env).map_err(to_js)?;
        let pending = AbortController::new()
            .map_err(|_| JsValue::from_str("AbortController unavailable"))?;

        Ok(Self {
            inner: Rc::new(RefCell::new(session)),
            pending: RefCell::new(pending),
            lite_fingerprint: signals::lite_fingerprint_requested(),
        })
    }

    fn abort_pending(&self) {
        self.pending.borrow().abort();
        if let Ok(fresh) = AbortController::new() {
            *self.pending.borrow_mut() = fresh;
        }
    }
}

/// Build a [`Security`] handle after probing the platform authenticator,
/// so biometric hints reflect an actual capability check rather than the
/// presence heuristic.
#[wasm_bindgen]
pub async fn init_security(config_json: Option<String>) -> Result<Security, JsValue> {
    let available = platform_authenticator_available().await;
    Security::build(config_json.as_deref(), Some(available))
}

/// Whether a user-verifying platform authenticator (Touch ID, Face ID,
/// Windows Hello) is available. Resolves to `false` where the WebAuthn API
/// is missing or the query fails.
#[wasm_bindgen]
pub async fn platform_authenticator_available() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let has_api =
        js_sys::Reflect::has(window.as_ref(), &JsValue::from_str("PublicKeyCredential"))
            .unwrap_or(false);
    if !has_api {
        return false;
    }

    let promise =
        web_sys::PublicKeyCredential::is_user_verifying_platform_authenticator_available();
    match JsFuture::from(promise).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(_) => false,
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_defaults() {
        let host: HostConfig = serde_json::from_str("{}").unwrap();
        assert!(host.production.is_none());
        assert!(!host.force_bypass);
        assert!(host.trusted_origins.is_none());
    }

    #[test]
    fn test_host_config_overrides() {
        let host: HostConfig = serde_json::from_str(
            r#"{"production": false, "force_bypass": true, "trusted_origins": ["vote.example"]}"#,
        )
        .unwrap();
        assert_eq!(host.production, Some(false));
        assert!(host.force_bypass);
        assert_eq!(host.trusted_origins.as_deref(), Some(&["vote.example".to_string()][..]));
    }

    #[test]
    fn test_session_check_serialization_omits_empty_fields() {
        let check = SessionCheck {
            valid: false,
            reason: Some("No session found".to_string()),
            session: None,
        };
        let json = serde_json::to_string(&check).unwrap();
        assert_eq!(json, r#"{"valid":false,"reason":"No session found"}"#);
    }
}
