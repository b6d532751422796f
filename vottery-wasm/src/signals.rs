//! Ambient browser signal collection.
//!
//! Every read is best-effort: a missing or throwing API yields the unknown
//! sentinel (strings) or `None` (numerics), so collection itself never
//! fails. `navigator.deviceMemory` and `navigator.connection` are read
//! through `Reflect` since not every engine exposes them.

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use vottery_core::{ConnectionInfo, DeviceSignals, ReferrerEnvironment, UNKNOWN_SIGNAL};

/// Query-parameter developer opt-in (`?devMode=true`).
const DEV_QUERY_FLAG: &str = "devMode=true";

/// Query-parameter opt-out of hardware fingerprint details
/// (`?liteFingerprint=true`).
const LITE_FINGERPRINT_FLAG: &str = "liteFingerprint=true";

/// Read the device signal record from `navigator`, `screen`, `Intl` and
/// `Date`. The canvas snapshot is collected separately by [`canvas_probe`].
pub fn collect_signals() -> DeviceSignals {
    let Some(window) = web_sys::window() else {
        return DeviceSignals::default();
    };
    let navigator = window.navigator();

    let concurrency = navigator.hardware_concurrency();
    let screen = window.screen().ok();

    DeviceSignals {
        user_agent: navigator
            .user_agent()
            .unwrap_or_else(|_| UNKNOWN_SIGNAL.to_string()),
        platform: navigator
            .platform()
            .unwrap_or_else(|_| UNKNOWN_SIGNAL.to_string()),
        language: navigator
            .language()
            .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string()),
        screen_width: screen
            .as_ref()
            .and_then(|s| s.width().ok())
            .map(|w| w.max(0) as u32)
            .unwrap_or(0),
        screen_height: screen
            .as_ref()
            .and_then(|s| s.height().ok())
            .map(|h| h.max(0) as u32)
            .unwrap_or(0),
        timezone: resolved_timezone().unwrap_or_else(|| UNKNOWN_SIGNAL.to_string()),
        timezone_offset_minutes: js_sys::Date::new_0().get_timezone_offset() as i32,
        hardware_concurrency: (concurrency >= 1.0).then_some(concurrency as u32),
        device_memory_gb: reflect_f64(navigator.as_ref(), "deviceMemory"),
        canvas_data_url: None,
        connection: connection_info(navigator.as_ref()),
        webauthn_available: Reflect::has(window.as_ref(), &JsValue::from_str("PublicKeyCredential"))
            .unwrap_or(false),
    }
}

/// Read the referrer-check inputs from `document` and `location`.
pub fn collect_environment(persisted_dev_flag: bool) -> ReferrerEnvironment {
    let Some(window) = web_sys::window() else {
        return ReferrerEnvironment {
            persisted_dev_flag,
            ..Default::default()
        };
    };
    let location = window.location();

    ReferrerEnvironment {
        referrer: window.document().map(|d| d.referrer()).unwrap_or_default(),
        hostname: location.hostname().unwrap_or_default(),
        query_bypass: query_contains(&window, DEV_QUERY_FLAG),
        persisted_dev_flag,
    }
}

/// Whether the page URL requested the reduced fingerprint.
pub fn lite_fingerprint_requested() -> bool {
    web_sys::window()
        .map(|window| query_contains(&window, LITE_FINGERPRINT_FLAG))
        .unwrap_or(false)
}

/// Render a short text probe on an off-document canvas and snapshot it as a
/// data URL. Font rasterization differences make this a useful device
/// discriminator.
pub fn canvas_probe() -> Option<String> {
    let document = web_sys::window()?.document()?;
    let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
    canvas.set_width(240);
    canvas.set_height(60);

    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into()
        .ok()?;
    context.set_text_baseline("top");
    context.set_font("14px 'Arial'");
    context.fill_text("Vottery device probe 🗳", 2.0, 8.0).ok()?;

    canvas.to_data_url().ok()
}

fn query_contains(window: &Window, flag: &str) -> bool {
    window
        .location()
        .search()
        .map(|search| search.contains(flag))
        .unwrap_or(false)
}

fn resolved_timezone() -> Option<String> {
    let options = js_sys::Intl::DateTimeFormat::new(&js_sys::Array::new(), &js_sys::Object::new())
        .resolved_options();
    Reflect::get(&options, &JsValue::from_str("timeZone"))
        .ok()?
        .as_string()
}

fn reflect_f64(target: &JsValue, property: &str) -> Option<f64> {
    Reflect::get(target, &JsValue::from_str(property))
        .ok()?
        .as_f64()
}

fn reflect_string(target: &JsValue, property: &str) -> Option<String> {
    Reflect::get(target, &JsValue::from_str(property))
        .ok()?
        .as_string()
}

fn connection_info(navigator: &JsValue) -> Option<ConnectionInfo> {
    let connection = Reflect::get(navigator, &JsValue::from_str("connection")).ok()?;
    if connection.is_undefined() || connection.is_null() {
        return None;
    }
    Some(ConnectionInfo {
        effective_type: reflect_string(&connection, "effectiveType")
            .unwrap_or_else(|| UNKNOWN_SIGNAL.to_string()),
        downlink_mbps: reflect_f64(&connection, "downlink").unwrap_or(0.0),
        rtt_ms: reflect_f64(&connection, "rtt").unwrap_or(0.0),
    })
}
