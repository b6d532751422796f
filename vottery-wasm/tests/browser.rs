//! Browser-hosted tests. Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn version_is_exposed() {
    assert!(!vottery_wasm::get_version().is_empty());
}

#[wasm_bindgen_test]
fn security_constructs_from_ambient_state() {
    let security = vottery_wasm::Security::new(None).expect("construction");
    let info = security.device_info().expect("device info");
    assert!(info.contains("device_id"));
    assert!(info.contains("biometric_capabilities"));
}

#[wasm_bindgen_test]
fn session_round_trip_in_dev_config() {
    let security =
        vottery_wasm::Security::new(Some(r#"{"production": false}"#.to_string())).unwrap();
    security.clear_session();

    let id = security.create_session(r#"{"role": "voter"}"#).unwrap();
    assert_eq!(id.len(), 64);

    security.clear_session();
    let check = security.validate_session().unwrap();
    assert!(check.contains("No session found"));
}

#[wasm_bindgen_test]
async fn fingerprint_resolves_after_idle() {
    let security =
        vottery_wasm::Security::new(Some(r#"{"production": false}"#.to_string())).unwrap();
    let value = wasm_bindgen_futures::JsFuture::from(security.generate_fingerprint(None))
        .await
        .expect("fingerprint promise");
    let json = value.as_string().expect("json string");
    assert!(json.contains("device_id"));
}
