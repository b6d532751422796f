//! Idle-time scheduling with cancellation.
//!
//! Deferred work runs through `requestIdleCallback` with a bounded timeout
//! so it lands even on a busy main thread; engines without the API fall
//! back to a zero-delay `setTimeout`. Cancellation rides on the standard
//! `AbortSignal`: an aborted signal at fire time skips the work.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::AbortSignal;

/// Queue `work` for the next idle period, running it no later than
/// `timeout_ms` from now.
pub fn defer<F>(timeout_ms: u32, signal: Option<AbortSignal>, work: F)
where
    F: FnOnce() + 'static,
{
    let Some(window) = web_sys::window() else {
        // No event loop to defer onto; run inline
        if !signal.as_ref().is_some_and(AbortSignal::aborted) {
            work();
        }
        return;
    };

    let callback = Closure::once_into_js(move |_deadline: JsValue| {
        if signal.as_ref().is_some_and(AbortSignal::aborted) {
            return;
        }
        work();
    });
    let function: &js_sys::Function = callback.unchecked_ref();

    let request_idle =
        js_sys::Reflect::get(window.as_ref(), &JsValue::from_str("requestIdleCallback"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
    if let Some(request_idle) = request_idle {
        let options = js_sys::Object::new();
        let _ = js_sys::Reflect::set(
            &options,
            &JsValue::from_str("timeout"),
            &JsValue::from_f64(f64::from(timeout_ms)),
        );
        if request_idle.call2(window.as_ref(), function, &options).is_ok() {
            return;
        }
    }
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(function, 0);
}

/// Await the next idle period (bounded by `timeout_ms`).
pub async fn idle_tick(timeout_ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        defer(timeout_ms, None, move || {
            let _ = resolve.call0(&JsValue::NULL);
        });
    });
    let _ = JsFuture::from(promise).await;
}
