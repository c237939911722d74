//! Environment capability checks.
//!
//! The browser bindings need a service worker global scope exposing the Push,
//! Notifications, Clients and Cache Storage APIs. Everything else reports `false`.

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
use js_sys::Reflect;
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
use wasm_bindgen::{JsCast, JsValue};

/// Returns `true` when running inside a service worker that exposes every API the
/// worker core is wired to.
///
/// # Examples
///
/// ```
/// if nexcard_sw::worker::is_supported() {
///     // Safe to install the browser event listeners.
/// }
/// ```
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub fn is_supported() -> bool {
    let global = js_sys::global();
    if global
        .dyn_ref::<web_sys::ServiceWorkerGlobalScope>()
        .is_none()
    {
        return false;
    }

    ["clients", "registration", "caches", "fetch"]
        .iter()
        .all(|property| property_in(&global, property))
        && property_in(&global, "Notification")
        && prototype_has_property(&global, "ServiceWorkerRegistration", "showNotification")
        && prototype_has_property(&global, "PushEvent", "data")
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
fn property_in(target: &JsValue, property: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(property)).unwrap_or(false)
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
fn prototype_has_property(target: &JsValue, constructor: &str, property: &str) -> bool {
    let Ok(ctor) = Reflect::get(target, &JsValue::from_str(constructor)) else {
        return false;
    };
    let Ok(prototype) = Reflect::get(&ctor, &JsValue::from_str("prototype")) else {
        return false;
    };
    prototype
        .dyn_ref::<js_sys::Object>()
        .map(|obj| obj.has_own_property(&JsValue::from_str(property)))
        .unwrap_or(false)
}

/// Returns `false` outside a browser service worker.
#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
pub fn is_supported() -> bool {
    false
}
