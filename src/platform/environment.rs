//! Runtime environment detection and build-time configuration lookup.
//!
//! Settings and the precache manifest can be injected three ways: a JSON value placed on
//! the worker's global object by the build (`__NEXCARD_SW_SETTINGS__`, `__WB_MANIFEST`),
//! an environment variable holding inline JSON, or an environment variable pointing at a
//! JSON file.

use std::env;
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use serde_json::Value;

pub const SETTINGS_GLOBAL: &str = "__NEXCARD_SW_SETTINGS__";
pub const SETTINGS_ENV: &str = "NEXCARD_SW_SETTINGS";
pub const MANIFEST_GLOBAL: &str = "__WB_MANIFEST";
pub const MANIFEST_ENV: &str = "NEXCARD_SW_PRECACHE_MANIFEST";

/// Returns the injected worker settings object, if any.
pub fn injected_settings() -> Option<Value> {
    value_from_global(SETTINGS_GLOBAL)
        .filter(Value::is_object)
        .or_else(|| value_from_env(SETTINGS_ENV).filter(Value::is_object))
}

/// Returns the injected precache manifest array, if any.
pub fn injected_manifest() -> Option<Value> {
    value_from_global(MANIFEST_GLOBAL)
        .filter(Value::is_array)
        .or_else(|| value_from_env(MANIFEST_ENV).filter(Value::is_array))
}

fn value_from_env(name: &str) -> Option<Value> {
    let raw = env::var(name).ok()?;
    parse_config_source(&raw)
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn value_from_global(name: &str) -> Option<Value> {
    use wasm_bindgen::JsValue;

    let global = js_sys::global();
    let value = js_sys::Reflect::get(&global, &JsValue::from_str(name)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let serialized = js_sys::JSON::stringify(&value).ok()?.as_string()?;
    serde_json::from_str(&serialized).ok()
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
fn value_from_global(_name: &str) -> Option<Value> {
    None
}

fn parse_config_source(raw: &str) -> Option<Value> {
    if let Ok(json) = serde_json::from_str::<Value>(raw) {
        return Some(json);
    }

    let path = treat_as_path(raw)?;
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str::<Value>(&contents).ok()
}

#[cfg(not(target_arch = "wasm32"))]
fn treat_as_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if Path::new(trimmed).exists() {
        Some(trimmed.to_string())
    } else {
        None
    }
}

#[cfg(target_arch = "wasm32")]
fn treat_as_path(_raw: &str) -> Option<String> {
    None
}

/// Returns `true` when running inside a `ServiceWorkerGlobalScope`.
pub fn is_service_worker_scope() -> bool {
    #[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
    {
        use wasm_bindgen::JsCast;
        js_sys::global()
            .dyn_into::<web_sys::ServiceWorkerGlobalScope>()
            .is_ok()
    }

    #[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_source_accepts_files_and_json() {
        let json = parse_config_source("{\"scope\":\"/app/\"}").unwrap();
        assert_eq!(json["scope"], "/app/");

        let mut path = std::env::temp_dir();
        path.push(format!(
            "nexcard_sw_manifest_{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::write(&path, "[{\"url\":\"/index.html\",\"revision\":\"1\"}]").unwrap();
        let path_str = path.to_string_lossy().to_string();
        let file_json = parse_config_source(&path_str).unwrap();
        assert_eq!(file_json[0]["url"], "/index.html");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_sources_are_ignored() {
        assert!(parse_config_source("definitely-not-a-file.json").is_none());
        assert!(!is_service_worker_scope());
    }
}
