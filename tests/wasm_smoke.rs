#![cfg(all(target_arch = "wasm32", feature = "wasm-web"))]

use nexcard_sw::worker::memory::{MemoryClients, MemoryNotificationCenter};
use nexcard_sw::worker::{
    build_notification, is_supported, parse_push_payload, route_click, ClickOutcome,
    NotificationCenter, NotificationClick, NotificationDefaults, WorkerSettings,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn window_context_is_not_a_service_worker() {
    assert!(!is_supported());
}

#[wasm_bindgen_test]
fn malformed_push_uses_default_text() {
    let payload = parse_push_payload(Some(b"{oops".as_slice()));
    let record = build_notification(&payload, &NotificationDefaults::default());
    assert_eq!(record.title, "New Notification");
    assert_eq!(record.body, "You have a new message!");
    assert_eq!(record.target_url(), "/");
}

#[wasm_bindgen_test]
fn injected_settings_default_when_absent() {
    let settings = WorkerSettings::from_environment().expect("settings");
    assert_eq!(settings, WorkerSettings::default());
}

#[wasm_bindgen_test(async)]
async fn click_router_runs_on_wasm_executor() {
    let center = MemoryNotificationCenter::new();
    let clients = MemoryClients::with_windows(["https://app.example/cards/42"]);
    let payload = parse_push_payload(Some(br#"{"url":"/cards/42"}"#.as_slice()));
    let record = build_notification(&payload, &NotificationDefaults::default());
    center.show_notification(&record).await.expect("show");

    let outcome = route_click(&center, &clients, &NotificationClick::new(record))
        .await
        .expect("route");
    assert!(matches!(outcome, ClickOutcome::Focused(_)));
    assert!(clients.opened_urls().is_empty());
}
