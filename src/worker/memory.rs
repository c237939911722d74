//! In-process platform implementations.
//!
//! Used by native hosts (and the test-suite) where no browser is available. Each type keeps
//! only the state the real platform would own: displayed notifications, open windows,
//! cache storage and a canned network.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::worker::error::{
    cache_storage_failed, network_failed, permission_blocked, window_focus_failed,
    window_open_failed, WorkerResult,
};
use crate::worker::lifecycle::{CloseReason, NotificationState};
use crate::worker::platform::{CacheStore, ClientRegistry, NetworkFetcher, NotificationCenter};
use crate::worker::types::{ClientWindow, FetchRequest, FetchResponse, NotificationRecord};

/// Notification permission states as exposed by the Web Notifications API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionState {
    /// The user has not decided whether to allow notifications.
    Default,
    /// The user granted notification permissions.
    Granted,
    /// The user denied notification permissions.
    Denied,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayedNotification {
    pub record: NotificationRecord,
    pub state: NotificationState,
}

#[derive(Debug)]
struct NotificationLog {
    permission: PermissionState,
    entries: Vec<DisplayedNotification>,
}

#[derive(Debug)]
pub struct MemoryNotificationCenter {
    inner: Mutex<NotificationLog>,
}

impl Default for MemoryNotificationCenter {
    fn default() -> Self {
        Self::with_permission(PermissionState::Granted)
    }
}

impl MemoryNotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permission(permission: PermissionState) -> Self {
        Self {
            inner: Mutex::new(NotificationLog {
                permission,
                entries: Vec::new(),
            }),
        }
    }

    pub fn set_permission(&self, permission: PermissionState) {
        self.inner.lock().unwrap().permission = permission;
    }

    pub fn notifications(&self) -> Vec<DisplayedNotification> {
        self.inner.lock().unwrap().entries.clone()
    }

    pub fn visible(&self) -> Vec<NotificationRecord> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|entry| entry.state.is_visible())
            .map(|entry| entry.record.clone())
            .collect()
    }

    /// Simulates the platform hiding a notification after its display timeout.
    pub fn expire(&self, record: &NotificationRecord) {
        self.transition(record, CloseReason::TimedOut);
    }

    fn transition(&self, record: &NotificationRecord, reason: CloseReason) {
        let mut log = self.inner.lock().unwrap();
        for entry in log.entries.iter_mut().filter(|entry| &entry.record == record) {
            entry.state = entry.state.close(reason);
        }
    }
}

#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
impl NotificationCenter for MemoryNotificationCenter {
    async fn show_notification(&self, record: &NotificationRecord) -> WorkerResult<()> {
        let mut log = self.inner.lock().unwrap();
        if log.permission != PermissionState::Granted {
            return Err(permission_blocked(
                "Notification permission has not been granted.",
            ));
        }
        let state = NotificationState::Delivered.displayed()?;
        log.entries.push(DisplayedNotification {
            record: record.clone(),
            state,
        });
        Ok(())
    }

    async fn close_notification(
        &self,
        record: &NotificationRecord,
        reason: CloseReason,
    ) -> WorkerResult<()> {
        self.transition(record, reason);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ClientState {
    windows: Vec<ClientWindow>,
    next_id: u64,
    focused: Vec<String>,
    opened: Vec<String>,
    claimed: bool,
}

impl ClientState {
    fn push_window(&mut self, url: &str) -> ClientWindow {
        self.next_id += 1;
        let window = ClientWindow::new(format!("window-{}", self.next_id), url);
        self.windows.push(window.clone());
        window
    }
}

#[derive(Debug)]
pub struct MemoryClients {
    state: Mutex<ClientState>,
    open_window_supported: bool,
}

impl Default for MemoryClients {
    fn default() -> Self {
        Self {
            state: Mutex::new(ClientState::default()),
            open_window_supported: true,
        }
    }
}

impl MemoryClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_windows<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let clients = Self::default();
        for url in urls {
            clients.add_window(url.as_ref());
        }
        clients
    }

    /// Simulates a platform without `clients.openWindow`.
    pub fn without_open_window(mut self) -> Self {
        self.open_window_supported = false;
        self
    }

    pub fn add_window(&self, url: &str) -> ClientWindow {
        self.state.lock().unwrap().push_window(url)
    }

    pub fn windows(&self) -> Vec<ClientWindow> {
        self.state.lock().unwrap().windows.clone()
    }

    /// Ids passed to `focus`, in call order.
    pub fn focus_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().focused.clone()
    }

    /// URLs passed to `open_window`, in call order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn claimed(&self) -> bool {
        self.state.lock().unwrap().claimed
    }
}

#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
impl ClientRegistry for MemoryClients {
    async fn window_clients(&self) -> WorkerResult<Vec<ClientWindow>> {
        Ok(self.windows())
    }

    async fn focus(&self, client: &ClientWindow) -> WorkerResult<ClientWindow> {
        let mut state = self.state.lock().unwrap();
        if !state.windows.iter().any(|window| window.id == client.id) {
            return Err(window_focus_failed(format!(
                "Window '{}' is no longer open",
                client.id
            )));
        }
        for window in state.windows.iter_mut() {
            window.focused = window.id == client.id;
        }
        state.focused.push(client.id.clone());
        let focused = state
            .windows
            .iter()
            .find(|window| window.id == client.id)
            .cloned()
            .unwrap_or_else(|| client.clone());
        Ok(focused)
    }

    fn can_open_window(&self) -> bool {
        self.open_window_supported
    }

    async fn open_window(&self, url: &str) -> WorkerResult<Option<ClientWindow>> {
        if !self.open_window_supported {
            return Err(window_open_failed("clients.openWindow is not available"));
        }
        let mut state = self.state.lock().unwrap();
        state.opened.push(url.to_string());
        let mut window = state.push_window(url);
        window.focused = true;
        for existing in state.windows.iter_mut() {
            existing.focused = existing.id == window.id;
        }
        Ok(Some(window))
    }

    async fn claim(&self) -> WorkerResult<()> {
        self.state.lock().unwrap().claimed = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    caches: Mutex<BTreeMap<String, BTreeMap<String, FetchResponse>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, cache_name: &str, key: &str) -> WorkerResult<Option<FetchResponse>> {
        Ok(self
            .caches
            .lock()
            .unwrap()
            .get(cache_name)
            .and_then(|cache| cache.get(key))
            .cloned())
    }

    async fn put(&self, cache_name: &str, key: &str, response: FetchResponse) -> WorkerResult<()> {
        if response.status == 206 {
            return Err(cache_storage_failed("Partial responses (206) cannot be cached"));
        }
        self.caches
            .lock()
            .unwrap()
            .entry(cache_name.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn delete(&self, cache_name: &str, key: &str) -> WorkerResult<bool> {
        Ok(self
            .caches
            .lock()
            .unwrap()
            .get_mut(cache_name)
            .map(|cache| cache.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn keys(&self, cache_name: &str) -> WorkerResult<Vec<String>> {
        Ok(self
            .caches
            .lock()
            .unwrap()
            .get(cache_name)
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn cache_names(&self) -> WorkerResult<Vec<String>> {
        Ok(self.caches.lock().unwrap().keys().cloned().collect())
    }

    async fn delete_cache(&self, cache_name: &str) -> WorkerResult<bool> {
        Ok(self.caches.lock().unwrap().remove(cache_name).is_some())
    }
}

/// Network stand-in answering from a fixed route table. Unknown URLs get a 404.
#[derive(Debug, Default)]
pub struct StaticNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    requests: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl StaticNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: impl Into<String>, response: FetchResponse) -> Self {
        self.routes.lock().unwrap().insert(url.into(), response);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
impl NetworkFetcher for StaticNetwork {
    async fn fetch(&self, request: &FetchRequest) -> WorkerResult<FetchResponse> {
        self.requests.lock().unwrap().push(request.url.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(network_failed(format!("Offline while fetching {}", request.url)));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(404, "")))
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn cache_store_round_trip_and_cleanup() {
        let store = MemoryCacheStore::new();
        store
            .put("c1", "https://app.example/a", FetchResponse::new(200, "a"))
            .await
            .unwrap();
        assert_eq!(store.keys("c1").await.unwrap(), vec!["https://app.example/a"]);
        assert!(store.delete("c1", "https://app.example/a").await.unwrap());
        assert!(!store.delete("c1", "https://app.example/a").await.unwrap());
        assert!(store.delete_cache("c1").await.unwrap());
        assert!(store.cache_names().await.unwrap().is_empty());

        let err = store
            .put("c1", "partial", FetchResponse::new(206, ""))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/cache-storage-failed");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn focus_moves_focus_and_rejects_closed_windows() {
        let clients = MemoryClients::with_windows(["https://app.example/", "https://app.example/cards"]);
        let windows = clients.windows();
        let focused = clients.focus(&windows[1]).await.unwrap();
        assert!(focused.focused);
        assert!(!clients.windows()[0].focused);

        let ghost = ClientWindow::new("window-99", "https://app.example/");
        let err = clients.focus(&ghost).await.unwrap_err();
        assert_eq!(err.code_str(), "sw/window-focus-failed");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn static_network_records_requests() {
        let network = StaticNetwork::new().route("https://app.example/a", FetchResponse::new(200, "a"));
        let hit = network.fetch(&FetchRequest::get("https://app.example/a")).await.unwrap();
        let miss = network.fetch(&FetchRequest::get("https://app.example/b")).await.unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(miss.status, 404);

        network.set_offline(true);
        let err = network
            .fetch(&FetchRequest::get("https://app.example/a"))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/network-failed");
        assert_eq!(network.requests().len(), 3);
    }
}
