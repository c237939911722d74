//! Browser bindings: platform traits over the service worker global scope and the event
//! listeners that feed a [`WorkerHandle`].

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use bytes::Bytes;
use js_sys::{Array, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    Cache, CacheStorage, Client, ClientQueryOptions, Clients, Event, ExtendableEvent, FetchEvent,
    GetNotificationOptions, Headers, Notification, NotificationEvent, NotificationOptions,
    PushEvent, Request, RequestInit, Response, ResponseInit, ServiceWorkerGlobalScope,
    ServiceWorkerRegistration, WindowClient,
};

use crate::logger::Logger;
use crate::worker::api::{EventOutcome, ServiceWorker, ServiceWorkerBuilder, WorkerEvent};
use crate::worker::click::NotificationClick;
use crate::worker::constants::WORKER_COMPONENT_NAME;
use crate::worker::dispatcher::WorkerHandle;
use crate::worker::error::{
    cache_storage_failed, client_lookup_failed, internal_error, invalid_argument,
    network_failed, notification_display_failed, permission_blocked, unsupported_environment,
    window_focus_failed, window_open_failed, WorkerError, WorkerResult,
};
use crate::worker::lifecycle::CloseReason;
use crate::worker::platform::{CacheStore, ClientRegistry, NetworkFetcher, NotificationCenter};
use crate::worker::settings::NotificationDefaults;
use crate::worker::types::{
    ClientWindow, FetchRequest, FetchResponse, NotificationData, NotificationRecord, RequestMode,
    SyncEvent,
};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(WORKER_COMPONENT_NAME));

fn global_scope() -> WorkerResult<ServiceWorkerGlobalScope> {
    js_sys::global()
        .dyn_into::<ServiceWorkerGlobalScope>()
        .map_err(|_| unsupported_environment("Not running inside a service worker"))
}

fn stringify_js_error(err: &JsValue) -> String {
    if let Some(string) = err.as_string() {
        return string;
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    if let Ok(stringified) = js_sys::JSON::stringify(err) {
        if let Some(text) = stringified.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

fn to_js_error(err: &WorkerError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

async fn await_promise(promise: Promise) -> Result<JsValue, JsValue> {
    JsFuture::from(promise).await
}

fn set_property(target: &Object, key: &str, value: &JsValue) -> WorkerResult<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|err| internal_error(format!("Failed to set '{key}': {}", stringify_js_error(&err))))
}

fn json_to_js<T: serde::Serialize>(value: &T) -> WorkerResult<JsValue> {
    let raw = serde_json::to_string(value)
        .map_err(|err| internal_error(format!("Failed to encode value: {err}")))?;
    js_sys::JSON::parse(&raw)
        .map_err(|err| internal_error(format!("Failed to build JS value: {}", stringify_js_error(&err))))
}

fn js_to_json<T: serde::de::DeserializeOwned>(value: &JsValue) -> Option<T> {
    let raw = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&raw).ok()
}

/// Notifications shown through `registration.showNotification`.
pub struct BrowserNotificationCenter {
    registration: ServiceWorkerRegistration,
}

// Service workers are single threaded; the handles never leave the worker's thread.
unsafe impl Send for BrowserNotificationCenter {}
unsafe impl Sync for BrowserNotificationCenter {}

impl BrowserNotificationCenter {
    pub fn new(registration: ServiceWorkerRegistration) -> Self {
        Self { registration }
    }

    fn options(record: &NotificationRecord) -> WorkerResult<NotificationOptions> {
        let options = Object::new();
        set_property(&options, "body", &JsValue::from_str(&record.body))?;
        set_property(&options, "icon", &JsValue::from_str(&record.icon))?;
        set_property(&options, "badge", &JsValue::from_str(&record.badge))?;
        let vibrate: Array = record
            .vibrate
            .iter()
            .map(|step| JsValue::from_f64(f64::from(*step)))
            .collect();
        set_property(&options, "vibrate", &vibrate)?;
        set_property(&options, "data", &json_to_js(&record.data)?)?;
        if let Some(tag) = &record.tag {
            set_property(&options, "tag", &JsValue::from_str(tag))?;
        }
        Ok(options.unchecked_into())
    }
}

#[async_trait(?Send)]
impl NotificationCenter for BrowserNotificationCenter {
    async fn show_notification(&self, record: &NotificationRecord) -> WorkerResult<()> {
        let options = Self::options(record)?;
        let promise = self
            .registration
            .show_notification_with_options(&record.title, &options)
            .map_err(|err| notification_display_failed(stringify_js_error(&err)))?;
        await_promise(promise).await.map_err(|err| {
            let message = stringify_js_error(&err);
            if message.to_ascii_lowercase().contains("permission") {
                permission_blocked(message)
            } else {
                notification_display_failed(message)
            }
        })?;
        Ok(())
    }

    async fn close_notification(
        &self,
        record: &NotificationRecord,
        _reason: CloseReason,
    ) -> WorkerResult<()> {
        // Untagged notifications are closed by the event listener that received them.
        let Some(tag) = &record.tag else {
            return Ok(());
        };
        let filter = Object::new();
        set_property(&filter, "tag", &JsValue::from_str(tag))?;
        let filter: GetNotificationOptions = filter.unchecked_into();
        let promise = self
            .registration
            .get_notifications_with_filter(&filter)
            .map_err(|err| internal_error(stringify_js_error(&err)))?;
        let shown = await_promise(promise)
            .await
            .map_err(|err| internal_error(stringify_js_error(&err)))?;
        for value in Array::from(&shown).iter() {
            if let Ok(notification) = value.dyn_into::<Notification>() {
                notification.close();
            }
        }
        Ok(())
    }
}

/// Window clients reached through `self.clients`.
pub struct BrowserClients {
    clients: Clients,
}

unsafe impl Send for BrowserClients {}
unsafe impl Sync for BrowserClients {}

impl BrowserClients {
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }

    fn snapshot(client: &Client) -> ClientWindow {
        let mut window = ClientWindow::new(client.id(), client.url());
        window.focused = client
            .dyn_ref::<WindowClient>()
            .map(WindowClient::focused)
            .unwrap_or(false);
        window
    }
}

#[async_trait(?Send)]
impl ClientRegistry for BrowserClients {
    async fn window_clients(&self) -> WorkerResult<Vec<ClientWindow>> {
        let options = Object::new();
        set_property(&options, "type", &JsValue::from_str("window"))?;
        set_property(&options, "includeUncontrolled", &JsValue::TRUE)?;
        let options: ClientQueryOptions = options.unchecked_into();
        let matched = await_promise(self.clients.match_all_with_options(&options))
            .await
            .map_err(|err| client_lookup_failed(stringify_js_error(&err)))?;
        Ok(Array::from(&matched)
            .iter()
            .filter_map(|value| value.dyn_into::<Client>().ok())
            .map(|client| Self::snapshot(&client))
            .collect())
    }

    async fn focus(&self, client: &ClientWindow) -> WorkerResult<ClientWindow> {
        let found = await_promise(self.clients.get(&client.id))
            .await
            .map_err(|err| client_lookup_failed(stringify_js_error(&err)))?;
        let window = found.dyn_into::<WindowClient>().map_err(|_| {
            window_focus_failed(format!("Window '{}' is no longer open", client.id))
        })?;
        let promise = window
            .focus()
            .map_err(|err| window_focus_failed(stringify_js_error(&err)))?;
        let focused = await_promise(promise)
            .await
            .map_err(|err| window_focus_failed(stringify_js_error(&err)))?;
        let focused = focused
            .dyn_into::<Client>()
            .map(|client| Self::snapshot(&client))
            .unwrap_or_else(|_| client.clone());
        Ok(focused)
    }

    fn can_open_window(&self) -> bool {
        Reflect::has(&self.clients, &JsValue::from_str("openWindow")).unwrap_or(false)
    }

    async fn open_window(&self, url: &str) -> WorkerResult<Option<ClientWindow>> {
        let opened = await_promise(self.clients.open_window(url))
            .await
            .map_err(|err| window_open_failed(stringify_js_error(&err)))?;
        // Cross-origin targets resolve to null.
        Ok(opened
            .dyn_into::<Client>()
            .ok()
            .map(|client| Self::snapshot(&client)))
    }

    async fn claim(&self) -> WorkerResult<()> {
        await_promise(self.clients.claim())
            .await
            .map_err(|err| client_lookup_failed(stringify_js_error(&err)))?;
        Ok(())
    }
}

/// Cache Storage (`self.caches`).
pub struct BrowserCacheStore {
    storage: CacheStorage,
}

unsafe impl Send for BrowserCacheStore {}
unsafe impl Sync for BrowserCacheStore {}

impl BrowserCacheStore {
    pub fn new(storage: CacheStorage) -> Self {
        Self { storage }
    }

    async fn open(&self, cache_name: &str) -> WorkerResult<Cache> {
        await_promise(self.storage.open(cache_name))
            .await
            .map_err(|err| cache_storage_failed(stringify_js_error(&err)))?
            .dyn_into::<Cache>()
            .map_err(|_| cache_storage_failed(format!("caches.open('{cache_name}') did not return a cache")))
    }
}

#[async_trait(?Send)]
impl CacheStore for BrowserCacheStore {
    async fn get(&self, cache_name: &str, key: &str) -> WorkerResult<Option<FetchResponse>> {
        let cache = self.open(cache_name).await?;
        let matched = await_promise(cache.match_with_str(key))
            .await
            .map_err(|err| cache_storage_failed(stringify_js_error(&err)))?;
        match matched.dyn_into::<Response>() {
            Ok(response) => read_response(&response).await.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn put(&self, cache_name: &str, key: &str, response: FetchResponse) -> WorkerResult<()> {
        let cache = self.open(cache_name).await?;
        let response = to_response(&response)?;
        await_promise(cache.put_with_str(key, &response))
            .await
            .map_err(|err| cache_storage_failed(stringify_js_error(&err)))?;
        Ok(())
    }

    async fn delete(&self, cache_name: &str, key: &str) -> WorkerResult<bool> {
        let cache = self.open(cache_name).await?;
        let deleted = await_promise(cache.delete_with_str(key))
            .await
            .map_err(|err| cache_storage_failed(stringify_js_error(&err)))?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn keys(&self, cache_name: &str) -> WorkerResult<Vec<String>> {
        let cache = self.open(cache_name).await?;
        let requests = await_promise(cache.keys())
            .await
            .map_err(|err| cache_storage_failed(stringify_js_error(&err)))?;
        Ok(Array::from(&requests)
            .iter()
            .filter_map(|value| value.dyn_into::<Request>().ok())
            .map(|request| request.url())
            .collect())
    }

    async fn cache_names(&self) -> WorkerResult<Vec<String>> {
        let names = await_promise(self.storage.keys())
            .await
            .map_err(|err| cache_storage_failed(stringify_js_error(&err)))?;
        Ok(Array::from(&names)
            .iter()
            .filter_map(|value| value.as_string())
            .collect())
    }

    async fn delete_cache(&self, cache_name: &str) -> WorkerResult<bool> {
        let deleted = await_promise(self.storage.delete(cache_name))
            .await
            .map_err(|err| cache_storage_failed(stringify_js_error(&err)))?;
        Ok(deleted.as_bool().unwrap_or(false))
    }
}

/// Network access through the worker's own `fetch`. Only GET requests are supported;
/// the fetch listener never routes anything else here. Headers and mode of the
/// intercepted request are forwarded.
pub struct BrowserNetwork {
    scope: ServiceWorkerGlobalScope,
}

unsafe impl Send for BrowserNetwork {}
unsafe impl Sync for BrowserNetwork {}

impl BrowserNetwork {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Self {
        Self { scope }
    }
}

#[async_trait(?Send)]
impl NetworkFetcher for BrowserNetwork {
    async fn fetch(&self, request: &FetchRequest) -> WorkerResult<FetchResponse> {
        if !request.is_get() {
            return Err(invalid_argument(format!(
                "Only GET requests can be forwarded, got {}",
                request.method
            )));
        }
        let init = request_init(request)?;
        let response = await_promise(self.scope.fetch_with_str_and_init(&request.url, &init))
            .await
            .map_err(|err| network_failed(stringify_js_error(&err)))?
            .dyn_into::<Response>()
            .map_err(|_| network_failed(format!("fetch({}) did not return a Response", request.url)))?;
        read_response(&response).await
    }
}

/// Carries the intercepted request's method, headers and mode onto the re-issued fetch.
fn request_init(request: &FetchRequest) -> WorkerResult<RequestInit> {
    let headers = Object::new();
    for (name, value) in &request.headers {
        set_property(&headers, name, &JsValue::from_str(value))?;
    }
    let init = Object::new();
    set_property(&init, "method", &JsValue::from_str(&request.method))?;
    set_property(&init, "headers", &headers)?;
    set_property(&init, "mode", &JsValue::from_str(request.mode.forwarded_as()))?;
    Ok(init.unchecked_into())
}

fn header_pairs(headers: &Headers) -> Vec<(String, String)> {
    let Ok(Some(entries)) = js_sys::try_iter(headers) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pair = entry.dyn_into::<Array>().ok()?;
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}

async fn read_response(response: &Response) -> WorkerResult<FetchResponse> {
    let buffer = response
        .array_buffer()
        .map_err(|err| network_failed(stringify_js_error(&err)))?;
    let buffer = await_promise(buffer)
        .await
        .map_err(|err| network_failed(stringify_js_error(&err)))?;
    Ok(FetchResponse {
        status: response.status(),
        headers: header_pairs(&response.headers()),
        body: Bytes::from(Uint8Array::new(&buffer).to_vec()),
    })
}

fn to_response(response: &FetchResponse) -> WorkerResult<Response> {
    let headers = Object::new();
    for (name, value) in &response.headers {
        set_property(&headers, name, &JsValue::from_str(value))?;
    }
    let init = Object::new();
    set_property(&init, "status", &JsValue::from_f64(f64::from(response.status)))?;
    set_property(&init, "headers", &headers)?;
    let init: ResponseInit = init.unchecked_into();

    let body = Uint8Array::from(response.body.as_ref());
    let body: &Object = &body;
    Response::new_with_opt_buffer_source_and_init(Some(body), &init)
        .map_err(|err| internal_error(format!("Failed to build Response: {}", stringify_js_error(&err))))
}

fn fetch_request(request: &Request) -> FetchRequest {
    let mode = match request.mode() {
        web_sys::RequestMode::Navigate => RequestMode::Navigate,
        web_sys::RequestMode::SameOrigin => RequestMode::SameOrigin,
        web_sys::RequestMode::NoCors => RequestMode::NoCors,
        _ => RequestMode::Cors,
    };
    FetchRequest {
        url: request.url(),
        method: request.method(),
        mode,
        headers: header_pairs(&request.headers()),
    }
}

/// Rebuilds the record for a notification the browser hands back on click or close.
fn notification_record(notification: &Notification, defaults: &NotificationDefaults) -> NotificationRecord {
    let data = js_to_json::<NotificationData>(&notification.data()).unwrap_or_else(|| {
        NotificationData {
            url: defaults.url.clone(),
            extra: serde_json::Map::new(),
        }
    });
    let tag = notification.tag();
    NotificationRecord {
        title: notification.title(),
        body: notification.body(),
        icon: notification.icon(),
        badge: notification.badge(),
        vibrate: Vec::new(),
        tag: (!tag.is_empty()).then_some(tag),
        data,
    }
}

fn sync_event(event: &Event) -> SyncEvent {
    let tag = Reflect::get(event, &JsValue::from_str("tag"))
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_default();
    let last_chance = Reflect::get(event, &JsValue::from_str("lastChance"))
        .ok()
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    SyncEvent { tag, last_chance }
}

/// Builds a worker wired to the browser platform of the current service worker.
///
/// The registration scope replaces whatever scope the settings carry.
pub fn browser_worker(builder: ServiceWorkerBuilder) -> WorkerResult<ServiceWorker> {
    let scope = global_scope()?;
    let registration = scope.registration();
    let caches = scope
        .caches()
        .map_err(|err| unsupported_environment(stringify_js_error(&err)))?;
    builder
        .scope(registration.scope())
        .notifications(Arc::new(BrowserNotificationCenter::new(registration)))
        .clients(Arc::new(BrowserClients::new(scope.clients())))
        .cache(Arc::new(BrowserCacheStore::new(caches)))
        .network(Arc::new(BrowserNetwork::new(scope)))
        .build()
}

type Listener = Closure<dyn FnMut(Event)>;

/// Event listeners attached to the global scope. Dropping the set detaches them.
pub struct ListenerSet {
    scope: ServiceWorkerGlobalScope,
    listeners: Vec<(&'static str, Listener)>,
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        for (name, listener) in &self.listeners {
            if let Err(err) = self
                .scope
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
            {
                LOGGER.warn(format!(
                    "removeEventListener('{name}') failed: {}",
                    stringify_js_error(&err)
                ));
            }
        }
    }
}

unsafe impl Send for ListenerSet {}
unsafe impl Sync for ListenerSet {}

impl ListenerSet {
    /// Keeps the listeners attached for the lifetime of the worker.
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

/// Extends the event's lifetime until the dispatched handler settles.
fn wait_until(event: &ExtendableEvent, handle: &WorkerHandle, worker_event: WorkerEvent) {
    let handle = handle.clone();
    let kind = worker_event.kind();
    let promise = future_to_promise(async move {
        handle
            .dispatch(worker_event)
            .await
            .map(|_| JsValue::UNDEFINED)
            .map_err(|err| to_js_error(&err))
    });
    if let Err(err) = event.wait_until(&promise) {
        LOGGER.warn(format!("waitUntil for {kind} failed: {}", stringify_js_error(&err)));
    }
}

/// Attaches `install`, `activate`, `fetch`, `push`, `notificationclick`,
/// `notificationclose` and `sync` listeners feeding a freshly started event loop.
pub fn attach(worker: &ServiceWorker) -> WorkerResult<ListenerSet> {
    let scope = global_scope()?;
    let handle = worker.start();
    let mut listeners: Vec<(&'static str, Listener)> = Vec::new();

    {
        let handle = handle.clone();
        let scope = scope.clone();
        listeners.push((
            "install",
            Closure::wrap(Box::new(move |event: Event| {
                let Ok(event) = event.dyn_into::<ExtendableEvent>() else {
                    return;
                };
                let handle = handle.clone();
                let scope = scope.clone();
                let promise = future_to_promise(async move {
                    let outcome = handle
                        .dispatch(WorkerEvent::Install)
                        .await
                        .map_err(|err| to_js_error(&err))?;
                    if let EventOutcome::Installed {
                        skip_waiting: true, ..
                    } = outcome
                    {
                        await_promise(scope.skip_waiting()?).await?;
                    }
                    Ok(JsValue::UNDEFINED)
                });
                if let Err(err) = event.wait_until(&promise) {
                    LOGGER.warn(format!("waitUntil for install failed: {}", stringify_js_error(&err)));
                }
            }) as Box<dyn FnMut(Event)>),
        ));
    }

    {
        let handle = handle.clone();
        listeners.push((
            "activate",
            Closure::wrap(Box::new(move |event: Event| {
                if let Ok(event) = event.dyn_into::<ExtendableEvent>() {
                    wait_until(&event, &handle, WorkerEvent::Activate);
                }
            }) as Box<dyn FnMut(Event)>),
        ));
    }

    {
        let handle = handle.clone();
        let worker = worker.clone();
        listeners.push((
            "fetch",
            Closure::wrap(Box::new(move |event: Event| {
                let Ok(event) = event.dyn_into::<FetchEvent>() else {
                    return;
                };
                let request = event.request();
                // Unrouted requests are left to the browser.
                if !request.method().eq_ignore_ascii_case("GET")
                    || worker.precache().cache_key_for(&request.url()).is_none()
                {
                    return;
                }
                let handle = handle.clone();
                let request = fetch_request(&request);
                let promise = future_to_promise(async move {
                    match handle.dispatch(WorkerEvent::Fetch(request)).await {
                        Ok(EventOutcome::Fetched(outcome)) => to_response(&outcome.response)
                            .map(JsValue::from)
                            .map_err(|err| to_js_error(&err)),
                        Ok(other) => Err(to_js_error(&internal_error(format!(
                            "fetch produced {other:?}"
                        )))),
                        Err(err) => Err(to_js_error(&err)),
                    }
                });
                if let Err(err) = event.respond_with(&promise) {
                    LOGGER.warn(format!("respondWith failed: {}", stringify_js_error(&err)));
                }
            }) as Box<dyn FnMut(Event)>),
        ));
    }

    {
        let handle = handle.clone();
        listeners.push((
            "push",
            Closure::wrap(Box::new(move |event: Event| {
                let Ok(event) = event.dyn_into::<PushEvent>() else {
                    return;
                };
                let body = event
                    .data()
                    .and_then(|data| data.array_buffer().ok())
                    .map(|buffer| Uint8Array::new(&buffer).to_vec());
                wait_until(&event, &handle, WorkerEvent::Push(body));
            }) as Box<dyn FnMut(Event)>),
        ));
    }

    {
        let handle = handle.clone();
        let defaults = worker.settings().notification.clone();
        listeners.push((
            "notificationclick",
            Closure::wrap(Box::new(move |event: Event| {
                let Ok(event) = event.dyn_into::<NotificationEvent>() else {
                    return;
                };
                let notification = event.notification();
                notification.close();
                let action = Reflect::get(&event, &JsValue::from_str("action"))
                    .ok()
                    .and_then(|value| value.as_string())
                    .filter(|action| !action.is_empty());
                let click = NotificationClick {
                    notification: notification_record(&notification, &defaults),
                    action,
                };
                wait_until(&event, &handle, WorkerEvent::NotificationClick(click));
            }) as Box<dyn FnMut(Event)>),
        ));
    }

    {
        let handle = handle.clone();
        let defaults = worker.settings().notification.clone();
        listeners.push((
            "notificationclose",
            Closure::wrap(Box::new(move |event: Event| {
                let Ok(event) = event.dyn_into::<NotificationEvent>() else {
                    return;
                };
                let record = notification_record(&event.notification(), &defaults);
                wait_until(&event, &handle, WorkerEvent::NotificationClose(record));
            }) as Box<dyn FnMut(Event)>),
        ));
    }

    {
        let handle = handle.clone();
        listeners.push((
            "sync",
            Closure::wrap(Box::new(move |event: Event| {
                let sync = sync_event(&event);
                if let Ok(event) = event.dyn_into::<ExtendableEvent>() {
                    wait_until(&event, &handle, WorkerEvent::Sync(sync));
                }
            }) as Box<dyn FnMut(Event)>),
        ));
    }

    let set = ListenerSet { scope, listeners };
    for (name, listener) in &set.listeners {
        set.scope
            .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
            .map_err(|err| {
                internal_error(format!(
                    "addEventListener('{name}') failed: {}",
                    stringify_js_error(&err)
                ))
            })?;
    }
    Ok(set)
}

/// Entry point for a service worker script: builds the worker from injected settings and
/// manifest, attaches every listener and keeps them for the worker's lifetime.
pub fn run() -> WorkerResult<ServiceWorker> {
    let worker = browser_worker(ServiceWorkerBuilder::from_environment()?)?;
    attach(&worker)?.forget();
    LOGGER.info(format!(
        "service worker ready with {} precached route(s)",
        worker.precache().len()
    ));
    Ok(worker)
}
