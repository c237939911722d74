#![doc = include_str!("README.md")]
mod api;
mod click;
mod constants;
mod dispatcher;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
mod http;
mod lifecycle;
pub mod memory;
pub mod platform;
pub mod precache;
mod push;
pub mod settings;
mod support;
mod sync;
mod types;
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub mod wasm;

pub use api::{EventOutcome, ServiceWorker, ServiceWorkerBuilder, WorkerEvent};
pub use click::{handle_close, route_click, ClickOutcome, NotificationClick};
pub use constants::{DEFAULT_SYNC_TAG, PRECACHE_COMPONENT_NAME, WORKER_COMPONENT_NAME};
pub use dispatcher::WorkerHandle;
pub use error::{WorkerError, WorkerErrorCode, WorkerResult};
#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpFetcher;
pub use lifecycle::{CloseReason, NotificationState};
pub use platform::{CacheStore, ClientRegistry, NetworkFetcher, NotificationCenter, SyncRoutine};
pub use precache::{
    ActivateReport, FetchOutcome, InstallReport, PrecacheController, PrecacheEntry,
    PrecacheManifest, ResponseSource,
};
pub use push::{build_notification, handle_push, parse_push_payload};
pub use settings::{NotificationDefaults, PrecacheSettings, SyncSettings, WorkerSettings};
pub use support::is_supported;
pub use sync::{handle_sync, DeferredRetry, SyncOutcome};
pub use types::{
    ClientWindow, FetchRequest, FetchResponse, NotificationData, NotificationRecord, PushPayload,
    RequestMode, SyncEvent,
};
