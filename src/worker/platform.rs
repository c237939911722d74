//! Seams between the handlers and the host platform.
//!
//! Handlers never touch browser APIs directly; they receive these trait objects. The
//! browser bindings live in `worker::wasm`, in-memory versions in `worker::memory`.

use async_trait::async_trait;

use crate::worker::error::WorkerResult;
use crate::worker::lifecycle::CloseReason;
use crate::worker::types::{ClientWindow, FetchRequest, FetchResponse, NotificationRecord};

/// Displays and dismisses system notifications.
#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
pub trait NotificationCenter: Send + Sync {
    async fn show_notification(&self, record: &NotificationRecord) -> WorkerResult<()>;

    /// Closes the notification if it is still visible. Closing twice is a no-op.
    async fn close_notification(
        &self,
        record: &NotificationRecord,
        reason: CloseReason,
    ) -> WorkerResult<()>;
}

/// Access to the application's open windows.
#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
pub trait ClientRegistry: Send + Sync {
    /// Every window client in scope, including ones this worker does not control yet.
    /// Order is platform-defined.
    async fn window_clients(&self) -> WorkerResult<Vec<ClientWindow>>;

    async fn focus(&self, client: &ClientWindow) -> WorkerResult<ClientWindow>;

    fn can_open_window(&self) -> bool;

    async fn open_window(&self, url: &str) -> WorkerResult<Option<ClientWindow>>;

    /// Takes control of uncontrolled clients in scope.
    async fn claim(&self) -> WorkerResult<()>;
}

/// Named response caches shared by every worker activation.
#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
pub trait CacheStore: Send + Sync {
    async fn get(&self, cache_name: &str, key: &str) -> WorkerResult<Option<FetchResponse>>;

    async fn put(&self, cache_name: &str, key: &str, response: FetchResponse) -> WorkerResult<()>;

    async fn delete(&self, cache_name: &str, key: &str) -> WorkerResult<bool>;

    async fn keys(&self, cache_name: &str) -> WorkerResult<Vec<String>>;

    async fn cache_names(&self) -> WorkerResult<Vec<String>>;

    async fn delete_cache(&self, cache_name: &str) -> WorkerResult<bool>;
}

#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
pub trait NetworkFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> WorkerResult<FetchResponse>;
}

/// Deferred work run when the recognised sync tag fires.
///
/// The platform may redeliver a tag, so implementations must tolerate repeated calls.
/// Returning an error lets the platform reschedule under its own backoff policy.
#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
pub trait SyncRoutine: Send + Sync {
    async fn run(&self, tag: &str) -> WorkerResult<()>;
}
