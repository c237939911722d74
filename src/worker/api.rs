use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::logger::Logger;
use crate::worker::click::{handle_close, route_click, ClickOutcome, NotificationClick};
use crate::worker::constants::WORKER_COMPONENT_NAME;
use crate::worker::error::WorkerResult;
use crate::worker::memory::{MemoryCacheStore, MemoryClients, MemoryNotificationCenter};
use crate::worker::platform::{
    CacheStore, ClientRegistry, NetworkFetcher, NotificationCenter, SyncRoutine,
};
use crate::worker::precache::{
    ActivateReport, FetchOutcome, InstallReport, PrecacheController, PrecacheManifest,
};
use crate::worker::push::handle_push;
use crate::worker::settings::WorkerSettings;
use crate::worker::sync::{handle_sync, DeferredRetry, SyncOutcome};
use crate::worker::types::{FetchRequest, NotificationRecord, SyncEvent};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(WORKER_COMPONENT_NAME));

/// Everything the host platform can deliver to the worker.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    /// Raw push message body, if the message carried one.
    Push(Option<Vec<u8>>),
    NotificationClick(NotificationClick),
    NotificationClose(NotificationRecord),
    Sync(SyncEvent),
}

impl WorkerEvent {
    /// DOM event name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Push(_) => "push",
            WorkerEvent::NotificationClick(_) => "notificationclick",
            WorkerEvent::NotificationClose(_) => "notificationclose",
            WorkerEvent::Sync(_) => "sync",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventOutcome {
    Installed {
        report: InstallReport,
        /// The host should call `skipWaiting()` on the global scope.
        skip_waiting: bool,
    },
    Activated {
        report: ActivateReport,
        claimed: bool,
    },
    Fetched(FetchOutcome),
    Displayed(NotificationRecord),
    Clicked(ClickOutcome),
    Closed,
    Synced(SyncOutcome),
}

/// The service worker core: settings, precache routes and the platform it runs on.
///
/// Cloning is cheap and clones share the same platform handles. The worker holds no
/// mutable state of its own between events.
#[derive(Clone)]
pub struct ServiceWorker {
    inner: Arc<ServiceWorkerInner>,
}

struct ServiceWorkerInner {
    settings: WorkerSettings,
    precache: PrecacheController,
    notifications: Arc<dyn NotificationCenter>,
    clients: Arc<dyn ClientRegistry>,
    cache: Arc<dyn CacheStore>,
    network: Arc<dyn NetworkFetcher>,
    sync_routine: Arc<dyn SyncRoutine>,
}

impl fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("scope", &self.inner.settings.scope)
            .field("precache_cache", &self.inner.precache.cache_name())
            .field("precache_routes", &self.inner.precache.len())
            .finish()
    }
}

impl ServiceWorker {
    pub fn builder(settings: WorkerSettings) -> ServiceWorkerBuilder {
        ServiceWorkerBuilder::new(settings)
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.inner.settings
    }

    pub fn precache(&self) -> &PrecacheController {
        &self.inner.precache
    }

    /// Runs the handler for `event` to completion.
    ///
    /// The returned future settles exactly when the platform may reclaim the worker for
    /// this event. Errors are logged and returned unchanged.
    pub async fn handle(&self, event: WorkerEvent) -> WorkerResult<EventOutcome> {
        let kind = event.kind();
        let result = self.handle_event(event).await;
        if let Err(err) = &result {
            LOGGER.warn(format!("{kind} handler failed: {err}"));
        }
        result
    }

    async fn handle_event(&self, event: WorkerEvent) -> WorkerResult<EventOutcome> {
        let inner = &self.inner;
        match event {
            WorkerEvent::Install => {
                let report = inner
                    .precache
                    .install(inner.cache.as_ref(), inner.network.as_ref())
                    .await?;
                Ok(EventOutcome::Installed {
                    report,
                    skip_waiting: inner.settings.skip_waiting,
                })
            }
            WorkerEvent::Activate => {
                let report = inner.precache.activate(inner.cache.as_ref()).await?;
                let claimed = inner.settings.clients_claim;
                if claimed {
                    inner.clients.claim().await?;
                }
                Ok(EventOutcome::Activated { report, claimed })
            }
            WorkerEvent::Fetch(request) => inner
                .precache
                .handle_fetch(inner.cache.as_ref(), inner.network.as_ref(), &request)
                .await
                .map(EventOutcome::Fetched),
            WorkerEvent::Push(body) => handle_push(
                inner.notifications.as_ref(),
                &inner.settings.notification,
                body.as_deref(),
            )
            .await
            .map(EventOutcome::Displayed),
            WorkerEvent::NotificationClick(click) => {
                route_click(inner.notifications.as_ref(), inner.clients.as_ref(), &click)
                    .await
                    .map(EventOutcome::Clicked)
            }
            WorkerEvent::NotificationClose(record) => {
                handle_close(inner.notifications.as_ref(), &record).await?;
                Ok(EventOutcome::Closed)
            }
            WorkerEvent::Sync(event) => {
                handle_sync(&inner.settings.sync, inner.sync_routine.as_ref(), &event)
                    .await
                    .map(EventOutcome::Synced)
            }
        }
    }
}

/// Assembles a [`ServiceWorker`]. Unset platform pieces fall back to the in-memory
/// implementations and, natively, to [`crate::worker::HttpFetcher`] for the network.
pub struct ServiceWorkerBuilder {
    settings: WorkerSettings,
    manifest: PrecacheManifest,
    notifications: Option<Arc<dyn NotificationCenter>>,
    clients: Option<Arc<dyn ClientRegistry>>,
    cache: Option<Arc<dyn CacheStore>>,
    network: Option<Arc<dyn NetworkFetcher>>,
    sync_routine: Option<Arc<dyn SyncRoutine>>,
}

impl ServiceWorkerBuilder {
    pub fn new(settings: WorkerSettings) -> Self {
        Self {
            settings,
            manifest: PrecacheManifest::default(),
            notifications: None,
            clients: None,
            cache: None,
            network: None,
            sync_routine: None,
        }
    }

    /// Settings and manifest injected by the build or the host environment.
    pub fn from_environment() -> WorkerResult<Self> {
        let settings = WorkerSettings::from_environment()?;
        let manifest = PrecacheManifest::from_environment()?;
        Ok(Self::new(settings).manifest(manifest))
    }

    pub fn manifest(mut self, manifest: PrecacheManifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.settings.scope = scope.into();
        self
    }

    pub fn notifications(mut self, notifications: Arc<dyn NotificationCenter>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn clients(mut self, clients: Arc<dyn ClientRegistry>) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn network(mut self, network: Arc<dyn NetworkFetcher>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn sync_routine(mut self, routine: Arc<dyn SyncRoutine>) -> Self {
        self.sync_routine = Some(routine);
        self
    }

    /// Validates the settings, applies the log level and resolves the precache routes.
    pub fn build(self) -> WorkerResult<ServiceWorker> {
        self.settings.validate()?;
        self.settings.apply_log_level()?;
        let scope = self.settings.scope_url()?;
        let precache =
            PrecacheController::new(&self.manifest, &scope, self.settings.precache.clone())?;

        let network = match self.network {
            Some(network) => network,
            None => default_network()?,
        };

        let inner = ServiceWorkerInner {
            precache,
            notifications: self
                .notifications
                .unwrap_or_else(|| Arc::new(MemoryNotificationCenter::new())),
            clients: self.clients.unwrap_or_else(|| Arc::new(MemoryClients::new())),
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryCacheStore::new())),
            network,
            sync_routine: self.sync_routine.unwrap_or_else(|| Arc::new(DeferredRetry)),
            settings: self.settings,
        };
        LOGGER.debug(format!(
            "worker built for scope {scope} with {} precache route(s)",
            inner.precache.len()
        ));
        Ok(ServiceWorker {
            inner: Arc::new(inner),
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_network() -> WorkerResult<Arc<dyn NetworkFetcher>> {
    Ok(Arc::new(crate::worker::http::HttpFetcher::new()?))
}

#[cfg(target_arch = "wasm32")]
fn default_network() -> WorkerResult<Arc<dyn NetworkFetcher>> {
    Err(crate::worker::error::invalid_argument(
        "A network fetcher must be provided on wasm32 targets",
    ))
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::worker::memory::StaticNetwork;
    use crate::worker::precache::{PrecacheEntry, ResponseSource};
    use crate::worker::types::FetchResponse;

    struct Fixture {
        worker: ServiceWorker,
        notifications: Arc<MemoryNotificationCenter>,
        clients: Arc<MemoryClients>,
        network: Arc<StaticNetwork>,
    }

    fn fixture(settings: WorkerSettings) -> Fixture {
        let notifications = Arc::new(MemoryNotificationCenter::new());
        let clients = Arc::new(MemoryClients::with_windows(["https://app.example/cards/42"]));
        let network = Arc::new(
            StaticNetwork::new()
                .route("https://app.example/index.html", FetchResponse::new(200, "<html>")),
        );
        let worker = ServiceWorker::builder(settings)
            .scope("https://app.example/")
            .manifest(PrecacheManifest::new(vec![PrecacheEntry::new(
                "/index.html",
                Some("r1".into()),
            )]))
            .notifications(notifications.clone())
            .clients(clients.clone())
            .network(network.clone())
            .build()
            .unwrap();
        Fixture {
            worker,
            notifications,
            clients,
            network,
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn install_activate_and_fetch() {
        let settings = WorkerSettings {
            skip_waiting: true,
            clients_claim: true,
            ..Default::default()
        };
        let Fixture {
            worker,
            clients,
            network,
            ..
        } = fixture(settings);

        match worker.handle(WorkerEvent::Install).await.unwrap() {
            EventOutcome::Installed { report, skip_waiting } => {
                assert_eq!(report.updated, vec!["https://app.example/index.html".to_string()]);
                assert!(skip_waiting);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        match worker.handle(WorkerEvent::Activate).await.unwrap() {
            EventOutcome::Activated { claimed, .. } => assert!(claimed),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(clients.claimed());

        let fetched = worker
            .handle(WorkerEvent::Fetch(FetchRequest::navigate("https://app.example/")))
            .await
            .unwrap();
        match fetched {
            EventOutcome::Fetched(outcome) => assert_eq!(outcome.source, ResponseSource::Precache),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(network.requests().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn push_then_click_focuses_existing_window() {
        let Fixture {
            worker,
            notifications,
            clients,
            ..
        } = fixture(WorkerSettings::default());

        let record = match worker
            .handle(WorkerEvent::Push(Some(br#"{"title":"Hi","url":"/cards/42"}"#.to_vec())))
            .await
            .unwrap()
        {
            EventOutcome::Displayed(record) => record,
            other => panic!("unexpected outcome {other:?}"),
        };
        assert_eq!(record.title, "Hi");
        assert_eq!(notifications.visible().len(), 1);

        let outcome = worker
            .handle(WorkerEvent::NotificationClick(NotificationClick::new(record)))
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::Clicked(ClickOutcome::Focused(_))));
        assert!(notifications.visible().is_empty());
        assert!(clients.opened_urls().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sync_tags_are_filtered() {
        let Fixture { worker, .. } = fixture(WorkerSettings::default());
        let ignored = worker
            .handle(WorkerEvent::Sync(SyncEvent::new("newsletter")))
            .await
            .unwrap();
        assert_eq!(ignored, EventOutcome::Synced(SyncOutcome::Ignored));
        let completed = worker
            .handle(WorkerEvent::Sync(SyncEvent::new("sync-data")))
            .await
            .unwrap();
        assert_eq!(completed, EventOutcome::Synced(SyncOutcome::Completed));
    }

    #[test]
    fn invalid_settings_fail_build() {
        let settings = WorkerSettings {
            scope: "nowhere".into(),
            ..Default::default()
        };
        let err = ServiceWorker::builder(settings)
            .network(Arc::new(StaticNetwork::new()))
            .build()
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/invalid-settings");
    }
}
