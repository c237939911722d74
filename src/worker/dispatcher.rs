//! Event loop feeding a [`ServiceWorker`] from a queue.
//!
//! Hosts that receive events on one task and want completion on another (the browser
//! bindings, native embedders) push [`WorkerEvent`]s through a [`WorkerHandle`]. Each
//! event runs on its own detached task, so a slow sync routine never holds up a push.

use std::sync::LazyLock;

use async_channel::{Receiver, Sender};
use futures::channel::oneshot;

use crate::logger::Logger;
use crate::platform::runtime;
use crate::worker::api::{EventOutcome, ServiceWorker, WorkerEvent};
use crate::worker::constants::{DEFAULT_EVENT_QUEUE_CAPACITY, WORKER_COMPONENT_NAME};
use crate::worker::error::{worker_stopped, WorkerResult};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(WORKER_COMPONENT_NAME));

struct Envelope {
    event: WorkerEvent,
    reply: oneshot::Sender<WorkerResult<EventOutcome>>,
}

/// Sending side of a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    sender: Sender<Envelope>,
}

impl WorkerHandle {
    /// Queues `event` and resolves once its handler has settled.
    ///
    /// This is the completion token a host awaits before reclaiming the worker.
    pub async fn dispatch(&self, event: WorkerEvent) -> WorkerResult<EventOutcome> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope { event, reply })
            .await
            .map_err(|_| worker_stopped())?;
        response.await.map_err(|_| worker_stopped())?
    }

    /// Stops accepting events. Events already queued still run.
    pub fn close(&self) -> bool {
        self.sender.close()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Events queued but not yet picked up by the loop.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("closed", &self.is_closed())
            .field("pending", &self.pending())
            .finish()
    }
}

impl ServiceWorker {
    /// Starts the event loop on a detached task and returns its handle.
    pub fn start(&self) -> WorkerHandle {
        self.start_with_capacity(DEFAULT_EVENT_QUEUE_CAPACITY)
    }

    pub fn start_with_capacity(&self, capacity: usize) -> WorkerHandle {
        let (sender, receiver) = async_channel::bounded(capacity.max(1));
        runtime::spawn_detached(run_event_loop(self.clone(), receiver));
        WorkerHandle { sender }
    }
}

async fn run_event_loop(worker: ServiceWorker, receiver: Receiver<Envelope>) {
    while let Ok(Envelope { event, reply }) = receiver.recv().await {
        let worker = worker.clone();
        runtime::spawn_detached(async move {
            let result = worker.handle(event).await;
            if reply.send(result).is_err() {
                log::debug!("event completion dropped; caller went away");
            }
        });
    }
    LOGGER.debug("event loop stopped");
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::worker::memory::StaticNetwork;
    use crate::worker::settings::WorkerSettings;
    use crate::worker::sync::SyncOutcome;
    use crate::worker::types::SyncEvent;
    use std::sync::Arc;

    fn worker() -> ServiceWorker {
        ServiceWorker::builder(WorkerSettings::default())
            .network(Arc::new(StaticNetwork::new()))
            .build()
            .unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dispatch_resolves_with_handler_outcome() {
        let handle = worker().start();
        let outcome = handle
            .dispatch(WorkerEvent::Sync(SyncEvent::new("newsletter")))
            .await
            .unwrap();
        assert_eq!(outcome, EventOutcome::Synced(SyncOutcome::Ignored));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn closed_handle_reports_worker_stopped() {
        let handle = worker().start();
        assert!(handle.close());
        assert!(handle.is_closed());
        let err = handle.dispatch(WorkerEvent::Install).await.unwrap_err();
        assert_eq!(err.code_str(), "sw/worker-stopped");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_dispatches_all_settle() {
        let handle = worker().start();
        let events = (0..8).map(|i| {
            let handle = handle.clone();
            async move {
                let tag = if i % 2 == 0 { "sync-data" } else { "other" };
                handle.dispatch(WorkerEvent::Sync(SyncEvent::new(tag))).await
            }
        });
        let results = futures::future::join_all(events).await;
        assert!(results.iter().all(Result::is_ok));
    }
}
