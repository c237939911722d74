//! Background sync trigger.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::logger::Logger;
use crate::platform::runtime::with_timeout;
use crate::worker::constants::WORKER_COMPONENT_NAME;
use crate::worker::error::{sync_timed_out, WorkerResult};
use crate::worker::platform::SyncRoutine;
use crate::worker::settings::SyncSettings;
use crate::worker::types::SyncEvent;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(WORKER_COMPONENT_NAME));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The tag is not ours; the routine was not invoked.
    Ignored,
    Completed,
}

/// Default routine. Holds no business logic yet, so replaying it is trivially safe.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeferredRetry;

#[cfg_attr(all(feature = "wasm-web", target_arch = "wasm32"), async_trait(?Send))]
#[cfg_attr(not(all(feature = "wasm-web", target_arch = "wasm32")), async_trait)]
impl SyncRoutine for DeferredRetry {
    async fn run(&self, tag: &str) -> WorkerResult<()> {
        log::debug!("deferred retry for '{tag}' has nothing queued");
        Ok(())
    }
}

/// Runs `routine` once when `event.tag` is the configured tag.
///
/// The routine is bounded by `settings.timeout_ms`. Its error is returned as the event's
/// completion so the platform can reschedule.
pub async fn handle_sync(
    settings: &SyncSettings,
    routine: &dyn SyncRoutine,
    event: &SyncEvent,
) -> WorkerResult<SyncOutcome> {
    if event.tag != settings.tag {
        LOGGER.debug(format!("ignoring sync tag '{}'", event.tag));
        return Ok(SyncOutcome::Ignored);
    }

    let timeout = Duration::from_millis(settings.timeout_ms);
    let result = match with_timeout(timeout, routine.run(&event.tag)).await {
        Ok(result) => result,
        Err(_) => Err(sync_timed_out(&event.tag, settings.timeout_ms)),
    };

    match result {
        Ok(()) => Ok(SyncOutcome::Completed),
        Err(err) => {
            if event.last_chance {
                LOGGER.error(format!(
                    "sync '{}' failed on its last attempt: {err}",
                    event.tag
                ));
            } else {
                LOGGER.warn(format!("sync '{}' failed; platform may retry: {err}", event.tag));
            }
            Err(err)
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::platform::runtime::sleep;
    use crate::worker::error::sync_failed;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRoutine {
        calls: AtomicUsize,
        fail: bool,
        delay_ms: u64,
    }

    #[async_trait]
    impl SyncRoutine for CountingRoutine {
        async fn run(&self, _tag: &str) -> WorkerResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                Err(sync_failed("upload rejected"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unrecognised_tag_does_not_run_routine() {
        let routine = CountingRoutine::default();
        let outcome = handle_sync(&SyncSettings::default(), &routine, &SyncEvent::new("newsletter"))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored);
        assert_eq!(routine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn recognised_tag_runs_routine_once() {
        let routine = CountingRoutine::default();
        let outcome = handle_sync(&SyncSettings::default(), &routine, &SyncEvent::new("sync-data"))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Completed);
        assert_eq!(routine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn routine_failure_is_the_completion_error() {
        let routine = CountingRoutine {
            fail: true,
            ..Default::default()
        };
        let mut event = SyncEvent::new("sync-data");
        event.last_chance = true;
        let err = handle_sync(&SyncSettings::default(), &routine, &event)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/sync-failed");
        assert_eq!(routine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn slow_routine_times_out() {
        let routine = CountingRoutine {
            delay_ms: 500,
            ..Default::default()
        };
        let settings = SyncSettings {
            timeout_ms: 10,
            ..Default::default()
        };
        let err = handle_sync(&settings, &routine, &SyncEvent::new("sync-data"))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/sync-timed-out");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn deferred_retry_is_repeatable() {
        let event = SyncEvent::new("sync-data");
        for _ in 0..3 {
            let outcome = handle_sync(&SyncSettings::default(), &DeferredRetry, &event)
                .await
                .unwrap();
            assert_eq!(outcome, SyncOutcome::Completed);
        }
    }
}
