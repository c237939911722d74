//! Notification click routing.

use std::sync::LazyLock;

use crate::logger::Logger;
use crate::worker::constants::WORKER_COMPONENT_NAME;
use crate::worker::error::WorkerResult;
use crate::worker::lifecycle::CloseReason;
use crate::worker::platform::{ClientRegistry, NotificationCenter};
use crate::worker::types::{ClientWindow, NotificationRecord};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(WORKER_COMPONENT_NAME));

/// A user interaction with a displayed notification.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationClick {
    pub notification: NotificationRecord,
    /// Action button id; `None` for a click on the notification body.
    pub action: Option<String>,
}

impl NotificationClick {
    pub fn new(notification: NotificationRecord) -> Self {
        Self {
            notification,
            action: None,
        }
    }
}

impl From<NotificationRecord> for NotificationClick {
    fn from(notification: NotificationRecord) -> Self {
        Self::new(notification)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An open window already showed the target and was focused.
    Focused(ClientWindow),
    /// A new window was opened. The platform may withhold the handle.
    Opened(Option<ClientWindow>),
    /// No window matched and the platform cannot open one.
    NoAction,
}

/// Routes a click: close the notification, then focus the first open window whose URL
/// contains the target, else open one new window at the target.
///
/// Enumeration order is whatever the platform reports; the first match wins. At most one
/// window is opened per call.
pub async fn route_click(
    center: &dyn NotificationCenter,
    clients: &dyn ClientRegistry,
    click: &NotificationClick,
) -> WorkerResult<ClickOutcome> {
    // Must happen before the search so the notification does not linger on screen.
    center
        .close_notification(&click.notification, CloseReason::Clicked)
        .await?;

    let target = click.notification.target_url();
    let windows = clients.window_clients().await?;
    if let Some(window) = windows.iter().find(|window| window.matches(target)) {
        let focused = clients.focus(window).await?;
        LOGGER.debug(format!("focused window {} for {target}", focused.id));
        return Ok(ClickOutcome::Focused(focused));
    }

    if !clients.can_open_window() {
        LOGGER.debug(format!("no window matches {target} and openWindow is unavailable"));
        return Ok(ClickOutcome::NoAction);
    }

    let opened = clients.open_window(target).await?;
    LOGGER.debug(format!("opened window for {target}"));
    Ok(ClickOutcome::Opened(opened))
}

/// Records a user dismissal. Nothing is routed.
pub async fn handle_close(
    center: &dyn NotificationCenter,
    notification: &NotificationRecord,
) -> WorkerResult<()> {
    center
        .close_notification(notification, CloseReason::Dismissed)
        .await?;
    LOGGER.debug(format!("notification '{}' dismissed", notification.title));
    Ok(())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::worker::lifecycle::NotificationState;
    use crate::worker::memory::{MemoryClients, MemoryNotificationCenter};
    use crate::worker::push::build_notification;
    use crate::worker::settings::NotificationDefaults;
    use crate::worker::types::PushPayload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    fn record_for(url: &str) -> NotificationRecord {
        let payload = PushPayload::new(json!({ "url": url }).as_object().cloned().unwrap());
        build_notification(&payload, &NotificationDefaults::default())
    }

    async fn displayed(url: &str) -> (MemoryNotificationCenter, NotificationRecord) {
        let center = MemoryNotificationCenter::new();
        let record = record_for(url);
        center.show_notification(&record).await.unwrap();
        (center, record)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn focuses_matching_window_without_opening() {
        let (center, record) = displayed("/cards/42").await;
        let clients = MemoryClients::with_windows(["https://app.example/cards/42"]);

        let outcome = route_click(&center, &clients, &NotificationClick::new(record))
            .await
            .unwrap();

        let window = match outcome {
            ClickOutcome::Focused(window) => window,
            other => panic!("expected focus, got {other:?}"),
        };
        assert!(window.focused);
        assert_eq!(clients.focus_calls(), vec![window.id]);
        assert!(clients.opened_urls().is_empty());
        assert!(center.visible().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn opens_exactly_one_window_when_none_match() {
        let (center, record) = displayed("/settings").await;
        let clients = MemoryClients::new();

        let outcome = route_click(&center, &clients, &NotificationClick::new(record))
            .await
            .unwrap();

        assert!(matches!(outcome, ClickOutcome::Opened(Some(_))));
        assert_eq!(clients.opened_urls(), vec!["/settings".to_string()]);
        assert!(clients.focus_calls().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn non_matching_windows_are_left_alone() {
        let (center, record) = displayed("/settings").await;
        let clients = MemoryClients::with_windows(["https://app.example/cards/1"]);

        route_click(&center, &clients, &NotificationClick::new(record))
            .await
            .unwrap();

        assert_eq!(clients.opened_urls(), vec!["/settings".to_string()]);
        assert!(clients.focus_calls().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn no_open_window_capability_takes_no_action() {
        let (center, record) = displayed("/settings").await;
        let clients = MemoryClients::new().without_open_window();

        let outcome = route_click(&center, &clients, &NotificationClick::new(record))
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::NoAction);
        assert!(clients.opened_urls().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn clicking_a_closed_notification_is_harmless() {
        let (center, record) = displayed("/cards/42").await;
        let clients = MemoryClients::with_windows(["https://app.example/cards/42"]);
        let click = NotificationClick::new(record.clone());

        route_click(&center, &clients, &click).await.unwrap();
        center
            .close_notification(&record, CloseReason::Clicked)
            .await
            .unwrap();
        route_click(&center, &clients, &click).await.unwrap();

        let states: Vec<_> = center.notifications().into_iter().map(|n| n.state).collect();
        assert_eq!(states, vec![NotificationState::Closed(CloseReason::Clicked)]);
        assert_eq!(clients.focus_calls().len(), 2);
    }

    /// Client registry that refuses to enumerate while any notification is still visible.
    struct RequiresClosedNotification {
        center: Arc<MemoryNotificationCenter>,
        clients: MemoryClients,
    }

    #[async_trait]
    impl ClientRegistry for RequiresClosedNotification {
        async fn window_clients(&self) -> WorkerResult<Vec<ClientWindow>> {
            assert!(
                self.center.visible().is_empty(),
                "windows enumerated before the notification was closed"
            );
            self.clients.window_clients().await
        }

        async fn focus(&self, client: &ClientWindow) -> WorkerResult<ClientWindow> {
            self.clients.focus(client).await
        }

        fn can_open_window(&self) -> bool {
            self.clients.can_open_window()
        }

        async fn open_window(&self, url: &str) -> WorkerResult<Option<ClientWindow>> {
            self.clients.open_window(url).await
        }

        async fn claim(&self) -> WorkerResult<()> {
            self.clients.claim().await
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn notification_closes_before_windows_are_searched() {
        let center = Arc::new(MemoryNotificationCenter::new());
        let record = record_for("/cards/42");
        center.show_notification(&record).await.unwrap();
        let clients = RequiresClosedNotification {
            center: center.clone(),
            clients: MemoryClients::with_windows(["https://app.example/cards/42"]),
        };

        let outcome = route_click(center.as_ref(), &clients, &NotificationClick::new(record))
            .await
            .unwrap();

        assert!(matches!(outcome, ClickOutcome::Focused(_)));
        assert_eq!(clients.clients.focus_calls().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn expired_notification_stays_timed_out_after_click() {
        let (center, record) = displayed("/cards/42").await;
        let clients = MemoryClients::with_windows(["https://app.example/cards/42"]);

        center.expire(&record);
        assert!(center.visible().is_empty());

        let outcome = route_click(&center, &clients, &NotificationClick::new(record))
            .await
            .unwrap();

        assert!(matches!(outcome, ClickOutcome::Focused(_)));
        let states: Vec<_> = center.notifications().into_iter().map(|n| n.state).collect();
        assert_eq!(states, vec![NotificationState::Closed(CloseReason::TimedOut)]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dismissal_marks_notification_dismissed() {
        let (center, record) = displayed("/").await;
        handle_close(&center, &record).await.unwrap();
        let states: Vec<_> = center.notifications().into_iter().map(|n| n.state).collect();
        assert_eq!(states, vec![NotificationState::Closed(CloseReason::Dismissed)]);
    }
}
