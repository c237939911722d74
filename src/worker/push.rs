//! Push handler: payload parsing, notification population and display.

use std::sync::LazyLock;

use serde_json::Value;

use crate::logger::{log_arg, Logger};
use crate::worker::constants::WORKER_COMPONENT_NAME;
use crate::worker::error::WorkerResult;
use crate::worker::platform::NotificationCenter;
use crate::worker::settings::NotificationDefaults;
use crate::worker::types::{NotificationData, NotificationRecord, PushPayload};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(WORKER_COMPONENT_NAME));

/// Decodes a push message body.
///
/// Never fails: a missing body, invalid JSON, or JSON that is not an object all yield an
/// empty payload so a notification is still shown with fallback text. The last two cases
/// are logged.
pub fn parse_push_payload(body: Option<&[u8]>) -> PushPayload {
    let Some(bytes) = body else {
        return PushPayload::default();
    };
    if bytes.is_empty() {
        return PushPayload::default();
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(fields)) => PushPayload::new(fields),
        Ok(other) => {
            LOGGER.warn_with(vec![
                log_arg("push payload is not a JSON object; using defaults. Received"),
                log_arg(json_kind(&other)),
            ]);
            PushPayload::default()
        }
        Err(err) => {
            LOGGER.warn(format!("failed to parse push payload as JSON: {err}"));
            PushPayload::default()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds the notification for `payload`, substituting `defaults` for missing fields.
pub fn build_notification(payload: &PushPayload, defaults: &NotificationDefaults) -> NotificationRecord {
    let url = payload.url().unwrap_or(defaults.url.as_str());
    NotificationRecord {
        title: payload.title().unwrap_or_else(|| defaults.title.clone()),
        body: payload.body().unwrap_or_else(|| defaults.body.clone()),
        icon: payload.icon().unwrap_or(defaults.icon.as_str()).to_string(),
        badge: payload.badge().unwrap_or(defaults.badge.as_str()).to_string(),
        vibrate: defaults.vibrate.clone(),
        tag: payload.tag().map(str::to_string),
        data: NotificationData {
            url: url.to_string(),
            extra: payload.data_fields(),
        },
    }
}

/// Handles one push event: parse, populate, display, in that order.
///
/// The returned future is what the platform keeps the worker alive for. Display failures
/// are returned unchanged; there is no retry.
pub async fn handle_push(
    center: &dyn NotificationCenter,
    defaults: &NotificationDefaults,
    body: Option<&[u8]>,
) -> WorkerResult<NotificationRecord> {
    let payload = parse_push_payload(body);
    let record = build_notification(&payload, defaults);
    center.show_notification(&record).await?;
    LOGGER.debug(format!("displayed notification '{}'", record.title));
    Ok(record)
}
