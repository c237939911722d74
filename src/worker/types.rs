use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped bag of fields delivered by the push service.
///
/// No schema is enforced. The well-known keys (`title`, `body`, `icon`, `badge`, `url`,
/// `tag`) are read through accessors that only accept non-empty strings. Title and body
/// also accept non-zero numbers and `true`, rendered as text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PushPayload {
    fields: Map<String, Value>,
}

impl PushPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the field as text when it is a non-empty string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns the field rendered for display: non-empty strings as-is, non-zero numbers
    /// and `true` as their JSON text. Falsy scalars, arrays and objects yield `None`.
    pub fn display_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) if number.as_f64().is_some_and(|n| n != 0.0) => {
                Some(number.to_string())
            }
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.display_text("title")
    }

    pub fn body(&self) -> Option<String> {
        self.display_text("body")
    }

    pub fn icon(&self) -> Option<&str> {
        self.text("icon")
    }

    pub fn badge(&self) -> Option<&str> {
        self.text("badge")
    }

    pub fn url(&self) -> Option<&str> {
        self.text("url")
    }

    pub fn tag(&self) -> Option<&str> {
        self.text("tag")
    }

    /// Shallow copy of every field except `url`, destined for the notification data.
    pub fn data_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != "url")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for PushPayload {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Data attached to a displayed notification; serialises flat as `{"url": .., ..extra}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Notification as handed to the platform for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub data: NotificationData,
}

impl NotificationRecord {
    /// URL the click router navigates to.
    pub fn target_url(&self) -> &str {
        &self.data.url
    }
}

/// Snapshot of one open top-level window of the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
    pub focused: bool,
}

impl ClientWindow {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            focused: false,
        }
    }

    /// Substring match against the click target.
    pub fn matches(&self, target_url: &str) -> bool {
        self.url.contains(target_url)
    }
}

/// Inbound background sync event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncEvent {
    pub tag: String,
    /// Set by the platform when it will not redeliver this tag after a failure.
    pub last_chance: bool,
}

impl SyncEvent {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            last_chance: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    NoCors,
    Cors,
}

impl RequestMode {
    /// Mode used when the request is re-issued from the worker. A constructed request
    /// cannot be a navigation, so navigations are forwarded as same-origin.
    pub fn forwarded_as(self) -> &'static str {
        match self {
            RequestMode::Navigate | RequestMode::SameOrigin => "same-origin",
            RequestMode::NoCors => "no-cors",
            RequestMode::Cors => "cors",
        }
    }
}

/// Intercepted request, reduced to what routing and forwarding need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            mode: RequestMode::Cors,
            headers: Vec::new(),
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
