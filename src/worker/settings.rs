//! Worker configuration.
//!
//! Every field has a default so an empty JSON object (or no injected settings at all)
//! yields the stock NexCard behaviour. Values are validated once, before the worker is
//! built.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::platform::environment;
use crate::worker::constants::{
    DEFAULT_CLICK_URL, DEFAULT_DIRECTORY_INDEX, DEFAULT_IGNORED_URL_PARAMETERS,
    DEFAULT_NOTIFICATION_BADGE, DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_ICON,
    DEFAULT_NOTIFICATION_TITLE, DEFAULT_PRECACHE_PREFIX, DEFAULT_PRECACHE_VERSION,
    DEFAULT_SCOPE, DEFAULT_SYNC_TAG, DEFAULT_SYNC_TIMEOUT_MS, DEFAULT_VIBRATION_PATTERN,
    MAX_VIBRATION_STEP_MS,
};
use crate::worker::error::{invalid_settings, WorkerResult};

/// Origin used to resolve a path-only scope when the real origin is not known yet.
const FALLBACK_ORIGIN: &str = "http://localhost";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerSettings {
    /// Absolute URL or `/`-rooted path the worker controls.
    pub scope: String,
    pub log_level: Option<String>,
    pub skip_waiting: bool,
    pub clients_claim: bool,
    pub notification: NotificationDefaults,
    pub sync: SyncSettings,
    pub precache: PrecacheSettings,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            log_level: None,
            skip_waiting: false,
            clients_claim: false,
            notification: NotificationDefaults::default(),
            sync: SyncSettings::default(),
            precache: PrecacheSettings::default(),
        }
    }
}

/// Fallback values substituted for missing push payload fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub url: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            body: DEFAULT_NOTIFICATION_BODY.to_string(),
            icon: DEFAULT_NOTIFICATION_ICON.to_string(),
            badge: DEFAULT_NOTIFICATION_BADGE.to_string(),
            vibrate: DEFAULT_VIBRATION_PATTERN.to_vec(),
            url: DEFAULT_CLICK_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncSettings {
    /// The only sync tag that triggers the retry routine.
    pub tag: String,
    pub timeout_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            tag: DEFAULT_SYNC_TAG.to_string(),
            timeout_ms: DEFAULT_SYNC_TIMEOUT_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrecacheSettings {
    pub cache_name_prefix: String,
    pub cache_version: String,
    /// Search parameter names stripped before lookup; `utm_*` style prefixes allowed.
    pub ignore_url_parameters: Vec<String>,
    pub directory_index: Option<String>,
    pub clean_urls: bool,
}

impl Default for PrecacheSettings {
    fn default() -> Self {
        Self {
            cache_name_prefix: DEFAULT_PRECACHE_PREFIX.to_string(),
            cache_version: DEFAULT_PRECACHE_VERSION.to_string(),
            ignore_url_parameters: DEFAULT_IGNORED_URL_PARAMETERS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            directory_index: Some(DEFAULT_DIRECTORY_INDEX.to_string()),
            clean_urls: true,
        }
    }
}

impl PrecacheSettings {
    /// Name of the cache holding the current precache generation.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.cache_name_prefix, self.cache_version)
    }

    pub fn is_ignored_parameter(&self, name: &str) -> bool {
        self.ignore_url_parameters
            .iter()
            .any(|pattern| match pattern.strip_suffix('*') {
                Some(prefix) => name.starts_with(prefix),
                None => name == pattern,
            })
    }
}

impl WorkerSettings {
    pub fn from_json_str(raw: &str) -> WorkerResult<Self> {
        let settings: WorkerSettings = serde_json::from_str(raw)
            .map_err(|err| invalid_settings(format!("Failed to parse worker settings: {err}")))?;
        settings.validate()?;
        Ok(settings)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> WorkerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            invalid_settings(format!("Failed to read settings from {}: {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Settings injected by the build or the host environment, else the defaults.
    pub fn from_environment() -> WorkerResult<Self> {
        match environment::injected_settings() {
            Some(value) => {
                let settings: WorkerSettings = serde_json::from_value(value).map_err(|err| {
                    invalid_settings(format!("Failed to parse injected settings: {err}"))
                })?;
                settings.validate()?;
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> WorkerResult<()> {
        self.scope_url()?;
        if self.sync.tag.trim().is_empty() {
            return Err(invalid_settings("sync.tag must not be empty"));
        }
        if self.sync.timeout_ms == 0 {
            return Err(invalid_settings("sync.timeoutMs must be greater than zero"));
        }
        if let Some(step) = self
            .notification
            .vibrate
            .iter()
            .find(|step| **step > MAX_VIBRATION_STEP_MS)
        {
            return Err(invalid_settings(format!(
                "notification.vibrate step {step} exceeds {MAX_VIBRATION_STEP_MS} ms"
            )));
        }
        if self.notification.url.is_empty() {
            return Err(invalid_settings("notification.url must not be empty"));
        }
        if self.precache.cache_name_prefix.trim().is_empty() {
            return Err(invalid_settings("precache.cacheNamePrefix must not be empty"));
        }
        if let Some(level) = &self.log_level {
            level
                .parse::<crate::logger::LogLevel>()
                .map_err(|err| invalid_settings(err.to_string()))?;
        }
        Ok(())
    }

    /// The scope as an absolute URL. Path-only scopes resolve against `http://localhost`.
    pub fn scope_url(&self) -> WorkerResult<Url> {
        if let Ok(url) = Url::parse(&self.scope) {
            return Ok(url);
        }
        if !self.scope.starts_with('/') {
            return Err(invalid_settings(format!(
                "scope '{}' must be an absolute URL or start with '/'",
                self.scope
            )));
        }
        Url::parse(FALLBACK_ORIGIN)
            .and_then(|origin| origin.join(&self.scope))
            .map_err(|err| invalid_settings(format!("Invalid scope '{}': {err}", self.scope)))
    }

    /// Pushes `log_level` to every logger. A no-op when unset.
    pub fn apply_log_level(&self) -> WorkerResult<()> {
        if let Some(level) = &self.log_level {
            crate::logger::set_log_level(level.as_str())
                .map_err(|err| invalid_settings(err.to_string()))?;
        }
        Ok(())
    }
}
