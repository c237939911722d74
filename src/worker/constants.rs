pub const WORKER_COMPONENT_NAME: &str = "@nexcard/sw";
pub const PRECACHE_COMPONENT_NAME: &str = "@nexcard/sw/precache";

pub const DEFAULT_NOTIFICATION_TITLE: &str = "New Notification";
pub const DEFAULT_NOTIFICATION_BODY: &str = "You have a new message!";
pub const DEFAULT_NOTIFICATION_ICON: &str = "/img/Logo-NexCard-192x192.png";
pub const DEFAULT_NOTIFICATION_BADGE: &str = DEFAULT_NOTIFICATION_ICON;
pub const DEFAULT_VIBRATION_PATTERN: [u32; 3] = [200, 100, 200];
pub const DEFAULT_CLICK_URL: &str = "/";
/// Longest single vibration or pause accepted in a pattern.
pub const MAX_VIBRATION_STEP_MS: u32 = 10_000;

pub const DEFAULT_SYNC_TAG: &str = "sync-data";
pub const DEFAULT_SYNC_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_SCOPE: &str = "/";
pub const DEFAULT_PRECACHE_PREFIX: &str = "nexcard-precache";
pub const DEFAULT_PRECACHE_VERSION: &str = "v2";
pub const DEFAULT_DIRECTORY_INDEX: &str = "index.html";
pub const REVISION_SEARCH_PARAM: &str = "__WB_REVISION__";

/// Search parameters dropped before precache lookups. A trailing `*` matches a prefix.
pub const DEFAULT_IGNORED_URL_PARAMETERS: [&str; 2] = ["utm_*", "fbclid"];

pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 64;
