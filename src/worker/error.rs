use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerErrorCode {
    InvalidArgument,
    InvalidSettings,
    Internal,
    UnsupportedEnvironment,
    PermissionBlocked,
    NotificationDisplayFailed,
    InvalidStateTransition,
    ClientLookupFailed,
    WindowFocusFailed,
    WindowOpenFailed,
    SyncFailed,
    SyncTimedOut,
    PrecacheConflictingEntries,
    PrecacheFetchFailed,
    CacheStorageFailed,
    NetworkFailed,
    WorkerStopped,
}

impl WorkerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerErrorCode::InvalidArgument => "sw/invalid-argument",
            WorkerErrorCode::InvalidSettings => "sw/invalid-settings",
            WorkerErrorCode::Internal => "sw/internal",
            WorkerErrorCode::UnsupportedEnvironment => "sw/unsupported-environment",
            WorkerErrorCode::PermissionBlocked => "sw/permission-blocked",
            WorkerErrorCode::NotificationDisplayFailed => "sw/notification-display-failed",
            WorkerErrorCode::InvalidStateTransition => "sw/invalid-state-transition",
            WorkerErrorCode::ClientLookupFailed => "sw/client-lookup-failed",
            WorkerErrorCode::WindowFocusFailed => "sw/window-focus-failed",
            WorkerErrorCode::WindowOpenFailed => "sw/window-open-failed",
            WorkerErrorCode::SyncFailed => "sw/sync-failed",
            WorkerErrorCode::SyncTimedOut => "sw/sync-timed-out",
            WorkerErrorCode::PrecacheConflictingEntries => "sw/precache-conflicting-entries",
            WorkerErrorCode::PrecacheFetchFailed => "sw/precache-fetch-failed",
            WorkerErrorCode::CacheStorageFailed => "sw/cache-storage-failed",
            WorkerErrorCode::NetworkFailed => "sw/network-failed",
            WorkerErrorCode::WorkerStopped => "sw/worker-stopped",
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkerError {
    pub code: WorkerErrorCode,
    message: String,
}

impl WorkerError {
    pub fn new(code: WorkerErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for WorkerError {}

pub type WorkerResult<T> = Result<T, WorkerError>;

pub fn invalid_argument(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InvalidArgument, message)
}

pub fn invalid_settings(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InvalidSettings, message)
}

pub fn internal_error(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::Internal, message)
}

pub fn unsupported_environment(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::UnsupportedEnvironment, message)
}

pub fn permission_blocked(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::PermissionBlocked, message)
}

pub fn notification_display_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::NotificationDisplayFailed, message)
}

pub fn invalid_state_transition(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::InvalidStateTransition, message)
}

pub fn client_lookup_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::ClientLookupFailed, message)
}

pub fn window_focus_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::WindowFocusFailed, message)
}

pub fn window_open_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::WindowOpenFailed, message)
}

pub fn sync_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::SyncFailed, message)
}

pub fn sync_timed_out(tag: &str, timeout_ms: u64) -> WorkerError {
    WorkerError::new(
        WorkerErrorCode::SyncTimedOut,
        format!("Sync routine for tag '{tag}' did not settle within {timeout_ms} ms"),
    )
}

pub fn precache_conflicting_entries(url: &str, first: &str, second: &str) -> WorkerError {
    WorkerError::new(
        WorkerErrorCode::PrecacheConflictingEntries,
        format!("Precache manifest lists '{url}' with revisions '{first}' and '{second}'"),
    )
}

pub fn precache_fetch_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::PrecacheFetchFailed, message)
}

pub fn cache_storage_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::CacheStorageFailed, message)
}

pub fn network_failed(message: impl Into<String>) -> WorkerError {
    WorkerError::new(WorkerErrorCode::NetworkFailed, message)
}

pub fn worker_stopped() -> WorkerError {
    WorkerError::new(
        WorkerErrorCode::WorkerStopped,
        "The worker event loop is no longer accepting events.",
    )
}
