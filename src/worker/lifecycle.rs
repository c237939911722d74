use crate::worker::error::{invalid_state_transition, WorkerResult};

/// Why a notification left the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    Clicked,
    Dismissed,
    TimedOut,
}

/// Lifecycle of a single notification.
///
/// `Delivered -> Displayed -> Closed(_)`. `Closed` is terminal; routing after a click is a
/// side effect of the transition, not a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationState {
    Delivered,
    Displayed,
    Closed(CloseReason),
}

impl NotificationState {
    pub fn displayed(self) -> WorkerResult<Self> {
        match self {
            NotificationState::Delivered => Ok(NotificationState::Displayed),
            NotificationState::Displayed => Ok(self),
            NotificationState::Closed(_) => Err(invalid_state_transition(
                "A closed notification cannot be displayed again",
            )),
        }
    }

    /// Closing is idempotent: an already closed notification keeps its first reason.
    pub fn close(self, reason: CloseReason) -> Self {
        match self {
            NotificationState::Closed(_) => self,
            _ => NotificationState::Closed(reason),
        }
    }

    pub fn is_visible(self) -> bool {
        self == NotificationState::Displayed
    }

    pub fn is_closed(self) -> bool {
        matches!(self, NotificationState::Closed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_to_clicked() {
        let state = NotificationState::Delivered.displayed().unwrap();
        assert!(state.is_visible());
        let state = state.close(CloseReason::Clicked);
        assert_eq!(state, NotificationState::Closed(CloseReason::Clicked));
    }

    #[test]
    fn closing_twice_keeps_first_reason() {
        let state = NotificationState::Displayed
            .close(CloseReason::Dismissed)
            .close(CloseReason::Clicked);
        assert_eq!(state, NotificationState::Closed(CloseReason::Dismissed));
    }

    #[test]
    fn closed_cannot_be_redisplayed() {
        let err = NotificationState::Closed(CloseReason::TimedOut)
            .displayed()
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/invalid-state-transition");
    }
}
