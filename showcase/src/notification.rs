//! Transient status messages that dismiss themselves.
//!
//! At most one notification is visible. Showing a new one replaces the old
//! one and restarts the dismiss timer, which runs as a cancellable effect
//! under [`dismiss_effect_id`].

use cartwheel_core::effect::{Effect, EffectId};
use cartwheel_core::reducer::Reducer;
use cartwheel_core::{smallvec, SmallVec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default time a notification stays visible
pub const DEFAULT_LIFETIME: Duration = Duration::from_millis(3000);

/// Id of the pending auto-dismiss timer
#[must_use]
pub fn dismiss_effect_id() -> EffectId {
    EffectId::new("notification.dismiss")
}

/// Tone of a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Something worked
    Success,
    /// Something failed
    Error,
    /// Neutral information
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A visible notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Sequence number, unique per state
    pub id: u64,
    /// Tone
    pub kind: NotificationKind,
    /// Text shown to the user
    pub message: String,
}

/// State of the notification area
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    /// The visible notification, if any
    pub current: Option<Notification>,
    /// Notifications shown so far; the last one's id
    pub shown: u64,
}

/// Actions for the notification area
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotificationAction {
    /// Show a message, replacing any visible one
    Show {
        /// Tone
        kind: NotificationKind,
        /// Text
        message: String,
    },
    /// Timer fired for notification `id`
    Dismiss {
        /// The notification the timer was started for
        id: u64,
    },
    /// Close the visible notification immediately
    DismissNow,
}

impl NotificationAction {
    /// `Show` with [`NotificationKind::Success`]
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::Show {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    /// `Show` with [`NotificationKind::Error`]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Show {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    /// `Show` with [`NotificationKind::Info`]
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::Show {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

/// Reducer for the notification area
#[derive(Clone, Copy, Debug)]
pub struct NotificationReducer {
    lifetime: Duration,
}

impl NotificationReducer {
    /// Notifications dismiss after [`DEFAULT_LIFETIME`]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_lifetime(DEFAULT_LIFETIME)
    }

    /// Notifications dismiss after `lifetime`
    #[must_use]
    pub const fn with_lifetime(lifetime: Duration) -> Self {
        Self { lifetime }
    }

    /// How long a notification stays visible
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl Default for NotificationReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for NotificationReducer {
    type State = NotificationState;
    type Action = NotificationAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            NotificationAction::Show { kind, message } => {
                state.shown += 1;
                let id = state.shown;
                tracing::debug!(id, %kind, "Showing notification");
                state.current = Some(Notification { id, kind, message });

                smallvec![
                    Effect::Cancel(dismiss_effect_id()),
                    Effect::Delay {
                        duration: self.lifetime,
                        action: Box::new(NotificationAction::Dismiss { id }),
                    }
                    .cancellable(dismiss_effect_id()),
                ]
            },
            NotificationAction::Dismiss { id } => {
                if state.current.as_ref().is_some_and(|n| n.id == id) {
                    state.current = None;
                } else {
                    tracing::trace!(id, "Stale dismiss ignored");
                }
                smallvec![Effect::None]
            },
            NotificationAction::DismissNow => {
                state.current = None;
                smallvec![Effect::Cancel(dismiss_effect_id())]
            },
        }
    }
}
