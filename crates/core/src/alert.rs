//! Alert kinds and their push delivery parameters.
//!
//! An [`AlertIntent`] is what the edge detector and the timers decide to
//! send. It carries a message template rather than a finished message: the
//! vessel status suffix is rendered only when the alert actually fires, so a
//! debounced "anchor dropped" reports the position one second later, not the
//! position at detection time.

use std::time::Duration;

use serde::Serialize;

use crate::notification_state::NotificationState;

/// Lifetime of informational alerts (anchor dropped/raised, back to OK).
pub const INFO_TTL: Duration = Duration::from_secs(60);

/// How often the push channel re-alerts an unacknowledged alarm.
pub const ALARM_RETRY: Duration = Duration::from_secs(30);

/// How long the push channel keeps re-alerting before giving up.
pub const ALARM_EXPIRE: Duration = Duration::from_secs(600);

/// Delay before anchor dropped/raised alerts are sent.
pub const ANCHOR_DEBOUNCE: Duration = Duration::from_secs(1);

/// Push channel priority level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(into = "i8")]
pub enum Priority {
    /// Regular notification.
    #[default]
    Normal,
    /// Bypasses quiet hours, repeats until acknowledged.
    High,
    /// Like `High`, rendered as an emergency by the client.
    Emergency,
}

impl Priority {
    /// Numeric level used on the wire.
    pub fn level(self) -> i8 {
        match self {
            Self::Normal => 0,
            Self::High => 1,
            Self::Emergency => 2,
        }
    }
}

impl From<Priority> for i8 {
    fn from(priority: Priority) -> Self {
        priority.level()
    }
}

/// Channel-native delivery fields attached to every push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryParams {
    pub priority: Priority,
    /// Re-alert interval for unacknowledged high-priority pushes.
    pub retry: Option<Duration>,
    /// Stop re-alerting after this long.
    pub expire: Option<Duration>,
    /// Delete the message from the device after this long.
    pub ttl: Option<Duration>,
}

impl DeliveryParams {
    /// Short-lived informational push.
    pub fn info(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Persistent alarm that repeats until acknowledged or expired.
    pub fn alarm(priority: Priority) -> Self {
        Self {
            priority,
            retry: Some(ALARM_RETRY),
            expire: Some(ALARM_EXPIRE),
            ttl: None,
        }
    }
}

/// Which alarm a notification-state transition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSource {
    Anchor,
    Depth,
}

impl AlarmSource {
    fn label(self) -> &'static str {
        match self {
            Self::Anchor => "ANCHOR",
            Self::Depth => "DEPTH",
        }
    }
}

/// Message template of an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertKind {
    AnchorDropped,
    AnchorRaised,
    /// Alarm or emergency raised by the anchor or depth alarm.
    Alarm {
        source: AlarmSource,
        state: NotificationState,
    },
    /// Anchor or depth alarm returned to normal.
    BackToNormal(AlarmSource),
    /// No position update within the watchdog interval.
    NoPosition,
    /// Periodic all-is-well.
    Heartbeat,
}

impl AlertKind {
    /// Render the final message, appending `status` where the template
    /// carries one.
    pub fn render(&self, status: &str) -> String {
        match self {
            Self::AnchorDropped => format!("Anchor Dropped {status}"),
            Self::AnchorRaised => "Anchor Raised".to_string(),
            Self::Alarm { source, state } => {
                let level = if *state == NotificationState::Emergency {
                    "ALARM"
                } else {
                    "WARN"
                };
                format!("{} {level} {status}", source.label())
            }
            Self::BackToNormal(AlarmSource::Anchor) => format!("Anchor OK {status}"),
            Self::BackToNormal(AlarmSource::Depth) => format!("DEPTH OK {status}"),
            Self::NoPosition => format!("NO GPS {status}"),
            Self::Heartbeat => format!("OK {status}"),
        }
    }
}

/// A decided, not yet sent, notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertIntent {
    pub kind: AlertKind,
    pub delivery: DeliveryParams,
    /// Send after this delay instead of immediately.
    pub delay: Option<Duration>,
}

impl AlertIntent {
    pub fn anchor_dropped() -> Self {
        Self {
            kind: AlertKind::AnchorDropped,
            delivery: DeliveryParams::info(INFO_TTL),
            delay: Some(ANCHOR_DEBOUNCE),
        }
    }

    pub fn anchor_raised() -> Self {
        Self {
            kind: AlertKind::AnchorRaised,
            delivery: DeliveryParams::info(INFO_TTL),
            delay: Some(ANCHOR_DEBOUNCE),
        }
    }

    /// Alarm intent for `state`, which must be alarm or emergency.
    pub fn alarm(source: AlarmSource, state: NotificationState) -> Self {
        let priority = if state == NotificationState::Emergency {
            Priority::Emergency
        } else {
            Priority::High
        };
        Self {
            kind: AlertKind::Alarm { source, state },
            delivery: DeliveryParams::alarm(priority),
            delay: None,
        }
    }

    pub fn back_to_normal(source: AlarmSource) -> Self {
        Self {
            kind: AlertKind::BackToNormal(source),
            delivery: DeliveryParams::info(INFO_TTL),
            delay: None,
        }
    }

    pub fn no_position() -> Self {
        Self {
            kind: AlertKind::NoPosition,
            delivery: DeliveryParams::alarm(Priority::Emergency),
            delay: None,
        }
    }

    /// All-is-well push that lives for one heartbeat interval.
    pub fn heartbeat(interval: Duration) -> Self {
        Self {
            kind: AlertKind::Heartbeat,
            delivery: DeliveryParams::info(interval),
            delay: None,
        }
    }
}
