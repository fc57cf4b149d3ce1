//! Edge detection on telemetry updates.
//!
//! Pure logic: the caller reads the previous value from the
//! [`ValueStore`], stores the new one, then asks [`detect`] what the
//! transition means. Alerts fire on changes only, never on repeated
//! observations of the same state.

use anchorwatch_core::alert::{AlarmSource, AlertIntent};
use anchorwatch_core::notification_state::NotificationState;
use anchorwatch_core::paths::WatchedPath;
use serde_json::Value;

use crate::store::ValueStore;

/// What the engine should do about one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Stored for the status line, nothing else.
    Ignore,
    Notify(AlertIntent),
    /// A position arrived; the no-position watchdog should be rearmed.
    PositionFix,
}

/// Decide the reaction to `path` changing from `old` to `new`.
///
/// `old` is `None` when the path had never been seen before. `store` must
/// already contain `new`; it is consulted for cross-path conditions.
pub fn detect(path: &WatchedPath, old: Option<&Value>, new: &Value, store: &ValueStore) -> Reaction {
    match path {
        WatchedPath::AnchorMaxRadius => anchor_presence(old, new),
        WatchedPath::AnchorNotification => alarm_transition(AlarmSource::Anchor, old, new),
        // Depth alarms are only actionable while anchored.
        WatchedPath::DepthNotification if store.anchor_is_set() => {
            alarm_transition(AlarmSource::Depth, old, new)
        }
        WatchedPath::Position => Reaction::PositionFix,
        _ => Reaction::Ignore,
    }
}

/// Anchor raised: set -> null. Anchor dropped: null -> set, where the old
/// record must exist and be exactly null. A first-ever value is neither.
fn anchor_presence(old: Option<&Value>, new: &Value) -> Reaction {
    match old {
        Some(old) if !old.is_null() && new.is_null() => {
            Reaction::Notify(AlertIntent::anchor_raised())
        }
        Some(Value::Null) if !new.is_null() => Reaction::Notify(AlertIntent::anchor_dropped()),
        _ => Reaction::Ignore,
    }
}

fn alarm_transition(source: AlarmSource, old: Option<&Value>, new: &Value) -> Reaction {
    let old_state = NotificationState::of(old);
    let new_state = NotificationState::of(Some(new));

    if old_state == new_state {
        return Reaction::Ignore;
    }

    if new_state.is_alarming() {
        Reaction::Notify(AlertIntent::alarm(source, new_state))
    } else if new_state == NotificationState::Normal {
        Reaction::Notify(AlertIntent::back_to_normal(source))
    } else {
        // Intermediate levels (alert, warn, unknown) stay silent.
        Reaction::Ignore
    }
}
