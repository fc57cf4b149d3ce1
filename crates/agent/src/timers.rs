//! Deadline bookkeeping for the engine's three timers.
//!
//! [`TimerCoordinator`] does not spawn anything. It only remembers when each
//! timer is due; the engine's event loop sleeps until
//! [`next_deadline`](TimerCoordinator::next_deadline) and then collects what
//! fired with [`take_due`](TimerCoordinator::take_due). Each kind has a
//! single slot, so arming a timer always replaces the previous one of the
//! same kind.
//!
//! - **Watchdog**: one-shot, rearmed on every position fix.
//! - **Heartbeat**: periodic, first tick aligned to a wall-clock multiple of
//!   the interval.
//! - **Debounce**: one-shot delay carrying the alert it will release.

use std::time::Duration;

use anchorwatch_core::alert::AlertIntent;
use tokio::time::Instant;

/// The three timer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Watchdog,
    Heartbeat,
    Debounce,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerFired {
    Watchdog,
    Heartbeat,
    Debounce(AlertIntent),
}

#[derive(Debug, Clone, Copy)]
struct Heartbeat {
    next: Instant,
    interval: Duration,
}

#[derive(Debug, Default)]
pub struct TimerCoordinator {
    watchdog: Option<Instant>,
    heartbeat: Option<Heartbeat>,
    debounce: Option<(Instant, AlertIntent)>,
}

impl TimerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)arm the watchdog to fire `interval` from `now`.
    pub fn arm_watchdog(&mut self, now: Instant, interval: Duration) {
        self.watchdog = Some(now + interval);
    }

    pub fn cancel_watchdog(&mut self) {
        self.watchdog = None;
    }

    /// Start the heartbeat. The first tick lands on the next wall-clock
    /// multiple of `interval` after `wall_clock_ms` (Unix millis observed at
    /// `now`); later ticks follow every `interval`.
    pub fn start_heartbeat(&mut self, now: Instant, wall_clock_ms: i64, interval: Duration) {
        self.heartbeat = Some(Heartbeat {
            next: now + until_next_boundary(wall_clock_ms, interval),
            interval,
        });
    }

    /// Hold `intent` back for its delay. Replaces any pending debounce.
    pub fn debounce(&mut self, now: Instant, intent: AlertIntent) {
        let delay = intent.delay.unwrap_or_default();
        self.debounce = Some((now + delay, intent));
    }

    /// Earliest deadline across all armed timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.watchdog,
            self.heartbeat.map(|h| h.next),
            self.debounce.as_ref().map(|(at, _)| *at),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Remove and return every timer due at `now`, earliest first.
    ///
    /// One-shot timers disarm; the heartbeat moves to its next tick. A
    /// heartbeat that fell several ticks behind fires once and skips ahead.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerFired> {
        let mut due: Vec<(Instant, TimerFired)> = Vec::new();

        if let Some(at) = self.watchdog.filter(|at| *at <= now) {
            self.watchdog = None;
            due.push((at, TimerFired::Watchdog));
        }

        if let Some(heartbeat) = self.heartbeat.as_mut().filter(|h| h.next <= now) {
            let at = heartbeat.next;
            while heartbeat.next <= now {
                heartbeat.next += heartbeat.interval;
            }
            due.push((at, TimerFired::Heartbeat));
        }

        if self.debounce.as_ref().is_some_and(|(at, _)| *at <= now) {
            if let Some((at, intent)) = self.debounce.take() {
                due.push((at, TimerFired::Debounce(intent)));
            }
        }

        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, fired)| fired).collect()
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Watchdog => self.watchdog.is_some(),
            TimerKind::Heartbeat => self.heartbeat.is_some(),
            TimerKind::Debounce => self.debounce.is_some(),
        }
    }

    /// Disarm everything.
    pub fn cancel_all(&mut self) {
        self.watchdog = None;
        self.heartbeat = None;
        self.debounce = None;
    }
}

/// Time from `wall_clock_ms` to the next multiple of `interval`.
///
/// Exactly on a boundary the answer is a full interval, never zero.
pub fn until_next_boundary(wall_clock_ms: i64, interval: Duration) -> Duration {
    let interval_ms = interval.as_millis() as i64;
    if interval_ms <= 0 {
        return Duration::ZERO;
    }
    let elapsed = wall_clock_ms.rem_euclid(interval_ms);
    Duration::from_millis((interval_ms - elapsed) as u64)
}
