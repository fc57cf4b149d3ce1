//! The alert engine.
//!
//! [`Engine`] owns the [`ValueStore`] and the [`TimerCoordinator`] and runs
//! as a single task. Each loop iteration does exactly one thing: observe
//! cancellation, process one telemetry delta, or fire the timers that came
//! due. Delta processing and timer callbacks therefore never interleave,
//! and nothing fires once cancellation has been seen.
//!
//! Composed alerts are pushed onto an unbounded channel drained by the
//! dispatcher, so the engine never waits on the network.

use anchorwatch_core::alert::AlertIntent;
use anchorwatch_core::notification_state::NotificationState;
use anchorwatch_core::paths::{WatchedPath, PATH_NOTIFICATION_ANCHOR};
use anchorwatch_events::PushMessage;
use anchorwatch_signalk::Delta;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorSettings;
use crate::detector::{detect, Reaction};
use crate::status::status_text;
use crate::store::ValueStore;
use crate::timers::{TimerCoordinator, TimerFired};

pub struct Engine {
    settings: MonitorSettings,
    store: ValueStore,
    timers: TimerCoordinator,
    alerts: mpsc::UnboundedSender<PushMessage>,
}

impl Engine {
    pub fn new(settings: MonitorSettings, alerts: mpsc::UnboundedSender<PushMessage>) -> Self {
        Self {
            settings,
            store: ValueStore::new(),
            timers: TimerCoordinator::new(),
            alerts,
        }
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn timers(&self) -> &TimerCoordinator {
        &self.timers
    }

    /// Arm the start-up timers. `wall_clock_ms` is the current Unix time in
    /// milliseconds, used to align the heartbeat.
    pub fn start(&mut self, wall_clock_ms: i64) {
        let now = Instant::now();
        self.rearm_watchdog(now);
        if let Some(interval) = self.settings.heartbeat_interval {
            self.timers.start_heartbeat(now, wall_clock_ms, interval);
        }

        tracing::info!(
            heartbeat_secs = self.settings.heartbeat_interval.map(|d| d.as_secs()),
            watchdog_secs = self.settings.watchdog_interval.map(|d| d.as_secs()),
            "Alert engine started",
        );
    }

    /// Process every path/value pair of `delta` in delivery order.
    pub fn handle_delta(&mut self, delta: &Delta) {
        for pv in delta.values() {
            if pv.watched() == WatchedPath::Position {
                if let Some(position) = pv.position() {
                    tracing::trace!(
                        latitude = position.latitude,
                        longitude = position.longitude,
                        "Position fix",
                    );
                }
            }
            self.handle_value(&pv.path, pv.value.clone());
        }
    }

    /// Store one observation and act on the transition it represents.
    pub fn handle_value(&mut self, path: &str, value: Value) {
        let now = Instant::now();
        let old = self.store.get(path, None).cloned();
        self.store.set(path, value.clone());

        match detect(&WatchedPath::parse(path), old.as_ref(), &value, &self.store) {
            Reaction::Ignore => {}
            Reaction::PositionFix => self.rearm_watchdog(now),
            Reaction::Notify(intent) if intent.delay.is_some() => {
                tracing::debug!(path, kind = ?intent.kind, "Alert debounced");
                self.timers.debounce(now, intent);
            }
            Reaction::Notify(intent) => self.send(&intent),
        }
    }

    /// Fire every timer that is due now.
    pub fn fire_due(&mut self) {
        for fired in self.timers.take_due(Instant::now()) {
            match fired {
                TimerFired::Watchdog => {
                    tracing::warn!("No position update within the watchdog interval");
                    self.send(&AlertIntent::no_position());
                }
                TimerFired::Heartbeat => self.heartbeat(),
                TimerFired::Debounce(intent) => self.send(&intent),
            }
        }
    }

    /// Disarm all timers. Nothing is sent afterwards.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
        tracing::info!("Alert engine stopped");
    }

    /// Drive the engine until `cancel` fires.
    pub async fn run(mut self, mut deltas: mpsc::Receiver<Delta>, cancel: CancellationToken) {
        self.start(Utc::now().timestamp_millis());
        let mut telemetry_open = true;

        loop {
            let deadline = self.timers.next_deadline();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                delta = deltas.recv(), if telemetry_open => match delta {
                    Some(delta) => self.handle_delta(&delta),
                    None => {
                        tracing::info!("Telemetry channel closed");
                        telemetry_open = false;
                    }
                },
                _ = sleep_until(deadline) => self.fire_due(),
            }
        }

        self.shutdown();
    }

    // ---- private helpers ----

    /// The watchdog only runs while an anchor is set.
    fn rearm_watchdog(&mut self, now: Instant) {
        match self.settings.watchdog_interval {
            Some(interval) if self.store.anchor_is_set() => {
                self.timers.arm_watchdog(now, interval)
            }
            _ => self.timers.cancel_watchdog(),
        }
    }

    fn heartbeat(&self) {
        let Some(interval) = self.settings.heartbeat_interval else {
            return;
        };

        let state = NotificationState::of(self.store.get(PATH_NOTIFICATION_ANCHOR, None));
        if state != NotificationState::Normal {
            tracing::debug!(?state, "Heartbeat suppressed, anchor alarm active");
        } else if !self.store.anchor_is_set() {
            tracing::debug!("Heartbeat suppressed, anchor not set");
        } else {
            self.send(&AlertIntent::heartbeat(interval));
        }
    }

    fn send(&self, intent: &AlertIntent) {
        let message = intent.kind.render(&status_text(&self.store));
        tracing::info!(
            message = %message,
            priority = intent.delivery.priority.level(),
            "Sending alert",
        );

        if self
            .alerts
            .send(PushMessage::new(message, intent.delivery.clone()))
            .is_err()
        {
            tracing::warn!("Alert dispatcher gone, alert dropped");
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
