//! Monitor lifecycle.
//!
//! [`Monitor::start`] wires the three long-lived tasks together:
//!
//! ```text
//! Signal K ──deltas──▶ Engine ──alerts──▶ AlertDispatcher ──▶ Pushover
//! ```
//!
//! All three hang off one master [`CancellationToken`]; [`Monitor::stop`]
//! cancels it and waits for every task to exit.

use std::time::Duration;

use anchorwatch_events::{AlertDispatcher, PushoverDelivery, PushoverError};
use anchorwatch_signalk::{SignalKClient, TelemetrySubscription};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;
use crate::engine::Engine;

/// Deltas buffered between the subscription and the engine.
const DELTA_CHANNEL_CAPACITY: usize = 256;

/// How long `stop` waits for each task before giving up on it.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Push delivery setup failed: {0}")]
    Delivery(#[from] PushoverError),
}

/// A running monitor.
pub struct Monitor {
    /// Master cancellation token; every task holds a child of it.
    cancel: CancellationToken,
    subscription: TelemetrySubscription,
    engine: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Spawn the subscription, engine and dispatcher tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: AgentConfig) -> Result<Self, MonitorError> {
        let delivery = PushoverDelivery::new(config.pushover)?;
        let cancel = CancellationToken::new();

        let (delta_tx, delta_rx) = mpsc::channel(DELTA_CHANNEL_CAPACITY);
        let (alert_tx, alert_rx) = mpsc::unbounded_channel();

        let dispatcher = AlertDispatcher::new(delivery);
        let dispatcher = tokio::spawn(dispatcher.run(alert_rx, cancel.child_token()));

        let engine = Engine::new(config.settings, alert_tx);
        let engine = tokio::spawn(engine.run(delta_rx, cancel.child_token()));

        let client = SignalKClient::new(config.signalk_ws_url, config.signalk_token);
        let subscription = TelemetrySubscription::start(client, delta_tx, cancel.child_token());

        tracing::info!("Anchor monitor started");

        Ok(Self {
            cancel,
            subscription,
            engine: Some(engine),
            dispatcher: Some(dispatcher),
        })
    }

    /// Stop every task and wait for them to exit.
    ///
    /// Once this returns no further alert is produced. Safe to call more
    /// than once.
    pub async fn stop(&mut self) {
        if self.engine.is_none() && self.dispatcher.is_none() {
            return;
        }

        tracing::info!("Stopping anchor monitor");
        self.cancel.cancel();

        self.subscription.unsubscribe().await;
        let tasks = [
            ("engine", self.engine.take()),
            ("dispatcher", self.dispatcher.take()),
        ];
        for (name, handle) in tasks {
            if let Some(handle) = handle {
                join_task(name, handle, TASK_SHUTDOWN_TIMEOUT).await;
            }
        }

        tracing::info!("Anchor monitor stopped");
    }

    /// `true` while the engine task is alive.
    pub fn is_running(&self) -> bool {
        self.engine
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// `true` while the Signal K subscription task is alive.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_running()
    }
}

/// Wait for `handle`, aborting the task if it outlives `timeout`.
async fn join_task(name: &'static str, mut handle: JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(task = name, error = %e, "Task failed"),
        Err(_) => {
            tracing::warn!(task = name, "Task did not exit in time, aborting");
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stuck_task_is_aborted_after_timeout() {
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        });

        join_task("stuck", handle, TASK_SHUTDOWN_TIMEOUT).await;

        // The aborted task drops its sender.
        assert!(alive_rx.await.is_err());
    }

    #[tokio::test]
    async fn finished_task_is_joined() {
        let (done_tx, done_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let _ = done_tx.send(());
        });

        join_task("quick", handle, TASK_SHUTDOWN_TIMEOUT).await;
        assert!(done_rx.await.is_ok());
    }
}
