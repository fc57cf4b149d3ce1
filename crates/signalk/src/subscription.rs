//! Long-lived telemetry subscription task.
//!
//! [`TelemetrySubscription`] owns the connect -> subscribe -> process ->
//! reconnect loop for one Signal K server and forwards every delta to the
//! engine. Transport failures are logged and retried; they never end the
//! task. Only cancellation (or the engine going away) does.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::SignalKClient;
use crate::messages::Delta;
use crate::processor::{process_messages, SessionEnd};
use crate::reconnect::{reconnect_loop, ReconnectConfig};

/// Upper bound on how long [`TelemetrySubscription::unsubscribe`] waits for
/// the task to release the feed.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the running subscription task.
pub struct TelemetrySubscription {
    cancel: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl TelemetrySubscription {
    /// Spawn the subscription task.
    ///
    /// `cancel` should be a child of the monitor's master token so that a
    /// monitor shutdown also withdraws the subscription.
    pub fn start(
        client: SignalKClient,
        deltas: mpsc::Sender<Delta>,
        cancel: CancellationToken,
    ) -> Self {
        let task_cancel = cancel.clone();
        let task_handle = tokio::spawn(async move {
            tracing::info!(url = %client.ws_url(), "Starting Signal K subscription");
            run_connection_loop(&client, &deltas, &task_cancel).await;
            tracing::info!("Signal K subscription exited");
        });

        Self {
            cancel,
            task_handle: Some(task_handle),
        }
    }

    /// Withdraw the subscription and wait for the task to exit.
    ///
    /// Safe to call more than once.
    pub async fn unsubscribe(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.task_handle.take() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Signal K subscription did not exit in time");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Core connection loop: connect -> subscribe -> process -> reconnect.
///
/// Runs until the cancellation token is triggered or the delta receiver is
/// dropped.
async fn run_connection_loop(
    client: &SignalKClient,
    deltas: &mpsc::Sender<Delta>,
    cancel: &CancellationToken,
) {
    let reconnect_config = ReconnectConfig::default();

    let mut pending = tokio::select! {
        _ = cancel.cancelled() => return,
        result = client.connect() => match result {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!(error = %e, "Connection failed, entering reconnect loop");
                None
            }
        },
    };

    loop {
        let mut conn = match pending.take() {
            Some(conn) => conn,
            None => match reconnect_loop(client, &reconnect_config, cancel).await {
                Some(conn) => conn,
                None => return, // cancelled
            },
        };

        if let Err(e) = conn.subscribe().await {
            tracing::error!(error = %e, "Failed to send Signal K subscription");
            continue;
        }

        match process_messages(&mut conn, deltas, cancel).await {
            SessionEnd::Cancelled => return,
            SessionEnd::ConsumerGone => {
                tracing::info!("Delta consumer gone, stopping subscription");
                return;
            }
            SessionEnd::Disconnected => {
                tracing::info!("Signal K connection lost, entering reconnect loop");
            }
        }
    }
}
