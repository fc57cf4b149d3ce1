//! Fire-and-forget alert dispatcher.
//!
//! The engine pushes every [`PushMessage`] onto an unbounded channel and
//! moves on. [`AlertDispatcher`] drains that channel and spawns one delivery
//! per message, so a slow or failing push never holds up telemetry
//! processing. Outcomes are only logged.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::delivery::pushover::PushoverDelivery;
use crate::message::PushMessage;

/// Background service delivering queued alerts.
pub struct AlertDispatcher {
    delivery: Arc<PushoverDelivery>,
}

impl AlertDispatcher {
    pub fn new(delivery: PushoverDelivery) -> Self {
        Self {
            delivery: Arc::new(delivery),
        }
    }

    /// Run the dispatch loop.
    ///
    /// Exits when `cancel` fires or every sender of `alerts` is dropped.
    pub async fn run(self, mut alerts: mpsc::UnboundedReceiver<PushMessage>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Alert dispatcher cancelled");
                    break;
                }
                msg = alerts.recv() => match msg {
                    Some(msg) => {
                        self.dispatch(msg);
                    }
                    None => {
                        tracing::info!("Alert channel closed, dispatcher shutting down");
                        break;
                    }
                },
            }
        }
    }

    /// Spawn a single best-effort delivery.
    pub fn dispatch(&self, msg: PushMessage) -> tokio::task::JoinHandle<()> {
        let delivery = Arc::clone(&self.delivery);
        tokio::spawn(async move {
            match delivery.deliver(&msg).await {
                Ok(receipt) => {
                    tracing::debug!(
                        payload = %msg.payload(),
                        request = %receipt.request,
                        status = receipt.status,
                        "Push notification sent",
                    );
                }
                Err(e) => {
                    tracing::error!(
                        payload = %msg.payload(),
                        error = %e,
                        "Failed to send push notification",
                    );
                }
            }
        })
    }
}
