//! WebSocket message processing loop.
//!
//! Reads frames from a Signal K connection, parses text frames into
//! [`ServerMessage`]s and forwards every delta to the engine channel.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::SignalKConnection;
use crate::messages::{parse_message, Delta, ServerMessage};

/// Why a session stopped reading frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Cancellation was requested; the subscription was released.
    Cancelled,
    /// The server closed the socket or the transport failed.
    Disconnected,
    /// Nobody is listening for deltas anymore.
    ConsumerGone,
}

/// Process frames until the connection drops or `cancel` fires.
///
/// On cancellation the subscription is withdrawn and the socket closed
/// before returning.
pub async fn process_messages(
    conn: &mut SignalKConnection,
    deltas: &mpsc::Sender<Delta>,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if let Err(e) = conn.unsubscribe().await {
                    tracing::warn!(error = %e, "Failed to release Signal K subscription");
                }
                return SessionEnd::Cancelled;
            }
            frame = conn.ws_stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                if !handle_text_message(&text, deltas).await {
                    return SessionEnd::ConsumerGone;
                }
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                // Handled automatically by tungstenite.
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Signal K closed WebSocket");
                return SessionEnd::Disconnected;
            }
            Some(Ok(Message::Binary(_) | Message::Frame(_))) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "Signal K subscription error");
                return SessionEnd::Disconnected;
            }
            None => {
                tracing::info!("Signal K stream exhausted");
                return SessionEnd::Disconnected;
            }
        }
    }
}

/// Parse one text frame and forward it. Returns `false` once the receiving
/// side of `deltas` is gone.
async fn handle_text_message(text: &str, deltas: &mpsc::Sender<Delta>) -> bool {
    match parse_message(text) {
        Ok(ServerMessage::Delta(delta)) => {
            tracing::trace!(updates = delta.updates.len(), "Received delta");
            deltas.send(delta).await.is_ok()
        }
        Ok(ServerMessage::Hello(hello)) => {
            tracing::info!(
                server = hello.name.as_deref().unwrap_or("unknown"),
                version = %hello.version,
                self_context = hello.self_context.as_deref().unwrap_or("unknown"),
                "Signal K hello",
            );
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, raw_message = %text, "Failed to parse Signal K message");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delta_is_forwarded() {
        let (tx, mut rx) = mpsc::channel(4);
        let text = r#"{"updates":[{"values":[{"path":"navigation.position","value":{"latitude":1.0,"longitude":2.0}}]}]}"#;

        assert!(handle_text_message(text, &tx).await);
        let delta = rx.recv().await.unwrap();
        assert_eq!(delta.values().next().unwrap().path, "navigation.position");
    }

    #[tokio::test]
    async fn hello_and_garbage_are_not_forwarded() {
        let (tx, mut rx) = mpsc::channel(4);

        assert!(handle_text_message(r#"{"name":"signalk-server","version":"2.8.0"}"#, &tx).await);
        assert!(handle_text_message("{{{", &tx).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_consumer_is_reported() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        let text = r#"{"updates":[]}"#;
        assert!(!handle_text_message(text, &tx).await);
    }
}
