//! WebSocket client for a Signal K server's stream endpoint.
//!
//! [`SignalKClient`] holds the connection configuration. Call
//! [`SignalKClient::connect`] to establish a live [`SignalKConnection`],
//! then [`SignalKConnection::subscribe`] to request the monitored paths.

use futures::SinkExt;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};

use crate::messages::{SubscribeRequest, UnsubscribeRequest};

/// Raw stream type of an established connection.
pub type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Configuration handle for a Signal K server.
#[derive(Debug, Clone)]
pub struct SignalKClient {
    ws_url: String,
    token: Option<String>,
}

/// A live WebSocket connection to a Signal K server.
pub struct SignalKConnection {
    pub ws_stream: WsStream,
}

impl SignalKClient {
    /// * `ws_url` - stream endpoint, e.g.
    ///   `ws://host:3000/signalk/v1/stream?subscribe=none`.
    /// * `token`  - optional access token sent as a bearer header.
    pub fn new(ws_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            token,
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the stream endpoint.
    pub async fn connect(&self) -> Result<SignalKConnection, SignalKClientError> {
        let mut request = self
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| SignalKClientError::Request(e.to_string()))?;

        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SignalKClientError::Request(e.to_string()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws_stream, _response) = connect_async(request).await.map_err(|e| {
            SignalKClientError::Connection(format!(
                "Failed to connect to Signal K at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(url = %self.ws_url, "Connected to Signal K");

        Ok(SignalKConnection { ws_stream })
    }
}

impl SignalKConnection {
    /// Request deltas for the monitored paths on the local vessel.
    pub async fn subscribe(&mut self) -> Result<(), SignalKClientError> {
        let request = SubscribeRequest::monitor_paths();
        self.send_json(&request).await?;
        tracing::debug!(
            context = %request.context,
            paths = request.subscribe.len(),
            "Sent Signal K subscription",
        );
        Ok(())
    }

    /// Release every subscription and close the socket.
    pub async fn unsubscribe(&mut self) -> Result<(), SignalKClientError> {
        self.send_json(&UnsubscribeRequest::all()).await?;
        self.ws_stream
            .close(None)
            .await
            .map_err(|e| SignalKClientError::Send(e.to_string()))
    }

    async fn send_json<T: serde::Serialize>(&mut self, body: &T) -> Result<(), SignalKClientError> {
        let json = serde_json::to_string(body)?;
        self.ws_stream
            .send(Message::Text(json))
            .await
            .map_err(|e| SignalKClientError::Send(e.to_string()))
    }
}

/// Errors that can occur when working with the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum SignalKClientError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The URL or auth header could not be turned into a handshake request.
    #[error("Invalid request: {0}")]
    Request(String),

    /// Writing a frame to an established connection failed.
    #[error("Send error: {0}")]
    Send(String),

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn invalid_url_is_request_error() {
        let client = SignalKClient::new("not a url", None);
        let err = client.connect().await.err().unwrap();
        assert_matches!(err, SignalKClientError::Request(_));
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        let client = SignalKClient::new("ws://127.0.0.1:1/signalk/v1/stream", None);
        let err = client.connect().await.err().unwrap();
        assert_matches!(err, SignalKClientError::Connection(msg) => {
            assert!(msg.contains("127.0.0.1:1"));
        });
    }

    #[test]
    fn keeps_url() {
        let client = SignalKClient::new("ws://boat.local:3000/signalk/v1/stream", None);
        assert_eq!(client.ws_url(), "ws://boat.local:3000/signalk/v1/stream");
    }
}
