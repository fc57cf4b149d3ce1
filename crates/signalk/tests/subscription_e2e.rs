//! End-to-end tests for the Signal K subscription task against a local
//! WebSocket server standing in for a Signal K stream endpoint.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use anchorwatch_signalk::{SignalKClient, TelemetrySubscription};

const HELLO: &str = r#"{"name":"signalk-server","version":"2.8.0","self":"vessels.urn:mrn:imo:mmsi:230099999","roles":["master","main"]}"#;
const DELTA: &str = r#"{"context":"vessels.urn:mrn:imo:mmsi:230099999","updates":[{"$source":"anchoralarm","values":[{"path":"navigation.anchor.maxRadius","value":45}]}]}"#;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!(
        "ws://{}/signalk/v1/stream?subscribe=none",
        listener.local_addr().unwrap()
    );
    (listener, url)
}

/// Reads the next text frame the client sent, as JSON.
async fn next_json<S>(ws: &mut S) -> serde_json::Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn subscribes_forwards_deltas_and_unsubscribes_on_stop() {
    let (listener, url) = bind().await;
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<serde_json::Value>();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(Message::Text(HELLO.to_string())).await.unwrap();
        let subscribe = next_json(&mut ws).await;
        seen_tx.send(subscribe).unwrap();

        ws.send(Message::Text(DELTA.to_string())).await.unwrap();

        let unsubscribe = next_json(&mut ws).await;
        seen_tx.send(unsubscribe).unwrap();
    });

    let (delta_tx, mut delta_rx) = mpsc::channel(8);
    let mut subscription = TelemetrySubscription::start(
        SignalKClient::new(url, None),
        delta_tx,
        CancellationToken::new(),
    );

    let subscribe = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscribe["context"], "vessels.self");
    assert_eq!(subscribe["subscribe"].as_array().unwrap().len(), 4);

    let delta = tokio::time::timeout(Duration::from_secs(5), delta_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let value = delta.values().next().unwrap();
    assert_eq!(value.path, "navigation.anchor.maxRadius");
    assert_eq!(value.value, 45);

    subscription.unsubscribe().await;
    assert!(!subscription.is_running());

    let unsubscribe = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unsubscribe["unsubscribe"][0]["path"], "*");

    server.await.unwrap();
}

#[tokio::test]
async fn unsubscribe_is_idempotent_while_server_is_down() {
    let mut subscription = TelemetrySubscription::start(
        SignalKClient::new("ws://127.0.0.1:1/signalk/v1/stream", None),
        mpsc::channel(1).0,
        CancellationToken::new(),
    );

    subscription.unsubscribe().await;
    subscription.unsubscribe().await;
    assert!(!subscription.is_running());
}

#[tokio::test]
async fn parent_token_cancels_subscription() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // Drain until the client goes away.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let parent = CancellationToken::new();
    let (delta_tx, _delta_rx) = mpsc::channel(8);
    let mut subscription =
        TelemetrySubscription::start(SignalKClient::new(url, None), delta_tx, parent.child_token());

    tokio::time::sleep(Duration::from_millis(100)).await;
    parent.cancel();
    subscription.unsubscribe().await;

    assert!(!subscription.is_running());
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
}
