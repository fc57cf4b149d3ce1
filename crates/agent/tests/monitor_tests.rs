//! End-to-end: a fake Signal K stream feeds the monitor, a fake Pushover
//! endpoint records what it sends.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Form, Json, Router};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use anchorwatch_agent::config::{AgentConfig, MonitorSettings};
use anchorwatch_agent::monitor::Monitor;
use anchorwatch_events::PushoverConfig;

const HELLO: &str = r#"{"name":"signalk-server","version":"2.8.0","self":"vessels.urn:mrn:imo:mmsi:230099999","roles":["master","main"]}"#;

type Forms = mpsc::UnboundedSender<HashMap<String, String>>;

async fn record(
    State(forms): State<Forms>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let _ = forms.send(form);
    Json(json!({"status": 1, "request": "5042853c-402d-4a18-abcb-168734a801de"}))
}

/// Fake Pushover endpoint; returns its URL and the stream of received forms.
async fn pushover() -> (String, mpsc::UnboundedReceiver<HashMap<String, String>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let router = Router::new()
        .route("/1/messages.json", post(record))
        .with_state(tx);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}/1/messages.json"), rx)
}

fn delta(values: serde_json::Value) -> Message {
    Message::Text(
        json!({
            "context": "vessels.urn:mrn:imo:mmsi:230099999",
            "updates": [{"$source": "anchoralarm", "values": values}],
        })
        .to_string(),
    )
}

fn config(signalk_ws_url: String, api_url: String) -> AgentConfig {
    AgentConfig {
        signalk_ws_url,
        signalk_token: None,
        pushover: PushoverConfig {
            api_url,
            app_token: "app-token".to_string(),
            user_key: "user-key".to_string(),
        },
        settings: MonitorSettings::default(),
    }
}

#[tokio::test]
async fn anchor_alarm_reaches_pushover_and_stop_unsubscribes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_url = format!(
        "ws://{}/signalk/v1/stream?subscribe=none",
        listener.local_addr().unwrap()
    );
    let (api_url, mut forms) = pushover().await;
    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<serde_json::Value>();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(HELLO.to_string())).await.unwrap();

        let mut sent_deltas = false;
        while let Some(Ok(frame)) = ws.next().await {
            let Message::Text(text) = frame else { continue };
            let frame: serde_json::Value = serde_json::from_str(&text).unwrap();
            let is_subscribe = frame.get("subscribe").is_some();
            let _ = frames_tx.send(frame);

            if is_subscribe && !sent_deltas {
                sent_deltas = true;
                ws.send(delta(json!([
                    {"path": "navigation.anchor.maxRadius", "value": 40},
                    {"path": "navigation.anchor.currentRadius", "value": 41.6},
                    {"path": "navigation.anchor.bearingTrue", "value": 0.7854},
                ])))
                .await
                .unwrap();
                ws.send(delta(json!([
                    {"path": "notifications.navigation.anchor",
                     "value": {"state": "emergency", "method": ["visual", "sound"], "message": "Anchor dragging"}},
                ])))
                .await
                .unwrap();
            }
        }
    });

    let mut monitor = Monitor::start(config(ws_url, api_url)).unwrap();
    assert!(monitor.is_running());

    let subscribe = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscribe["context"], "vessels.self");

    let form = tokio::time::timeout(Duration::from_secs(5), forms.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(form["message"], "ANCHOR ALARM 42/40 m @ 45 deg");
    assert_eq!(form["priority"], "2");
    assert_eq!(form["retry"], "30");
    assert_eq!(form["expire"], "600");
    assert_eq!(form["title"], "Anchor Alarm");
    assert!(!form.contains_key("ttl"));

    monitor.stop().await;
    assert!(!monitor.is_running());
    assert!(!monitor.is_subscribed());

    let unsubscribe = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unsubscribe["context"], "*");
    assert_eq!(unsubscribe["unsubscribe"][0]["path"], "*");

    // Second stop is a no-op.
    monitor.stop().await;

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn stop_without_signalk_server_is_clean_and_idempotent() {
    let (api_url, mut forms) = pushover().await;
    let mut monitor = Monitor::start(config(
        "ws://127.0.0.1:1/signalk/v1/stream?subscribe=none".to_string(),
        api_url,
    ))
    .unwrap();

    monitor.stop().await;
    monitor.stop().await;

    assert!(!monitor.is_running());
    assert!(forms.try_recv().is_err());
}
