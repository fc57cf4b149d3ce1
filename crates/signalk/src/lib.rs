//! Signal K WebSocket telemetry subscription.
//!
//! Provides typed delta parsing, the WebSocket client, reconnection with
//! exponential backoff, and the long-lived subscription task that feeds
//! deltas to the monitor engine.

pub mod client;
pub mod messages;
pub mod processor;
pub mod reconnect;
pub mod subscription;

pub use client::{SignalKClient, SignalKClientError, SignalKConnection};
pub use messages::{Delta, PathValue, Update};
pub use subscription::TelemetrySubscription;
