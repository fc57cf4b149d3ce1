//! Signal K stream message types and parser.
//!
//! The server first sends a hello frame
//! (`{"name": ..., "version": ..., "self": ..., "roles": [...]}`) and then
//! delta frames of the shape
//! `{"context": ..., "updates": [{"$source": ..., "values": [{"path", "value"}]}]}`.
//! This module deserializes both into a strongly-typed [`ServerMessage`] and
//! defines the subscribe/unsubscribe requests the client sends.

use anchorwatch_core::paths::{WatchedPath, CONTEXT_SELF, SUBSCRIPTION_PATTERNS};
use serde::{Deserialize, Serialize};

/// Any frame the server may send on the stream endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Delta(Delta),
    Hello(Hello),
}

/// Greeting sent once after the connection is established.
#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub name: Option<String>,
    pub version: String,
    /// Context of the local vessel, e.g. `vessels.urn:mrn:imo:mmsi:123456789`.
    #[serde(rename = "self")]
    pub self_context: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A telemetry update envelope carrying one or more path/value pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    pub context: Option<String>,
    pub updates: Vec<Update>,
}

impl Delta {
    /// All path/value pairs in delivery order.
    pub fn values(&self) -> impl Iterator<Item = &PathValue> {
        self.updates.iter().flat_map(|u| u.values.iter())
    }
}

/// One update within a delta, usually from a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "$source", skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub values: Vec<PathValue>,
}

/// A single path/value observation.
///
/// A missing `value` deserializes to `null`, which the monitor treats as
/// "explicitly cleared".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathValue {
    pub path: String,
    #[serde(default)]
    pub value: serde_json::Value,
    /// Loosely structured metadata carried next to the value.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PathValue {
    pub fn new(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            value,
            extra: serde_json::Map::new(),
        }
    }

    /// The signal family this observation belongs to.
    pub fn watched(&self) -> WatchedPath {
        WatchedPath::parse(&self.path)
    }

    /// Typed view of a `navigation.position` value.
    pub fn position(&self) -> Option<Position> {
        serde_json::from_value(self.value.clone()).ok()
    }
}

/// Payload of `navigation.position`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// Subscription request sent right after connecting.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    pub context: String,
    pub subscribe: Vec<PathSubscription>,
}

/// One subscribed path pattern.
#[derive(Debug, Clone, Serialize)]
pub struct PathSubscription {
    pub path: String,
}

impl SubscribeRequest {
    /// The monitor's fixed subscription on the local vessel.
    pub fn monitor_paths() -> Self {
        Self {
            context: CONTEXT_SELF.to_string(),
            subscribe: SUBSCRIPTION_PATTERNS
                .iter()
                .map(|path| PathSubscription {
                    path: (*path).to_string(),
                })
                .collect(),
        }
    }
}

/// Request releasing every subscription on the connection.
#[derive(Debug, Clone, Serialize)]
pub struct UnsubscribeRequest {
    pub context: String,
    pub unsubscribe: Vec<PathSubscription>,
}

impl UnsubscribeRequest {
    pub fn all() -> Self {
        Self {
            context: "*".to_string(),
            unsubscribe: vec![PathSubscription {
                path: "*".to_string(),
            }],
        }
    }
}

/// Parse a Signal K text frame.
///
/// Returns `Err` for malformed JSON or frames that are neither a hello nor a
/// delta. Callers should log and continue.
pub fn parse_message(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}
