//! The composed alert handed from the engine to the dispatcher.

use anchorwatch_core::alert::DeliveryParams;
use serde::Serialize;

/// A fully rendered alert plus its channel-native delivery fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub message: String,
    pub delivery: DeliveryParams,
}

impl PushMessage {
    pub fn new(message: impl Into<String>, delivery: DeliveryParams) -> Self {
        Self {
            message: message.into(),
            delivery,
        }
    }

    /// Loggable view of what is about to be sent, without credentials.
    pub fn payload(&self) -> Payload<'_> {
        Payload {
            message: &self.message,
            priority: self.delivery.priority.level(),
            retry: self.delivery.retry.map(|d| d.as_secs()),
            expire: self.delivery.expire.map(|d| d.as_secs()),
            ttl: self.delivery.ttl.map(|d| d.as_secs()),
        }
    }
}

/// Serializable payload of a [`PushMessage`], durations in whole seconds.
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub message: &'a str,
    pub priority: i8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl std::fmt::Display for Payload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anchorwatch_core::alert::Priority;

    use super::*;

    #[test]
    fn payload_renders_seconds_and_skips_absent_fields() {
        let msg = PushMessage::new("OK 3/40 m @ 90 deg", DeliveryParams::info(Duration::from_secs(60)));
        assert_eq!(
            msg.payload().to_string(),
            r#"{"message":"OK 3/40 m @ 90 deg","priority":0,"ttl":60}"#
        );
    }

    #[test]
    fn alarm_payload_has_retry_and_expire() {
        let msg = PushMessage::new("NO GPS", DeliveryParams::alarm(Priority::Emergency));
        let json = serde_json::to_value(msg.payload()).unwrap();
        assert_eq!(json["priority"], 2);
        assert_eq!(json["retry"], 30);
        assert_eq!(json["expire"], 600);
        assert!(json.get("ttl").is_none());
    }
}
