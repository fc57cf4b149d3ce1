//! Signal K notification severity.
//!
//! Notification values look like `{"state": "alarm", "method": [...],
//! "message": "..."}`. Only `state` matters to the monitor. A missing value,
//! a value without a `state` field, or a non-object value all count as
//! [`NotificationState::Normal`].

/// Severity carried by a notification value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NotificationState {
    #[default]
    Normal,
    Alert,
    Warn,
    Alarm,
    Emergency,
    /// Any state string the monitor does not recognise.
    Other(String),
}

impl NotificationState {
    /// Read the state of a (possibly missing) notification value.
    pub fn of(value: Option<&serde_json::Value>) -> Self {
        value
            .and_then(|v| v.get("state"))
            .and_then(|s| s.as_str())
            .map(Self::parse)
            .unwrap_or(Self::Normal)
    }

    /// Parse a raw state string.
    pub fn parse(state: &str) -> Self {
        match state {
            "normal" => Self::Normal,
            "alert" => Self::Alert,
            "warn" => Self::Warn,
            "alarm" => Self::Alarm,
            "emergency" => Self::Emergency,
            other => Self::Other(other.to_string()),
        }
    }

    /// `true` for the two levels that page the operator.
    pub fn is_alarming(&self) -> bool {
        matches!(self, Self::Alarm | Self::Emergency)
    }
}
