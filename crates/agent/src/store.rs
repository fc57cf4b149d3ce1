//! Last-value store for telemetry paths.
//!
//! [`ValueStore`] keeps exactly one [`ValueRecord`] per path: the most recent
//! value and the instant it arrived. Records are overwritten, never removed.
//! A stored JSON `null` means "explicitly cleared" and is distinct from a
//! path that has never been seen.

use std::collections::HashMap;
use std::time::Duration;

use anchorwatch_core::paths::PATH_ANCHOR_MAX_RADIUS;
use serde_json::Value;
use tokio::time::Instant;

/// Latest value of one path.
#[derive(Debug, Clone)]
pub struct ValueRecord {
    pub value: Value,
    pub timestamp: Instant,
}

/// Result of reading a path as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericReading {
    Number(f64),
    /// The path was explicitly cleared.
    Null,
    /// The stored value could not be coerced; passed through untouched.
    Raw(Value),
}

impl NumericReading {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Null | Self::Raw(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ValueStore {
    records: HashMap<String, ValueRecord>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `path`, stamped with the current instant.
    pub fn set(&mut self, path: &str, value: Value) {
        self.records.insert(
            path.to_string(),
            ValueRecord {
                value,
                timestamp: Instant::now(),
            },
        );
    }

    /// Latest value of `path`.
    ///
    /// Returns `None` if the path was never set, or if `max_age` is given
    /// and the value is strictly older than it. A stored `null` is always
    /// returned, whatever its age.
    pub fn get(&self, path: &str, max_age: Option<Duration>) -> Option<&Value> {
        let record = self.records.get(path)?;
        if record.value.is_null() {
            return Some(&record.value);
        }
        if let Some(max_age) = max_age {
            if Instant::now().saturating_duration_since(record.timestamp) > max_age {
                return None;
            }
        }
        Some(&record.value)
    }

    /// Like [`get`](Self::get), coerced to a number.
    pub fn get_as_number(&self, path: &str, max_age: Option<Duration>) -> Option<NumericReading> {
        self.get(path, max_age).map(coerce)
    }

    /// Whether an anchor is currently set (max radius present and not null).
    pub fn anchor_is_set(&self) -> bool {
        self.get(PATH_ANCHOR_MAX_RADIUS, None)
            .is_some_and(|value| !value.is_null())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Numbers, numeric strings and booleans become numbers; anything else is
/// handed back as-is.
fn coerce(value: &Value) -> NumericReading {
    let number = match value {
        Value::Null => return NumericReading::Null,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Array(_) | Value::Object(_) => None,
    };

    match number {
        Some(n) if !n.is_nan() => NumericReading::Number(n),
        _ => NumericReading::Raw(value.clone()),
    }
}
