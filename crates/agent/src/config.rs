//! Agent configuration loaded from environment variables.
//!
//! | Variable                          | Required | Default                                                |
//! |-----------------------------------|----------|--------------------------------------------------------|
//! | `SIGNALK_WS_URL`                  | no       | `ws://localhost:3000/signalk/v1/stream?subscribe=none` |
//! | `SIGNALK_TOKEN`                   | no       | --                                                     |
//! | `PUSHOVER_USER`                   | yes      | --                                                     |
//! | `PUSHOVER_TOKEN`                  | yes      | --                                                     |
//! | `PUSHOVER_API_URL`                | no       | `https://api.pushover.net/1/messages.json`             |
//! | `ANCHOR_OK_UPDATE_INTERVAL_SECS`  | no       | `0` (disabled)                                         |
//! | `NO_POSITION_ALERT_INTERVAL_SECS` | no       | `60` (`0` disables)                                    |

use std::time::Duration;

use anchorwatch_events::delivery::pushover;
use anchorwatch_events::PushoverConfig;

/// Signal K stream endpoint used when `SIGNALK_WS_URL` is not set.
pub const DEFAULT_SIGNALK_WS_URL: &str = "ws://localhost:3000/signalk/v1/stream?subscribe=none";

const DEFAULT_OK_UPDATE_INTERVAL_SECS: u64 = 0;
const DEFAULT_NO_POSITION_ALERT_INTERVAL_SECS: u64 = 60;

/// Errors raised while reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error(transparent)]
    Pushover(#[from] pushover::ConfigError),
}

/// Engine timing settings. Fixed for the lifetime of a running engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Periodic "OK" interval; `None` disables the heartbeat.
    pub heartbeat_interval: Option<Duration>,
    /// Silence after which "NO GPS" fires; `None` disables the watchdog.
    pub watchdog_interval: Option<Duration>,
}

impl MonitorSettings {
    /// Build from raw seconds where `0` means disabled.
    pub fn from_secs(heartbeat_secs: u64, watchdog_secs: u64) -> Self {
        let enabled = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        Self {
            heartbeat_interval: enabled(heartbeat_secs),
            watchdog_interval: enabled(watchdog_secs),
        }
    }
}

/// Everything the agent needs to start a monitor.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub signalk_ws_url: String,
    pub signalk_token: Option<String>,
    pub pushover: PushoverConfig,
    pub settings: MonitorSettings,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let heartbeat_secs = parse_secs(
            "ANCHOR_OK_UPDATE_INTERVAL_SECS",
            std::env::var("ANCHOR_OK_UPDATE_INTERVAL_SECS").ok(),
            DEFAULT_OK_UPDATE_INTERVAL_SECS,
        )?;
        let watchdog_secs = parse_secs(
            "NO_POSITION_ALERT_INTERVAL_SECS",
            std::env::var("NO_POSITION_ALERT_INTERVAL_SECS").ok(),
            DEFAULT_NO_POSITION_ALERT_INTERVAL_SECS,
        )?;

        Ok(Self {
            signalk_ws_url: std::env::var("SIGNALK_WS_URL")
                .unwrap_or_else(|_| DEFAULT_SIGNALK_WS_URL.to_string()),
            signalk_token: std::env::var("SIGNALK_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            pushover: PushoverConfig::from_env()?,
            settings: MonitorSettings::from_secs(heartbeat_secs, watchdog_secs),
        })
    }
}

/// Parse an optional seconds value, falling back to `default` when unset.
fn parse_secs(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn zero_disables() {
        let settings = MonitorSettings::from_secs(0, 0);
        assert_eq!(settings.heartbeat_interval, None);
        assert_eq!(settings.watchdog_interval, None);
    }

    #[test]
    fn non_zero_enables() {
        let settings = MonitorSettings::from_secs(600, 60);
        assert_eq!(settings.heartbeat_interval, Some(Duration::from_secs(600)));
        assert_eq!(settings.watchdog_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn parse_secs_defaults_when_unset() {
        assert_eq!(parse_secs("X", None, 60).unwrap(), 60);
    }

    #[test]
    fn parse_secs_reads_value() {
        assert_eq!(parse_secs("X", Some(" 300 ".to_string()), 60).unwrap(), 300);
    }

    #[test]
    fn parse_secs_rejects_garbage() {
        let err = parse_secs("NO_POSITION_ALERT_INTERVAL_SECS", Some("soon".to_string()), 60)
            .unwrap_err();
        assert_matches!(&err, ConfigError::Invalid { name: "NO_POSITION_ALERT_INTERVAL_SECS", .. });
        assert_eq!(
            err.to_string(),
            r#"NO_POSITION_ALERT_INTERVAL_SECS must be a whole number of seconds, got "soon""#
        );
    }
}
