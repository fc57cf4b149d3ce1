//! Pushover delivery.
//!
//! [`PushoverDelivery`] sends a [`PushMessage`] to the Pushover messages API
//! as a form-encoded HTTP POST. There is no local retry: re-alerting of
//! unacknowledged alarms is requested from Pushover itself through the
//! `retry`/`expire` fields.

use std::time::Duration;

use serde::Deserialize;

use crate::message::PushMessage;

/// Pushover messages endpoint.
pub const DEFAULT_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Title shown above every push.
pub const TITLE: &str = "Anchor Alarm";

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for Pushover delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushoverError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Pushover answered with a non-2xx status code.
    #[error("Pushover returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Error type for missing or invalid Pushover settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
}

// ---------------------------------------------------------------------------
// PushoverConfig
// ---------------------------------------------------------------------------

/// Credentials and endpoint for the Pushover API.
#[derive(Debug, Clone)]
pub struct PushoverConfig {
    /// Messages endpoint (overridable for testing).
    pub api_url: String,
    /// Application API token.
    pub app_token: String,
    /// Operator user or group key.
    pub user_key: String,
}

impl PushoverConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable           | Required | Default                                    |
    /// |--------------------|----------|--------------------------------------------|
    /// | `PUSHOVER_USER`    | yes      | --                                         |
    /// | `PUSHOVER_TOKEN`   | yes      | --                                         |
    /// | `PUSHOVER_API_URL` | no       | `https://api.pushover.net/1/messages.json` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let user_key =
            std::env::var("PUSHOVER_USER").map_err(|_| ConfigError::Missing("PUSHOVER_USER"))?;
        let app_token =
            std::env::var("PUSHOVER_TOKEN").map_err(|_| ConfigError::Missing("PUSHOVER_TOKEN"))?;
        let api_url =
            std::env::var("PUSHOVER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            api_url,
            app_token,
            user_key,
        })
    }
}

// ---------------------------------------------------------------------------
// PushoverDelivery
// ---------------------------------------------------------------------------

/// Pushover's acknowledgment of an accepted message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushoverReceipt {
    #[serde(default)]
    pub status: i32,
    /// Request id assigned by Pushover.
    #[serde(default)]
    pub request: String,
    /// Only present for emergency-priority messages.
    pub receipt: Option<String>,
}

/// Delivers monitor alerts to Pushover.
pub struct PushoverDelivery {
    client: reqwest::Client,
    config: PushoverConfig,
}

impl PushoverDelivery {
    /// Create a delivery service with a pre-configured HTTP client.
    pub fn new(config: PushoverConfig) -> Result<Self, PushoverError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Form fields for one message, including credentials.
    ///
    /// `priority` is left out for normal messages; durations are sent in
    /// whole seconds.
    pub fn form(&self, msg: &PushMessage) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("token", self.config.app_token.clone()),
            ("user", self.config.user_key.clone()),
            ("title", TITLE.to_string()),
            ("message", msg.message.clone()),
        ];

        let delivery = &msg.delivery;
        if delivery.priority.level() != 0 {
            form.push(("priority", delivery.priority.level().to_string()));
        }
        if let Some(retry) = delivery.retry {
            form.push(("retry", retry.as_secs().to_string()));
        }
        if let Some(expire) = delivery.expire {
            form.push(("expire", expire.as_secs().to_string()));
        }
        if let Some(ttl) = delivery.ttl {
            form.push(("ttl", ttl.as_secs().to_string()));
        }
        form
    }

    /// Send one message. A single attempt; failures are returned, not retried.
    pub async fn deliver(&self, msg: &PushMessage) -> Result<PushoverReceipt, PushoverError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .form(&self.form(msg))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushoverError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<PushoverReceipt>().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
