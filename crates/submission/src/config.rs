//! Submission settings read from the environment.

use std::time::Duration;

use thiserror::Error;

pub const SEND_TIMEOUT_VAR: &str = "SUMKI_SEND_TIMEOUT_SECS";
pub const RELAY_URL_VAR: &str = "SUMKI_RELAY_URL";
pub const SELLER_CHAT_ID_VAR: &str = "SUMKI_SELLER_CHAT_ID";
pub const RELAY_MAX_RETRIES_VAR: &str = "SUMKI_RELAY_MAX_RETRIES";
pub const RELAY_RETRY_DELAY_VAR: &str = "SUMKI_RELAY_RETRY_DELAY_MS";
pub const RELAY_TIMEOUT_VAR: &str = "SUMKI_RELAY_TIMEOUT_SECS";

const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{var}` is not a valid {expected}: {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("`{0}` must be set when `SUMKI_RELAY_URL` is set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionConfig {
    /// Hard limit on one bridge call. `None` disables it. With a relay
    /// configured it is never shorter than [`RelayConfig::delivery_budget`].
    pub send_timeout: Option<Duration>,
    pub relay: Option<RelayConfig>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            send_timeout: Some(Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS)),
            relay: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub endpoint: String,
    pub seller_chat_id: String,
    /// Extra attempts after the first, for network errors and 5xx replies.
    pub max_retries: u32,
    /// Initial backoff; doubled after every retry.
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl RelayConfig {
    pub fn new(endpoint: impl Into<String>, seller_chat_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            seller_chat_id: seller_chat_id.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_RELAY_TIMEOUT_SECS),
        }
    }

    /// Worst-case time to deliver a single-chunk message: every attempt of
    /// plain, MarkdownV2 and basic notice timing out, plus all backoff sleeps.
    pub fn delivery_budget(&self) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        let backoff_steps = 2u32.saturating_pow(self.max_retries) - 1;
        let per_post = self
            .request_timeout
            .saturating_mul(attempts)
            .saturating_add(self.retry_delay.saturating_mul(backoff_steps));
        per_post.saturating_mul(3)
    }
}

impl SubmissionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset and blank variables take their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let explicit_timeout = parse_u64(SEND_TIMEOUT_VAR, get(SEND_TIMEOUT_VAR))?;
        let mut send_timeout = match explicit_timeout {
            None => Some(Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS)),
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let relay = match get(RELAY_URL_VAR) {
            None => None,
            Some(endpoint) => {
                let seller_chat_id =
                    get(SELLER_CHAT_ID_VAR).ok_or(ConfigError::Missing(SELLER_CHAT_ID_VAR))?;
                let mut relay = RelayConfig::new(endpoint, seller_chat_id);
                if let Some(n) = get(RELAY_MAX_RETRIES_VAR) {
                    relay.max_retries = n.parse().map_err(|_| ConfigError::Invalid {
                        var: RELAY_MAX_RETRIES_VAR,
                        expected: "retry count",
                        value: n.clone(),
                    })?;
                }
                if let Some(ms) = parse_u64(RELAY_RETRY_DELAY_VAR, get(RELAY_RETRY_DELAY_VAR))? {
                    relay.retry_delay = Duration::from_millis(ms);
                }
                if let Some(secs) = parse_u64(RELAY_TIMEOUT_VAR, get(RELAY_TIMEOUT_VAR))? {
                    relay.request_timeout = Duration::from_secs(secs);
                }
                Some(relay)
            }
        };

        if let (Some(limit), Some(relay)) = (send_timeout, relay.as_ref()) {
            let budget = relay.delivery_budget();
            if limit < budget {
                if explicit_timeout.is_some() {
                    tracing::warn!(
                        configured = ?limit,
                        ?budget,
                        "send timeout is shorter than the relay's retry budget, raising it"
                    );
                }
                send_timeout = Some(budget);
            }
        }

        Ok(Self {
            send_timeout,
            relay,
        })
    }
}

fn parse_u64(var: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|v| {
        v.parse().map_err(|_| ConfigError::Invalid {
            var,
            expected: "non-negative integer",
            value: v.clone(),
        })
    })
    .transpose()
}
