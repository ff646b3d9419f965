//! HTTP relay: delivers the rendered order straight to the seller chat.
//!
//! `RelayBridge` is a headless `HostBridge`. It takes the outbound payload,
//! renders the seller message and posts it through `HttpRelay`, which:
//! - Splits long messages into chunks of at most 4000 characters
//! - Retries network errors and 5xx replies with exponential backoff
//! - Falls back from plain text to MarkdownV2, then to a basic notice
//!
//! A send cut short (by the gateway's timeout, say) leaves the bridge
//! remembering how many chunks already reached the chat, so resubmitting the
//! same order picks up at the first undelivered chunk.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sumki_order::{Identity, OutboundPayload, SummaryFormatter};

use crate::bridge::{BridgeError, HostBridge};
use crate::config::RelayConfig;

/// Longest text the relay accepts in one message.
pub const MAX_MESSAGE_CHARS: usize = 4000;

const MARKDOWN_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("relay error ({0}): {1}")]
    Api(u16, String),
    #[error("relay rejected the message: {0}")]
    Rejected(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// How a message ended up being delivered. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryMode {
    Plain,
    MarkdownV2,
    BasicNotice,
}

impl DeliveryMode {
    fn parse_mode(self) -> Option<&'static str> {
        match self {
            DeliveryMode::MarkdownV2 => Some("MarkdownV2"),
            DeliveryMode::Plain | DeliveryMode::BasicNotice => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    #[serde(flatten)]
    order: &'a OutboundPayload,
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Backslash-escape every MarkdownV2 control character.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// A chunk ends after the last line break that fits when there is one;
/// otherwise it is cut at the limit, never directly after a backslash.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(2);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(i, _)| i);
        let window = &rest[..window_end];
        let mut cut = match window.rfind('\n') {
            Some(i) if i > 0 => i + 1,
            _ => window_end,
        };
        if cut > 1 && rest[..cut].ends_with('\\') {
            cut -= 1;
        }
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

/// Escaped MarkdownV2 messages for one plain chunk. Escaping can push a
/// chunk past the limit, so the escaped text is split again.
fn markdown_parts(chunk: &str) -> Vec<String> {
    split_message(&escape_markdown_v2(chunk), MAX_MESSAGE_CHARS)
}

/// Last-resort text naming the customer.
pub fn basic_notice(user: Option<&Identity>) -> String {
    match user {
        Some(user) => {
            let name = user.display_name();
            let handle = user.handle().unwrap_or("без username");
            format!("Новый заказ!\n\nОт: {name} (@{handle})\n\nПожалуйста, проверьте логи.")
        }
        None => "Новый заказ!\n\nПожалуйста, проверьте логи.".to_string(),
    }
}

/// Client for the relay endpoint.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    config: RelayConfig,
}

impl HttpRelay {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RelayError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Deliver `text` for `order`, chunk by chunk.
    ///
    /// Each chunk goes out as plain text, then escaped MarkdownV2 if the plain
    /// send fails. If both fail the remaining chunks are dropped and a basic
    /// notice is sent instead. Returns the worst mode that was needed.
    pub async fn deliver(
        &self,
        order: &OutboundPayload,
        text: &str,
    ) -> Result<DeliveryMode, RelayError> {
        self.deliver_from(order, text, 0, |_| {}).await
    }

    /// Like [`deliver`](Self::deliver), but starts after the first `skip`
    /// chunks. `on_chunk` is called with the number of chunks delivered so
    /// far each time one reaches the chat.
    pub async fn deliver_from<F>(
        &self,
        order: &OutboundPayload,
        text: &str,
        skip: usize,
        mut on_chunk: F,
    ) -> Result<DeliveryMode, RelayError>
    where
        F: FnMut(usize) + Send,
    {
        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        let total = chunks.len();
        let mut used = DeliveryMode::Plain;
        if skip > 0 {
            tracing::info!(skip, total, "resuming delivery after delivered chunks");
        }

        for (index, chunk) in chunks.iter().enumerate().skip(skip) {
            match self.deliver_chunk(order, chunk).await {
                Ok(mode) => {
                    used = used.max(mode);
                    on_chunk(index + 1);
                }
                Err(e) => {
                    tracing::error!(
                        chunk = index + 1,
                        total,
                        error = %e,
                        "formatted delivery failed, sending basic notice"
                    );
                    let notice = basic_notice(order.user.as_ref());
                    self.post(order, &notice, DeliveryMode::BasicNotice).await?;
                    tracing::warn!("basic notice delivered in place of the order text");
                    return Ok(DeliveryMode::BasicNotice);
                }
            }
        }

        tracing::info!(chunks = total, mode = ?used, "order delivered to seller chat");
        Ok(used)
    }

    async fn deliver_chunk(
        &self,
        order: &OutboundPayload,
        chunk: &str,
    ) -> Result<DeliveryMode, RelayError> {
        match self.post(order, chunk, DeliveryMode::Plain).await {
            Ok(()) => return Ok(DeliveryMode::Plain),
            Err(e) => tracing::warn!(error = %e, "plain delivery failed, trying MarkdownV2"),
        }
        for part in markdown_parts(chunk) {
            self.post(order, &part, DeliveryMode::MarkdownV2).await?;
        }
        Ok(DeliveryMode::MarkdownV2)
    }

    /// One message, with exponential backoff on network errors and 5xx.
    async fn post(
        &self,
        order: &OutboundPayload,
        text: &str,
        mode: DeliveryMode,
    ) -> Result<(), RelayError> {
        let body = RelayRequest {
            order,
            chat_id: &self.config.seller_chat_id,
            text,
            parse_mode: mode.parse_mode(),
        };
        let max_retries = self.config.max_retries;
        let mut delay = self.config.retry_delay;

        for attempt in 0..=max_retries {
            match self.client.post(&self.config.endpoint).json(&body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() {
                        let error_text = resp.text().await.unwrap_or_default();
                        if attempt < max_retries {
                            tracing::warn!(
                                "relay answered {} on attempt {}, retrying...",
                                status,
                                attempt + 1
                            );
                            tokio::time::sleep(delay).await;
                            delay *= 2;
                            continue;
                        }
                        return Err(RelayError::Api(status.as_u16(), error_text));
                    }

                    let raw = resp
                        .text()
                        .await
                        .map_err(|e| RelayError::Network(e.to_string()))?;
                    return match serde_json::from_str::<RelayResponse>(&raw) {
                        Ok(reply) if reply.ok && status.is_success() => {
                            tracing::debug!(?mode, attempt = attempt + 1, "relay accepted message");
                            Ok(())
                        }
                        Ok(reply) if !reply.ok => Err(RelayError::Rejected(
                            reply.description.unwrap_or_else(|| status.to_string()),
                        )),
                        _ if !status.is_success() => {
                            Err(RelayError::Api(status.as_u16(), raw))
                        }
                        Ok(_) => Err(RelayError::Parse(format!("unexpected reply: {raw}"))),
                        Err(e) => Err(RelayError::Parse(e.to_string())),
                    };
                }
                Err(e) => {
                    if attempt < max_retries {
                        tracing::warn!(
                            "network error on relay attempt {}: {}, retrying...",
                            attempt + 1,
                            e
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        continue;
                    }
                    return Err(RelayError::Network(e.to_string()));
                }
            }
        }

        Err(RelayError::Network("max retries exceeded".to_string()))
    }
}

/// Headless host bridge that posts orders to the relay.
///
/// There is no UI to drive: progress and prompts are logged, and the identity
/// is whatever the bridge was built with.
#[derive(Debug)]
pub struct RelayBridge {
    relay: HttpRelay,
    formatter: SummaryFormatter<'static>,
    identity: Option<Identity>,
    last_delivery: Mutex<Option<DeliveryMode>>,
    /// Text of an interrupted delivery and how many of its chunks went out.
    pending: Mutex<Option<(String, usize)>>,
}

impl RelayBridge {
    pub fn new(relay: HttpRelay) -> Self {
        Self {
            relay,
            formatter: SummaryFormatter::builtin(),
            identity: None,
            last_delivery: Mutex::new(None),
            pending: Mutex::new(None),
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Mode used by the most recent successful delivery.
    pub fn last_delivery(&self) -> Option<DeliveryMode> {
        self.last_delivery.lock().ok().and_then(|m| *m)
    }

    /// Chunks of `text` already delivered by an interrupted send. Registers
    /// `text` as the delivery in progress.
    fn resume_point(&self, text: &str) -> usize {
        let Ok(mut pending) = self.pending.lock() else {
            return 0;
        };
        match pending.as_ref() {
            Some((previous, done)) if previous == text => *done,
            _ => {
                *pending = Some((text.to_string(), 0));
                0
            }
        }
    }
}

#[async_trait]
impl HostBridge for RelayBridge {
    fn is_available(&self) -> bool {
        true
    }

    async fn send_one_shot(&self, payload: &str) -> Result<(), BridgeError> {
        let order: OutboundPayload = serde_json::from_str(payload)
            .map_err(|e| BridgeError::Rejected(format!("malformed payload: {e}")))?;
        let draft = order
            .to_draft()
            .ok_or_else(|| BridgeError::Rejected("payload names no product".to_string()))?;
        let text = self
            .formatter
            .message(&draft, order.user.as_ref(), order.contact.as_ref());

        let skip = self.resume_point(&text);
        let mode = self
            .relay
            .deliver_from(&order, &text, skip, |delivered| {
                if let Ok(mut pending) = self.pending.lock() {
                    if let Some((_, done)) = pending.as_mut() {
                        *done = delivered;
                    }
                }
            })
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        if let Ok(mut pending) = self.pending.lock() {
            *pending = None;
        }
        if let Ok(mut last) = self.last_delivery.lock() {
            *last = Some(mode);
        }
        Ok(())
    }

    fn show_progress_indicator(&self) {
        tracing::debug!("relay send started");
    }

    fn hide_progress_indicator(&self) {
        tracing::debug!("relay send finished");
    }

    fn user_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    fn show_native_prompt(&self, message: &str, on_dismiss: Box<dyn FnOnce() + Send + 'static>) {
        tracing::info!(%message, "prompt (headless, dismissed at once)");
        on_dismiss();
    }

    fn expand_viewport(&self) {}
}
