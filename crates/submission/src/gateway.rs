//! Submission gateway: one guarded, timed hand-off of an order to the host.
//!
//! ```text
//!   Idle ──submit──→ Sending ──ok──────────→ Sent
//!                       │
//!                       └──error/timeout──→ Failed{reason} ──submit──→ Sending
//! ```
//!
//! A `submit` that arrives while a send is in flight (or after one succeeded)
//! does not reach the bridge. The gateway never retries on its own.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use sumki_order::{Contact, Identity, OrderDraft, OutboundPayload};

use crate::bridge::{HostBridge, ProgressGuard};
use crate::config::SubmissionConfig;

/// Reason recorded when the bridge call exceeds the send timeout.
pub const TIMEOUT_REASON: &str = "timeout";

/// Reason recorded when a `submit` future is dropped mid-send.
pub const CANCELLED_REASON: &str = "cancelled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Sending,
    Sent,
    Failed { reason: String },
}

impl SubmissionState {
    pub fn is_failed(&self) -> bool {
        matches!(self, SubmissionState::Failed { .. })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// No host bridge in this environment. Nothing was attempted.
    #[error("host platform is unavailable")]
    PlatformUnavailable,
}

pub struct SubmissionGateway {
    bridge: Arc<dyn HostBridge>,
    state: watch::Sender<SubmissionState>,
    send_timeout: Option<Duration>,
}

impl core::fmt::Debug for SubmissionGateway {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubmissionGateway")
            .field("state", &*self.state.borrow())
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

impl SubmissionGateway {
    /// `send_timeout: None` trusts the bridge to resolve on its own.
    pub fn new(bridge: Arc<dyn HostBridge>, send_timeout: Option<Duration>) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            bridge,
            state,
            send_timeout,
        }
    }

    pub fn from_config(bridge: Arc<dyn HostBridge>, config: &SubmissionConfig) -> Self {
        Self::new(bridge, config.send_timeout)
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    /// Observe state changes (for a rendering layer).
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Hand `draft` (plus identity and contact, when present) to the host.
    ///
    /// Returns the resulting state. Bridge, serialization and timeout
    /// failures come back as `Ok(SubmissionState::Failed { .. })`; only a
    /// missing bridge is an `Err`, and it leaves the state untouched.
    pub async fn submit(
        &self,
        draft: &OrderDraft,
        identity: Option<&Identity>,
        contact: Option<&Contact>,
    ) -> Result<SubmissionState, SubmitError> {
        if !self.bridge.is_available() {
            tracing::warn!("submit aborted: host bridge unavailable");
            return Err(SubmitError::PlatformUnavailable);
        }

        let mut entered = false;
        self.state.send_if_modified(|state| match state {
            SubmissionState::Sending | SubmissionState::Sent => false,
            _ => {
                *state = SubmissionState::Sending;
                entered = true;
                true
            }
        });
        if !entered {
            let current = self.state();
            tracing::debug!(state = ?current, "duplicate submit ignored");
            return Ok(current);
        }
        tracing::info!("submission started");
        let sending = SendingGuard {
            state: &self.state,
            finished: false,
        };

        let outcome = {
            let _progress = ProgressGuard::show(self.bridge.as_ref());
            self.hand_off(draft, identity, contact).await
        };

        let next = match outcome {
            Ok(()) => {
                tracing::info!("order handed to host");
                SubmissionState::Sent
            }
            Err(reason) => {
                tracing::warn!(%reason, "submission failed");
                SubmissionState::Failed { reason }
            }
        };
        sending.finish(next.clone());
        Ok(next)
    }

    async fn hand_off(
        &self,
        draft: &OrderDraft,
        identity: Option<&Identity>,
        contact: Option<&Contact>,
    ) -> Result<(), String> {
        let payload = OutboundPayload::from_draft(draft, identity, contact)
            .to_json()
            .map_err(|e| format!("serialization failed: {e}"))?;
        tracing::debug!(bytes = payload.len(), "outbound payload assembled");

        let send = self.bridge.send_one_shot(&payload);
        let result = match self.send_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| TIMEOUT_REASON.to_string())?,
            None => send.await,
        };
        result.map_err(|e| e.to_string())
    }
}

/// Owns the `Sending` state for one call. Dropped before `finish`, it records
/// the send as cancelled so the next `submit` can go through.
struct SendingGuard<'a> {
    state: &'a watch::Sender<SubmissionState>,
    finished: bool,
}

impl SendingGuard<'_> {
    fn finish(mut self, next: SubmissionState) {
        self.finished = true;
        self.state.send_replace(next);
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("submission dropped while sending");
            self.state.send_replace(SubmissionState::Failed {
                reason: CANCELLED_REASON.to_string(),
            });
        }
    }
}
