//! The host messaging bridge: the narrow capability this crate consumes.

use async_trait::async_trait;
use thiserror::Error;

use sumki_order::Identity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The host refused the call (bad payload, closed session, ...).
    #[error("bridge rejected the call: {0}")]
    Rejected(String),
    /// The host could not carry the payload.
    #[error("bridge transport failed: {0}")]
    Transport(String),
}

/// Capabilities offered by the host platform.
///
/// `send_one_shot` is fire-and-forget: `Ok` means the payload was handed to
/// the host, not that the seller saw it.
#[async_trait]
pub trait HostBridge: Send + Sync {
    fn is_available(&self) -> bool;

    async fn send_one_shot(&self, payload: &str) -> Result<(), BridgeError>;

    fn show_progress_indicator(&self);

    fn hide_progress_indicator(&self);

    /// Identity supplied at session start, if the host has one.
    fn user_identity(&self) -> Option<Identity>;

    fn show_native_prompt(&self, message: &str, on_dismiss: Box<dyn FnOnce() + Send + 'static>);

    fn expand_viewport(&self);
}

/// Shows the host progress indicator for as long as it lives.
///
/// Dropping the guard hides the indicator, on every exit path.
pub(crate) struct ProgressGuard<'a> {
    bridge: &'a dyn HostBridge,
}

impl<'a> ProgressGuard<'a> {
    pub(crate) fn show(bridge: &'a dyn HostBridge) -> Self {
        bridge.show_progress_indicator();
        Self { bridge }
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.bridge.hide_progress_indicator();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory bridge that records every call.

    use std::sync::{Arc, Mutex, OnceLock};

    use tokio::sync::{Notify, watch};

    use super::*;
    use crate::gateway::SubmissionState;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum BridgeEvent {
        ShowProgress,
        HideProgress,
        Send(String),
        Prompt(String),
        ExpandViewport,
    }

    pub(crate) enum SendBehavior {
        Succeed,
        Fail(BridgeError),
        /// Wait for the notify before succeeding.
        Gate(Arc<Notify>),
        Hang,
    }

    pub(crate) struct RecordingBridge {
        available: bool,
        identity: Option<Identity>,
        behavior: SendBehavior,
        events: Mutex<Vec<BridgeEvent>>,
        observer: OnceLock<watch::Receiver<SubmissionState>>,
        observed: Mutex<Vec<SubmissionState>>,
    }

    impl RecordingBridge {
        pub(crate) fn new(behavior: SendBehavior) -> Self {
            Self {
                available: true,
                identity: None,
                behavior,
                events: Mutex::new(Vec::new()),
                observer: OnceLock::new(),
                observed: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::new(SendBehavior::Succeed)
            }
        }

        pub(crate) fn with_identity(mut self, identity: Identity) -> Self {
            self.identity = Some(identity);
            self
        }

        /// Record the gateway state as seen from inside `send_one_shot`.
        pub(crate) fn observe(&self, rx: watch::Receiver<SubmissionState>) {
            let _ = self.observer.set(rx);
        }

        pub(crate) fn events(&self) -> Vec<BridgeEvent> {
            self.events.lock().unwrap().clone()
        }

        pub(crate) fn observed(&self) -> Vec<SubmissionState> {
            self.observed.lock().unwrap().clone()
        }

        pub(crate) fn sends(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    BridgeEvent::Send(p) => Some(p),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn count(&self, event: &BridgeEvent) -> usize {
            self.events().iter().filter(|e| *e == event).count()
        }

        fn push(&self, event: BridgeEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl HostBridge for RecordingBridge {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn send_one_shot(&self, payload: &str) -> Result<(), BridgeError> {
            self.push(BridgeEvent::Send(payload.to_string()));
            if let Some(rx) = self.observer.get() {
                let state = rx.borrow().clone();
                self.observed.lock().unwrap().push(state);
            }
            match &self.behavior {
                SendBehavior::Succeed => Ok(()),
                SendBehavior::Fail(err) => Err(err.clone()),
                SendBehavior::Gate(notify) => {
                    notify.notified().await;
                    Ok(())
                }
                SendBehavior::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }

        fn show_progress_indicator(&self) {
            self.push(BridgeEvent::ShowProgress);
        }

        fn hide_progress_indicator(&self) {
            self.push(BridgeEvent::HideProgress);
        }

        fn user_identity(&self) -> Option<Identity> {
            self.identity.clone()
        }

        fn show_native_prompt(&self, message: &str, on_dismiss: Box<dyn FnOnce() + Send + 'static>) {
            self.push(BridgeEvent::Prompt(message.to_string()));
            on_dismiss();
        }

        fn expand_viewport(&self) {
            self.push(BridgeEvent::ExpandViewport);
        }
    }
}
