//! Identity reading and out-of-band contact acquisition.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sumki_order::Identity;

use crate::bridge::HostBridge;

/// Text of the native prompt asking the user to share a phone number with the
/// bot.
pub const CONTACT_PROMPT: &str = "Для завершения заказа нам необходимы ваши контактные данные. \
Пожалуйста, перейдите в бота и поделитесь своим контактом через кнопку 'Поделиться контактом'.";

/// Asks the host for details the session cannot collect itself.
///
/// A contact request leaves the session: the number is shared in the bot chat
/// and nothing reports back here. Callers attach a contact only if one reaches
/// them by other means.
#[derive(Clone)]
pub struct ContactRequester {
    bridge: Arc<dyn HostBridge>,
    requested: Arc<AtomicBool>,
    dismissed: Arc<AtomicBool>,
}

impl core::fmt::Debug for ContactRequester {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContactRequester")
            .field("requested", &self.was_requested())
            .field("dismissed", &self.prompt_dismissed())
            .finish_non_exhaustive()
    }
}

impl ContactRequester {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        Self {
            bridge,
            requested: Arc::new(AtomicBool::new(false)),
            dismissed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Identity the host supplied at session start.
    pub fn read_identity(&self) -> Option<Identity> {
        if !self.bridge.is_available() {
            return None;
        }
        let identity = self.bridge.user_identity();
        tracing::debug!(present = identity.is_some(), "host identity read");
        identity
    }

    /// Expand the host viewport and show the share-contact prompt.
    pub fn request_contact(&self) {
        if !self.bridge.is_available() {
            tracing::warn!("contact request skipped: host bridge unavailable");
            return;
        }
        self.requested.store(true, Ordering::SeqCst);
        self.bridge.expand_viewport();

        let dismissed = self.dismissed.clone();
        self.bridge.show_native_prompt(
            CONTACT_PROMPT,
            Box::new(move || {
                dismissed.store(true, Ordering::SeqCst);
                tracing::info!("contact prompt dismissed");
            }),
        );
        tracing::info!("contact requested");
    }

    pub fn was_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn prompt_dismissed(&self) -> bool {
        self.dismissed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{BridgeEvent, RecordingBridge, SendBehavior};

    #[test]
    fn identity_comes_from_the_bridge() {
        let user = Identity::new(7, "Olga").with_username("olga");
        let bridge = Arc::new(RecordingBridge::new(SendBehavior::Succeed).with_identity(user.clone()));
        let contacts = ContactRequester::new(bridge);

        assert_eq!(contacts.read_identity(), Some(user));
    }

    #[test]
    fn no_identity_without_a_bridge() {
        let contacts = ContactRequester::new(Arc::new(RecordingBridge::unavailable()));
        assert_eq!(contacts.read_identity(), None);
    }

    #[test]
    fn request_expands_then_prompts() {
        let bridge = Arc::new(RecordingBridge::new(SendBehavior::Succeed));
        let contacts = ContactRequester::new(bridge.clone());

        contacts.request_contact();

        assert_eq!(
            bridge.events(),
            vec![
                BridgeEvent::ExpandViewport,
                BridgeEvent::Prompt(CONTACT_PROMPT.to_string()),
            ]
        );
        assert!(contacts.was_requested());
        assert!(contacts.prompt_dismissed());
        assert!(bridge.sends().is_empty());
    }

    #[test]
    fn request_is_a_no_op_without_a_bridge() {
        let bridge = Arc::new(RecordingBridge::unavailable());
        let contacts = ContactRequester::new(bridge.clone());

        contacts.request_contact();

        assert!(bridge.events().is_empty());
        assert!(!contacts.was_requested());
    }
}
