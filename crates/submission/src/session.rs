//! One customer's pass through the wizard, from product choice to hand-off.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::Instrument;

use sumki_core::{DomainError, SessionId};
use sumki_order::{
    Contact, ContactStatus, OrderDraft, StepInput, SubmissionOutcome, SummaryFormatter,
    SummaryRow, Wizard, WizardStep,
};

use crate::bridge::HostBridge;
use crate::config::SubmissionConfig;
use crate::contact::ContactRequester;
use crate::gateway::{SubmissionGateway, SubmissionState, SubmitError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Wizard, gateway and contact requester for a single order.
///
/// Dropping (or [`close`](Self::close)-ing) the session discards the draft;
/// nothing is persisted.
#[derive(Debug)]
pub struct OrderSession {
    id: SessionId,
    wizard: Wizard,
    gateway: SubmissionGateway,
    contacts: ContactRequester,
    formatter: SummaryFormatter<'static>,
    span: tracing::Span,
}

impl OrderSession {
    /// Start a session on `bridge`, reading the host identity once.
    pub fn start(bridge: Arc<dyn HostBridge>, config: &SubmissionConfig) -> Self {
        Self::with_id(SessionId::new(), bridge, config)
    }

    pub fn with_id(id: SessionId, bridge: Arc<dyn HostBridge>, config: &SubmissionConfig) -> Self {
        let span = tracing::info_span!("order_session", session_id = %id);
        let contacts = ContactRequester::new(bridge.clone());
        let identity = span.in_scope(|| contacts.read_identity());
        let wizard = Wizard::start(identity);
        span.in_scope(|| tracing::info!(step = %wizard.step(), "session started"));

        Self {
            id,
            wizard,
            gateway: SubmissionGateway::from_config(bridge, config),
            contacts,
            formatter: SummaryFormatter::builtin(),
            span,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn draft(&self) -> &OrderDraft {
        self.wizard.draft()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.gateway.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.gateway.subscribe()
    }

    pub fn advance(&mut self, input: StepInput) -> Result<WizardStep, SessionError> {
        let _enter = self.span.enter();
        self.wizard.advance(input)?;
        Ok(self.wizard.step())
    }

    pub fn back(&mut self) -> Result<WizardStep, SessionError> {
        let _enter = self.span.enter();
        Ok(self.wizard.back()?)
    }

    /// Review rows for the current draft.
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.formatter.rows(self.wizard.draft())
    }

    /// The text the seller will receive for the current draft.
    pub fn seller_message(&self) -> String {
        let draft = self.wizard.draft();
        self.formatter.message(draft, draft.user(), draft.contact())
    }

    pub fn contact_status(&self) -> ContactStatus {
        ContactStatus::from_option(self.wizard.draft().contact())
    }

    /// Ask the user to share a phone number with the bot. Nothing comes back
    /// into the session from this call.
    pub fn request_contact(&self) {
        let _enter = self.span.enter();
        self.contacts.request_contact();
    }

    pub fn attach_contact(&mut self, contact: Contact) -> Result<(), SessionError> {
        let _enter = self.span.enter();
        self.wizard.attach_contact(contact)?;
        tracing::info!("contact attached");
        Ok(())
    }

    /// Submit from `Preview`, or retry from a recoverable `Error`.
    ///
    /// A missing host bridge leaves the wizard in a non-retryable `Error` and
    /// is returned as [`SessionError::Submit`]. Any other failure is a
    /// retryable `Error` step.
    pub async fn submit(&mut self) -> Result<WizardStep, SessionError> {
        let span = self.span.clone();
        async {
            let draft = match self.wizard.step() {
                WizardStep::Error => self.wizard.retry()?.clone(),
                _ => self.wizard.begin_submission()?.clone(),
            };

            let result = self
                .gateway
                .submit(&draft, draft.user(), draft.contact())
                .await;

            let outcome = match result {
                Ok(SubmissionState::Sent) => SubmissionOutcome::Delivered,
                Ok(SubmissionState::Failed { reason }) => SubmissionOutcome::Failed {
                    reason,
                    retryable: true,
                },
                Ok(other) => SubmissionOutcome::Failed {
                    reason: format!("gateway left in {other:?}"),
                    retryable: true,
                },
                Err(e) => {
                    self.wizard.complete(SubmissionOutcome::Failed {
                        reason: e.to_string(),
                        retryable: false,
                    })?;
                    return Err(SessionError::from(e));
                }
            };

            let step = self.wizard.complete(outcome)?;
            tracing::info!(%step, "submission finished");
            Ok::<_, SessionError>(step)
        }
        .instrument(span)
        .await
    }

    /// End the session, discarding the draft.
    pub fn close(self) {
        let _enter = self.span.enter();
        tracing::info!(step = %self.wizard.step(), "session closed");
    }
}
