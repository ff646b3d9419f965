//! Order draft domain module.
//!
//! This crate contains the order wizard and the rendering of a finished draft,
//! implemented purely as deterministic domain logic (no IO, no host bridge).

pub mod draft;
pub mod identity;
pub mod moderation;
pub mod payload;
pub mod summary;
pub mod wizard;

pub use draft::OrderDraft;
pub use identity::{Contact, ContactStatus, Identity};
pub use payload::OutboundPayload;
pub use summary::{SummaryFormatter, SummaryRow};
pub use wizard::{StepInput, SubmissionOutcome, Wizard, WizardFailure, WizardStep};
