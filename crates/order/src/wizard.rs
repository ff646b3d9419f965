//! The order wizard: a step-by-step state machine over an [`OrderDraft`].
//!
//! ```text
//! SelectProduct ─┬─ bag ────→ ConfigureBag ─────┐
//!                ├─ coaster → ConfigureCoaster ─┴→ ChooseColor → ReviewOptions ─┐
//!                └─ custom ─→ DescribeCustom ───────────────────────────────────┴→ Preview
//!
//! Preview → Submitting → Success | Error   (Error → Submitting on retry)
//! ```
//!
//! Every forward step validates the fields it is responsible for on a copy of
//! the draft and only commits when validation passes. Going back never clears
//! anything.

use serde::{Deserialize, Serialize};

use sumki_core::{DomainError, DomainResult, OrderField, ProductKind};

use crate::draft::OrderDraft;
use crate::identity::{Contact, Identity};
use crate::moderation;

/// Wizard state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    SelectProduct,
    ConfigureBag,
    ConfigureCoaster,
    DescribeCustom,
    ChooseColor,
    ReviewOptions,
    Preview,
    Submitting,
    Success,
    Error,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::SelectProduct => "SelectProduct",
            WizardStep::ConfigureBag => "ConfigureBag",
            WizardStep::ConfigureCoaster => "ConfigureCoaster",
            WizardStep::DescribeCustom => "DescribeCustom",
            WizardStep::ChooseColor => "ChooseColor",
            WizardStep::ReviewOptions => "ReviewOptions",
            WizardStep::Preview => "Preview",
            WizardStep::Submitting => "Submitting",
            WizardStep::Success => "Success",
            WizardStep::Error => "Error",
        }
    }

    /// Draft fields may only change in these states.
    pub fn is_editable(&self) -> bool {
        !matches!(
            self,
            WizardStep::Submitting | WizardStep::Success | WizardStep::Error
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WizardStep::Success | WizardStep::Error)
    }
}

impl core::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields submitted by a single step. `None` keeps what the draft already
/// holds; `Some("")` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepInput {
    Product {
        product: Option<ProductKind>,
    },
    Bag {
        size: Option<String>,
        shape: Option<String>,
        material: Option<String>,
    },
    Coaster {
        material: Option<String>,
    },
    Custom {
        description: Option<String>,
    },
    Color {
        color: Option<String>,
        preference: Option<String>,
    },
    Options {
        options: Option<Vec<String>>,
    },
}

impl StepInput {
    /// The only step that accepts this input.
    pub fn step(&self) -> WizardStep {
        match self {
            StepInput::Product { .. } => WizardStep::SelectProduct,
            StepInput::Bag { .. } => WizardStep::ConfigureBag,
            StepInput::Coaster { .. } => WizardStep::ConfigureCoaster,
            StepInput::Custom { .. } => WizardStep::DescribeCustom,
            StepInput::Color { .. } => WizardStep::ChooseColor,
            StepInput::Options { .. } => WizardStep::ReviewOptions,
        }
    }
}

/// How a submission attempt ended, as reported back into the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Handed to the host. Not a seller-side acknowledgement.
    Delivered,
    Failed { reason: String, retryable: bool },
}

/// Failure recorded when the wizard enters `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardFailure {
    pub reason: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    step: WizardStep,
    draft: OrderDraft,
    failure: Option<WizardFailure>,
}

impl Wizard {
    /// Start a session. The host identity, if any, is attached immediately.
    pub fn start(identity: Option<Identity>) -> Self {
        let mut draft = OrderDraft::empty();
        draft.set_user(identity);
        Self {
            step: WizardStep::SelectProduct,
            draft,
            failure: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn failure(&self) -> Option<&WizardFailure> {
        self.failure.as_ref()
    }

    /// Steps from product selection to preview for the chosen product.
    pub fn path(&self) -> Vec<WizardStep> {
        use WizardStep::*;
        match self.draft.product() {
            None => vec![SelectProduct],
            Some(ProductKind::Bag) => vec![
                SelectProduct,
                ConfigureBag,
                ChooseColor,
                ReviewOptions,
                Preview,
            ],
            Some(ProductKind::Coaster) => vec![
                SelectProduct,
                ConfigureCoaster,
                ChooseColor,
                ReviewOptions,
                Preview,
            ],
            Some(ProductKind::Custom) => vec![SelectProduct, DescribeCustom, Preview],
        }
    }

    fn next_step(&self, from: WizardStep, product: ProductKind) -> WizardStep {
        use WizardStep::*;
        match (from, product) {
            (SelectProduct, ProductKind::Bag) => ConfigureBag,
            (SelectProduct, ProductKind::Coaster) => ConfigureCoaster,
            (SelectProduct, ProductKind::Custom) => DescribeCustom,
            (ConfigureBag | ConfigureCoaster, _) => ChooseColor,
            (DescribeCustom, _) => Preview,
            (ChooseColor, _) => ReviewOptions,
            (ReviewOptions, _) => Preview,
            (other, _) => other,
        }
    }

    fn previous_step(&self) -> Option<WizardStep> {
        use WizardStep::*;
        let product = self.draft.product();
        match self.step {
            ConfigureBag | ConfigureCoaster | DescribeCustom => Some(SelectProduct),
            ChooseColor => match product {
                Some(ProductKind::Coaster) => Some(ConfigureCoaster),
                _ => Some(ConfigureBag),
            },
            ReviewOptions => Some(ChooseColor),
            Preview => match product {
                Some(ProductKind::Custom) => Some(DescribeCustom),
                _ => Some(ReviewOptions),
            },
            SelectProduct | Submitting | Success | Error => None,
        }
    }

    fn transition(&mut self, to: WizardStep) {
        tracing::debug!(from = %self.step, to = %to, "wizard transition");
        self.step = to;
    }

    /// Complete the current step with `input`.
    ///
    /// Fails with [`DomainError::Validation`] naming the first required field
    /// that is missing after merging, and with
    /// [`DomainError::InvalidTransition`] when `input` belongs to another step
    /// or the wizard no longer accepts edits. On failure the draft is unchanged.
    pub fn advance(&mut self, input: StepInput) -> DomainResult<&OrderDraft> {
        if !self.step.is_editable() || self.step == WizardStep::Preview {
            return Err(DomainError::invalid_transition(self.step.as_str(), "advance"));
        }
        if input.step() != self.step {
            return Err(DomainError::invalid_transition(
                self.step.as_str(),
                "accept input for another step",
            ));
        }

        let mut next = self.draft.clone();
        let required: &[OrderField] = match input {
            StepInput::Product { product } => {
                let product = product.ok_or(DomainError::validation(OrderField::Product))?;
                next.set_product(product);
                &[OrderField::Product]
            }
            StepInput::Bag {
                size,
                shape,
                material,
            } => {
                next.merge_size(size);
                next.merge_shape(shape);
                next.merge_material(material);
                &[OrderField::Size, OrderField::Shape, OrderField::Material]
            }
            StepInput::Coaster { material } => {
                next.merge_material(material);
                &[OrderField::Material]
            }
            StepInput::Custom { description } => {
                next.merge_custom_description(description);
                if next
                    .custom_description()
                    .is_some_and(moderation::contains_inappropriate)
                {
                    tracing::info!(step = %self.step, "custom description rejected");
                    return Err(DomainError::rejected(OrderField::CustomDescription));
                }
                &[OrderField::CustomDescription]
            }
            StepInput::Color { color, preference } => {
                next.merge_color(color);
                next.merge_color_preference(preference);
                &[OrderField::Color]
            }
            StepInput::Options { options } => {
                if let Some(options) = options {
                    next.set_options(options);
                }
                &[]
            }
        };

        if let Some(missing) = required.iter().find(|f| !next.has_value(**f)) {
            tracing::debug!(step = %self.step, field = %missing, "step validation failed");
            return Err(DomainError::validation(*missing));
        }

        // Product is always set past the first step; the guard keeps this total.
        let product = next
            .product()
            .ok_or(DomainError::validation(OrderField::Product))?;
        let to = self.next_step(self.step, product);
        self.draft = next;
        self.transition(to);
        Ok(&self.draft)
    }

    /// Return to the previous step of the current path, keeping every field.
    pub fn back(&mut self) -> DomainResult<WizardStep> {
        let prev = self
            .previous_step()
            .ok_or(DomainError::invalid_transition(self.step.as_str(), "go back"))?;
        self.transition(prev);
        Ok(prev)
    }

    /// Lock the draft and move from `Preview` to `Submitting`.
    pub fn begin_submission(&mut self) -> DomainResult<&OrderDraft> {
        if self.step != WizardStep::Preview {
            return Err(DomainError::invalid_transition(
                self.step.as_str(),
                "begin submission",
            ));
        }
        if !self.draft.is_orderable() {
            return Err(DomainError::validation(OrderField::Product));
        }
        self.failure = None;
        self.transition(WizardStep::Submitting);
        Ok(&self.draft)
    }

    /// Record how the in-flight submission ended.
    pub fn complete(&mut self, outcome: SubmissionOutcome) -> DomainResult<WizardStep> {
        if self.step != WizardStep::Submitting {
            return Err(DomainError::invalid_transition(
                self.step.as_str(),
                "complete submission",
            ));
        }
        match outcome {
            SubmissionOutcome::Delivered => {
                self.failure = None;
                self.transition(WizardStep::Success);
            }
            SubmissionOutcome::Failed { reason, retryable } => {
                tracing::warn!(%reason, retryable, "submission failed");
                self.failure = Some(WizardFailure { reason, retryable });
                self.transition(WizardStep::Error);
            }
        }
        Ok(self.step)
    }

    /// Re-enter `Submitting` after a recoverable failure. The draft is reused
    /// as is.
    pub fn retry(&mut self) -> DomainResult<&OrderDraft> {
        let retryable = self.step == WizardStep::Error
            && self.failure.as_ref().is_some_and(|f| f.retryable);
        if !retryable {
            return Err(DomainError::invalid_transition(self.step.as_str(), "retry"));
        }
        self.transition(WizardStep::Submitting);
        Ok(&self.draft)
    }

    /// Attach contact details that arrived late. Allowed while editing and
    /// after a failed submission, so a retry can carry them.
    pub fn attach_contact(&mut self, contact: Contact) -> DomainResult<()> {
        if matches!(self.step, WizardStep::Submitting | WizardStep::Success) {
            return Err(DomainError::invalid_transition(
                self.step.as_str(),
                "attach contact",
            ));
        }
        self.draft.set_contact(contact);
        Ok(())
    }
}
