//! Multi-step application wizard shared by the SME and payroll products.
//!
//! The wizard owns the form, the step cursor, the field errors of the last
//! validation and the files attached for upload. Validation runs only on
//! [`Wizard::advance`] and [`Wizard::validate_all`]; typing never triggers
//! it. Remote effects (draft saves and submission) live in
//! [`WizardCoordinator`].

mod coordinator;
mod payroll;
mod sme;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use super::validation::FieldErrors;
use super::{
    ApplicationId, ApplicationPayload, ApplicationType, DocumentType, DocumentUpload, DomainError,
    LoanQuote,
};

pub use coordinator::{SubmissionReceipt, SubmitError, WizardCoordinator};
pub use payroll::PayrollStep;
pub use sme::SmeStep;

/// Files attached to a wizard, one per document type.
pub type Attachments = BTreeMap<DocumentType, DocumentUpload>;

/// Form model driven by a [`Wizard`].
pub trait WizardForm: Clone + Default + fmt::Debug + Send + Sync + 'static {
    /// Step identifiers in display order.
    type Step: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Product this form applies for.
    const APPLICATION_TYPE: ApplicationType;
    /// Ordered steps; the last one is the review step.
    const STEPS: &'static [Self::Step];
    /// Step on which files are attached.
    const DOCUMENTS_STEP: Self::Step;
    /// Documents that must upload before submission.
    const REQUIRED_DOCUMENTS: &'static [DocumentType];
    /// Documents uploaded best-effort.
    const OPTIONAL_DOCUMENTS: &'static [DocumentType];

    /// Field checks for one step. The documents step is checked by the
    /// wizard itself.
    fn validate_step(&self, step: Self::Step, today: NaiveDate) -> FieldErrors;

    /// Wire payload for create and update calls.
    fn to_payload(&self) -> ApplicationPayload;

    /// Inverse of [`WizardForm::to_payload`]; `None` for the other product.
    fn from_payload(payload: ApplicationPayload) -> Option<Self>;

    /// Indicative repayment quote for the review step.
    fn quote(&self) -> Option<LoanQuote>;
}

/// Persisted wizard progress. Never carries file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    /// Backend draft, once one was created.
    pub draft_id: Option<ApplicationId>,
    /// Step the wizard was on.
    pub step_index: usize,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Form contents.
    pub payload: ApplicationPayload,
}

impl DraftSnapshot {
    /// Product of the saved form.
    pub const fn application_type(&self) -> ApplicationType {
        self.payload.application_type()
    }
}

/// Wizard state machine.
///
/// ## Invariants
/// - `step_index < F::STEPS.len()`.
/// - A failed advance leaves `step_index` unchanged and `errors` non-empty.
pub struct Wizard<F: WizardForm> {
    form: F,
    step_index: usize,
    errors: FieldErrors,
    attachments: Attachments,
    draft_id: Option<ApplicationId>,
    clock: Arc<dyn Clock>,
}

impl<F: WizardForm> fmt::Debug for Wizard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("step", &self.step())
            .field("draft_id", &self.draft_id)
            .field("errors", &self.errors)
            .field("attachments", &self.attachments.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<F: WizardForm> Wizard<F> {
    /// Fresh wizard on the first step.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            form: F::default(),
            step_index: 0,
            errors: FieldErrors::new(),
            attachments: Attachments::new(),
            draft_id: None,
            clock,
        }
    }

    /// Rebuild a wizard from a saved snapshot. Attachments are not restored.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when the snapshot belongs to the
    /// other product.
    pub fn resume(snapshot: DraftSnapshot, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        let kind = snapshot.application_type();
        let form = F::from_payload(snapshot.payload).ok_or_else(|| {
            DomainError::invalid_request(format!(
                "saved draft is {kind}, expected {}",
                F::APPLICATION_TYPE
            ))
        })?;
        Ok(Self {
            form,
            step_index: snapshot.step_index.min(F::STEPS.len().saturating_sub(1)),
            errors: FieldErrors::new(),
            attachments: Attachments::new(),
            draft_id: snapshot.draft_id,
            clock,
        })
    }

    /// Form values entered so far.
    pub fn form(&self) -> &F {
        &self.form
    }

    /// Mutable form access for field edits. Does not validate.
    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    /// Zero-based position in [`Wizard::steps`].
    pub const fn step_index(&self) -> usize {
        self.step_index
    }

    /// Current step.
    pub fn step(&self) -> F::Step {
        F::STEPS
            .get(self.step_index)
            .copied()
            .unwrap_or(F::DOCUMENTS_STEP)
    }

    /// Every step of this product, in order.
    pub fn steps(&self) -> &'static [F::Step] {
        F::STEPS
    }

    /// Whether the cursor is on the review step.
    pub fn is_last_step(&self) -> bool {
        self.step_index + 1 >= F::STEPS.len()
    }

    /// Errors from the most recent validation.
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Backend draft backing this wizard, if saved.
    pub const fn draft_id(&self) -> Option<ApplicationId> {
        self.draft_id
    }

    pub(crate) fn set_draft_id(&mut self, id: ApplicationId) {
        self.draft_id = Some(id);
    }

    /// Files chosen for upload, keyed by type.
    pub const fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Attach a file for `document_type`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error for document types this product
    /// does not accept.
    pub fn attach(
        &mut self,
        document_type: DocumentType,
        file: DocumentUpload,
    ) -> Result<(), DomainError> {
        let accepted = F::REQUIRED_DOCUMENTS.contains(&document_type)
            || F::OPTIONAL_DOCUMENTS.contains(&document_type);
        if !accepted {
            return Err(DomainError::invalid_request(format!(
                "{document_type} is not accepted for {} applications",
                F::APPLICATION_TYPE
            )));
        }
        self.attachments.insert(document_type, file);
        Ok(())
    }

    /// Required documents with no attached file.
    pub fn missing_documents(&self) -> Vec<DocumentType> {
        F::REQUIRED_DOCUMENTS
            .iter()
            .copied()
            .filter(|kind| !self.attachments.contains_key(kind))
            .collect()
    }

    fn validate(&self, step: F::Step) -> FieldErrors {
        if step == F::DOCUMENTS_STEP {
            let mut errors = FieldErrors::new();
            for kind in self.missing_documents() {
                errors.insert(kind.field_name(), format!("{kind} is required"));
            }
            errors
        } else {
            self.form.validate_step(step, self.today())
        }
    }

    /// Validate the current step and move forward when it passes.
    ///
    /// # Errors
    ///
    /// Returns the step's field errors; the cursor does not move.
    pub fn advance(&mut self) -> Result<F::Step, FieldErrors> {
        let errors = self.validate(self.step());
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(errors);
        }
        self.errors = FieldErrors::new();
        if !self.is_last_step() {
            self.step_index += 1;
        }
        Ok(self.step())
    }

    /// Move one step back. Never validates.
    pub fn back(&mut self) -> F::Step {
        self.step_index = self.step_index.saturating_sub(1);
        self.errors = FieldErrors::new();
        self.step()
    }

    /// Jump to an earlier (or the current) step. Returns `false` and stays
    /// put for later steps.
    pub fn jump_to(&mut self, step: F::Step) -> bool {
        match F::STEPS.iter().position(|candidate| *candidate == step) {
            Some(index) if index <= self.step_index => {
                self.step_index = index;
                self.errors = FieldErrors::new();
                true
            }
            _ => false,
        }
    }

    /// Validate every step. On failure the cursor lands on the first failing
    /// step with its errors recorded.
    ///
    /// # Errors
    ///
    /// Returns the failing step and its field errors.
    pub fn validate_all(&mut self) -> Result<(), (F::Step, FieldErrors)> {
        for (index, step) in F::STEPS.iter().copied().enumerate() {
            let errors = self.validate(step);
            if !errors.is_empty() {
                self.step_index = index;
                self.errors = errors.clone();
                return Err((step, errors));
            }
        }
        self.errors = FieldErrors::new();
        Ok(())
    }

    /// Indicative quote for the current form.
    pub fn quote(&self) -> Option<LoanQuote> {
        self.form.quote()
    }

    /// Snapshot of the form, draft id and cursor.
    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            draft_id: self.draft_id,
            step_index: self.step_index,
            saved_at: self.clock.utc(),
            payload: self.form.to_payload(),
        }
    }

    /// Forget everything after a successful submission.
    pub fn reset(&mut self) {
        self.form = F::default();
        self.step_index = 0;
        self.errors = FieldErrors::new();
        self.attachments.clear();
        self.draft_id = None;
    }
}
