//! Remote side of the wizard: draft saves, resume and submission.

use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use mockable::Clock;
use tracing::{debug, info, warn};

use super::{Wizard, WizardForm};
use crate::domain::ports::{ApplicationsApi, DraftStore, DraftStoreError, GatewayError};
use crate::domain::validation::FieldErrors;
use crate::domain::{Application, ApplicationId, DocumentType, DomainError};

/// Errors that stop a submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// A step failed validation; the wizard now shows that step.
    #[error("{step} has invalid fields: {errors}")]
    Invalid {
        /// Name of the failing step.
        step: String,
        /// Field messages for that step.
        errors: FieldErrors,
    },
    /// A required document failed to upload; nothing was submitted.
    #[error("required document {document_type} failed to upload: {source}")]
    RequiredUpload {
        /// Document that failed.
        document_type: DocumentType,
        /// Why the upload failed.
        source: GatewayError,
    },
    /// Any other backend failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The local draft snapshot could not be written or cleared.
    #[error(transparent)]
    Drafts(#[from] DraftStoreError),
}

/// Result of a completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Application as returned by the submit call.
    pub application: Application,
    /// Documents that uploaded, required ones first.
    pub uploaded: Vec<DocumentType>,
    /// Optional documents that failed, with the reason.
    pub optional_failures: Vec<(DocumentType, String)>,
}

/// Drives draft persistence and the submission sequence for a wizard.
pub struct WizardCoordinator {
    api: Arc<dyn ApplicationsApi>,
    drafts: Arc<dyn DraftStore>,
}

impl WizardCoordinator {
    /// Coordinator over the given ports.
    pub fn new(api: Arc<dyn ApplicationsApi>, drafts: Arc<dyn DraftStore>) -> Self {
        Self { api, drafts }
    }

    /// Resume the saved wizard for `F`, if a snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot cannot be read or belongs to the
    /// other product.
    pub fn resume<F: WizardForm>(
        &self,
        clock: Arc<dyn Clock>,
    ) -> Result<Option<Wizard<F>>, DomainError> {
        let snapshot = self
            .drafts
            .load(F::APPLICATION_TYPE)
            .map_err(|err| DomainError::internal(err.to_string()))?;
        snapshot
            .map(|snapshot| Wizard::resume(snapshot, clock))
            .transpose()
    }

    async fn push_form<F: WizardForm>(
        &self,
        wizard: &mut Wizard<F>,
    ) -> Result<ApplicationId, GatewayError> {
        let payload = wizard.form().to_payload();
        match wizard.draft_id() {
            Some(id) => {
                debug!(%id, "updating draft");
                self.api.update(id, &payload).await?;
                Ok(id)
            }
            None => {
                let created = self.api.create(&payload).await?;
                info!(id = %created.id, kind = %F::APPLICATION_TYPE, "created draft");
                wizard.set_draft_id(created.id);
                Ok(created.id)
            }
        }
    }

    /// Save the wizard as a backend draft and mirror it locally.
    ///
    /// The first call creates the draft; later calls update it. Validation
    /// does not run, so partial forms save fine.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Gateway`] or [`SubmitError::Drafts`].
    pub async fn save_draft<F: WizardForm>(
        &self,
        wizard: &mut Wizard<F>,
    ) -> Result<ApplicationId, SubmitError> {
        let id = self.push_form(wizard).await?;
        self.drafts.save(&wizard.snapshot())?;
        Ok(id)
    }

    /// Validate, upload and submit.
    ///
    /// Sequence: ensure the draft exists and carries the latest form; upload
    /// required documents as one fail-fast group; upload optional documents
    /// best-effort; submit; clear local draft state.
    ///
    /// # Errors
    ///
    /// See [`SubmitError`]. After [`SubmitError::RequiredUpload`] the
    /// application stays a draft and the wizard keeps its state.
    pub async fn submit<F: WizardForm>(
        &self,
        wizard: &mut Wizard<F>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        wizard
            .validate_all()
            .map_err(|(step, errors)| SubmitError::Invalid {
                step: step.to_string(),
                errors,
            })?;

        let id = self.push_form(wizard).await?;
        self.drafts.save(&wizard.snapshot())?;

        let attachments = wizard.attachments();
        let required = F::REQUIRED_DOCUMENTS.iter().filter_map(|kind| {
            attachments.get(kind).map(|file| async move {
                self.api
                    .upload_document(id, *kind, file)
                    .await
                    .map(|_| *kind)
                    .map_err(|source| SubmitError::RequiredUpload {
                        document_type: *kind,
                        source,
                    })
            })
        });
        let mut uploaded = try_join_all(required).await?;
        debug!(%id, count = uploaded.len(), "required documents uploaded");

        let optional = F::OPTIONAL_DOCUMENTS.iter().filter_map(|kind| {
            attachments.get(kind).map(|file| async move {
                (*kind, self.api.upload_document(id, *kind, file).await)
            })
        });
        let mut optional_failures = Vec::new();
        for (kind, result) in join_all(optional).await {
            match result {
                Ok(_) => uploaded.push(kind),
                Err(err) => {
                    warn!(%id, document_type = %kind, error = %err, "optional document upload failed");
                    optional_failures.push((kind, err.to_string()));
                }
            }
        }

        let application = self.api.submit(id).await?;
        info!(%id, status = %application.status, "application submitted");

        self.drafts.clear(F::APPLICATION_TYPE)?;
        wizard.reset();

        Ok(SubmissionReceipt {
            application,
            uploaded,
            optional_failures,
        })
    }
}
