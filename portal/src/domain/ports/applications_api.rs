//! Port for applicant-facing application endpoints.
//!
//! Adapters own transport details (paths, multipart encoding, token
//! refresh). Stores and the wizard coordinator depend only on this trait.

use async_trait::async_trait;
use pagination::Paginated;

use crate::domain::{
    Application, ApplicationFilters, ApplicationId, ApplicationPayload, ApplicationType,
    Document, DocumentType, DocumentUpload,
};

use super::GatewayError;

/// Remote operations on the signed-in applicant's applications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationsApi: Send + Sync {
    /// `GET /applications` with the given filters.
    async fn list(
        &self,
        filters: &ApplicationFilters,
    ) -> Result<Paginated<Application>, GatewayError>;

    /// `GET /applications/{id}`.
    async fn get(&self, id: ApplicationId) -> Result<Application, GatewayError>;

    /// `POST /applications/draft`: an empty draft of the given product.
    async fn create_draft(&self, kind: ApplicationType) -> Result<Application, GatewayError>;

    /// `POST /applications/sme` or `/applications/payroll`, by payload type.
    async fn create(&self, payload: &ApplicationPayload) -> Result<Application, GatewayError>;

    /// `PUT /applications/{id}` with the full payload.
    async fn update(
        &self,
        id: ApplicationId,
        payload: &ApplicationPayload,
    ) -> Result<Application, GatewayError>;

    /// `POST /applications/{id}/documents/upload` as multipart.
    async fn upload_document(
        &self,
        id: ApplicationId,
        document_type: DocumentType,
        file: &DocumentUpload,
    ) -> Result<Document, GatewayError>;

    /// `POST /applications/{id}/submit`.
    async fn submit(&self, id: ApplicationId) -> Result<Application, GatewayError>;

    /// `DELETE /applications/{id}`.
    async fn delete(&self, id: ApplicationId) -> Result<(), GatewayError>;
}
