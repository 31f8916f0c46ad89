//! Port for the admin review endpoints.

use async_trait::async_trait;
use pagination::Paginated;
use serde_json::Value;

use crate::domain::admin::{AdminQuery, BulkStatusRequest, BulkStatusResult, StatusChange};
use crate::domain::{Application, ApplicationId};

use super::GatewayError;

/// Remote operations available to tier 1 and tier 2 administrators.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// `GET /admin/applications` for the query's filters, sort and page.
    async fn list(&self, query: &AdminQuery) -> Result<Paginated<Application>, GatewayError>;

    /// `GET /admin/applications/{id}` including documents and audit trail.
    async fn get(&self, id: ApplicationId) -> Result<Application, GatewayError>;

    /// `PUT /admin/applications/{id}/status`.
    async fn update_status(
        &self,
        id: ApplicationId,
        change: &StatusChange,
    ) -> Result<Application, GatewayError>;

    /// `PUT /admin/applications/status/bulk` as one batched request.
    async fn bulk_update_status(
        &self,
        request: &BulkStatusRequest,
    ) -> Result<BulkStatusResult, GatewayError>;

    /// `PATCH /admin/applications/{id}/data` with a partial payload.
    async fn patch_data(&self, id: ApplicationId, patch: &Value) -> Result<(), GatewayError>;

    /// `GET /admin/applications/export` as CSV bytes.
    async fn export_csv(&self, query: &AdminQuery) -> Result<Vec<u8>, GatewayError>;
}
