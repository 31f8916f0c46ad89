//! [`AdminApi`] over the gateway.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::Paginated;
use serde_json::Value;

use super::dto::ListDto;
use super::gateway::{ApiRequest, GatewayClient};
use crate::domain::admin::{AdminQuery, BulkStatusRequest, BulkStatusResult, StatusChange};
use crate::domain::ports::{AdminApi, GatewayError};
use crate::domain::{Application, ApplicationId};

/// Review endpoints under `/admin/applications`.
#[derive(Clone)]
pub struct HttpAdminApi {
    gateway: Arc<GatewayClient>,
}

impl HttpAdminApi {
    /// Adapter sending through `gateway`.
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }
}

/// Export covers every match, so paging pairs are dropped.
fn export_pairs(query: &AdminQuery) -> Vec<(&'static str, String)> {
    query
        .query_pairs()
        .into_iter()
        .filter(|(key, _)| !matches!(*key, "page" | "size"))
        .collect()
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn list(&self, query: &AdminQuery) -> Result<Paginated<Application>, GatewayError> {
        let request = ApiRequest::get("admin/applications").query(query.query_pairs());
        let list: ListDto<Application> = self.gateway.fetch(&request).await?;
        Ok(list.into())
    }

    async fn get(&self, id: ApplicationId) -> Result<Application, GatewayError> {
        self.gateway
            .fetch(&ApiRequest::get(format!("admin/applications/{id}")))
            .await
    }

    async fn update_status(
        &self,
        id: ApplicationId,
        change: &StatusChange,
    ) -> Result<Application, GatewayError> {
        let request = ApiRequest::put(format!("admin/applications/{id}/status")).json(change)?;
        self.gateway.fetch(&request).await
    }

    async fn bulk_update_status(
        &self,
        request: &BulkStatusRequest,
    ) -> Result<BulkStatusResult, GatewayError> {
        let request = ApiRequest::put("admin/applications/status/bulk").json(request)?;
        self.gateway.fetch(&request).await
    }

    async fn patch_data(&self, id: ApplicationId, patch: &Value) -> Result<(), GatewayError> {
        let request = ApiRequest::patch(format!("admin/applications/{id}/data")).json(patch)?;
        self.gateway.send(&request).await.map(drop)
    }

    async fn export_csv(&self, query: &AdminQuery) -> Result<Vec<u8>, GatewayError> {
        let request = ApiRequest::get("admin/applications/export")
            .query(export_pairs(query))
            .accept("text/csv");
        self.gateway.send(&request).await
    }
}
