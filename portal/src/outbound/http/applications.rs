//! [`ApplicationsApi`] over the gateway.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::Paginated;

use super::dto::{CreateDraftDto, ListDto, PayloadDto};
use super::gateway::{ApiRequest, GatewayClient};
use crate::domain::ports::{ApplicationsApi, GatewayError};
use crate::domain::{
    Application, ApplicationFilters, ApplicationId, ApplicationPayload, ApplicationType,
    Document, DocumentType, DocumentUpload,
};

/// Applicant endpoints under `/applications`.
#[derive(Clone)]
pub struct HttpApplicationsApi {
    gateway: Arc<GatewayClient>,
}

impl HttpApplicationsApi {
    /// Adapter sending through `gateway`.
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }
}

fn create_path(kind: ApplicationType) -> &'static str {
    match kind {
        ApplicationType::Sme => "applications/sme",
        ApplicationType::Payroll => "applications/payroll",
    }
}

#[async_trait]
impl ApplicationsApi for HttpApplicationsApi {
    async fn list(
        &self,
        filters: &ApplicationFilters,
    ) -> Result<Paginated<Application>, GatewayError> {
        let request = ApiRequest::get("applications").query(filters.query_pairs());
        let list: ListDto<Application> = self.gateway.fetch(&request).await?;
        Ok(list.into())
    }

    async fn get(&self, id: ApplicationId) -> Result<Application, GatewayError> {
        self.gateway
            .fetch(&ApiRequest::get(format!("applications/{id}")))
            .await
    }

    async fn create_draft(&self, kind: ApplicationType) -> Result<Application, GatewayError> {
        let request = ApiRequest::post("applications/draft").json(&CreateDraftDto {
            application_type: kind,
        })?;
        self.gateway.fetch(&request).await
    }

    async fn create(&self, payload: &ApplicationPayload) -> Result<Application, GatewayError> {
        let request = ApiRequest::post(create_path(payload.application_type()))
            .json(&PayloadDto::from(payload))?;
        self.gateway.fetch(&request).await
    }

    async fn update(
        &self,
        id: ApplicationId,
        payload: &ApplicationPayload,
    ) -> Result<Application, GatewayError> {
        let request =
            ApiRequest::put(format!("applications/{id}")).json(&PayloadDto::from(payload))?;
        self.gateway.fetch(&request).await
    }

    async fn upload_document(
        &self,
        id: ApplicationId,
        document_type: DocumentType,
        file: &DocumentUpload,
    ) -> Result<Document, GatewayError> {
        let request = ApiRequest::post(format!("applications/{id}/documents/upload"))
            .multipart(document_type, file);
        self.gateway.fetch(&request).await
    }

    async fn submit(&self, id: ApplicationId) -> Result<Application, GatewayError> {
        self.gateway
            .fetch(&ApiRequest::post(format!("applications/{id}/submit")))
            .await
    }

    async fn delete(&self, id: ApplicationId) -> Result<(), GatewayError> {
        self.gateway
            .send(&ApiRequest::delete(format!("applications/{id}")))
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApplicationType::Sme, "applications/sme")]
    #[case(ApplicationType::Payroll, "applications/payroll")]
    fn creates_post_to_product_path(#[case] kind: ApplicationType, #[case] expected: &str) {
        assert_eq!(create_path(kind), expected);
    }
}
