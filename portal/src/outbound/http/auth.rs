//! [`AuthApi`] over the gateway.

use std::sync::Arc;

use async_trait::async_trait;

use super::dto::{ChangePasswordDto, LoginRequestDto, RefreshRequestDto, RegisterRequestDto};
use super::gateway::{ApiRequest, GatewayClient};
use crate::domain::ports::{AuthApi, GatewayError};
use crate::domain::{
    AuthGrant, ChangePasswordRequest, Document, DocumentType, DocumentUpload, LoginCredentials,
    Registration, User,
};

/// Account endpoints under `/auth`.
#[derive(Clone)]
pub struct HttpAuthApi {
    gateway: Arc<GatewayClient>,
}

impl HttpAuthApi {
    /// Adapter sending through `gateway`; logout reads the refresh token from its session store.
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthGrant, GatewayError> {
        let request = ApiRequest::post("auth/login")
            .anonymous()
            .json(&LoginRequestDto {
                email: credentials.email(),
                password: credentials.password(),
            })?;
        self.gateway.fetch(&request).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, GatewayError> {
        let request = ApiRequest::post("auth/register")
            .anonymous()
            .json(&RegisterRequestDto {
                first_name: registration.first_name.trim(),
                last_name: registration.last_name.trim(),
                email: registration.email.trim(),
                phone_number: registration.phone_number.trim(),
                password: registration.password.as_str(),
            })?;
        self.gateway.fetch(&request).await
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        let session = self.gateway.sessions().load();
        let mut request = ApiRequest::post("auth/logout");
        if let Some(session) = session.as_ref() {
            request = request.json(&RefreshRequestDto {
                refresh_token: session.refresh_token.expose(),
            })?;
        }
        self.gateway.send(&request).await.map(drop)
    }

    async fn current_user(&self) -> Result<User, GatewayError> {
        self.gateway.fetch(&ApiRequest::get("auth/users/me")).await
    }

    async fn upload_user_document(
        &self,
        document_type: DocumentType,
        file: &DocumentUpload,
    ) -> Result<Document, GatewayError> {
        let request = ApiRequest::post("auth/users/me/documents").multipart(document_type, file);
        self.gateway.fetch(&request).await
    }

    async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<(), GatewayError> {
        let request = ApiRequest::post("auth/change-password").json(&ChangePasswordDto {
            current_password: request.current_password.as_str(),
            new_password: request.new_password.as_str(),
            confirm_password: request.confirm_password.as_str(),
        })?;
        self.gateway.send(&request).await.map(drop)
    }
}
