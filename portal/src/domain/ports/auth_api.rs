//! Port for account and authentication endpoints.

use async_trait::async_trait;

use crate::domain::{
    AuthGrant, ChangePasswordRequest, Document, DocumentType, DocumentUpload, LoginCredentials,
    Registration, User,
};

use super::GatewayError;

/// Remote account operations.
///
/// `login` and `register` are unauthenticated. Everything else carries the
/// current bearer token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthGrant, GatewayError>;

    /// `POST /auth/register`.
    async fn register(&self, registration: &Registration) -> Result<AuthGrant, GatewayError>;

    /// `POST /auth/logout`.
    async fn logout(&self) -> Result<(), GatewayError>;

    /// `GET /auth/users/me`.
    async fn current_user(&self) -> Result<User, GatewayError>;

    /// `POST /auth/users/me/documents` as multipart.
    async fn upload_user_document(
        &self,
        document_type: DocumentType,
        file: &DocumentUpload,
    ) -> Result<Document, GatewayError>;

    /// `POST /auth/change-password`.
    async fn change_password(&self, request: &ChangePasswordRequest)
    -> Result<(), GatewayError>;
}
