//! Account store: login, registration, profile and logout.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::ports::{AuthApi, SessionStore};
use super::request_status::{HasRequestStatus, RequestStatus, tracked, with_state};
use super::validation::FieldErrors;
use super::{
    AuthGrant, ChangePasswordRequest, ClearReason, Document, DocumentType, DocumentUpload,
    DomainError, LoginCredentials, Registration, Session, Token, User,
};

/// Immutable copy of the account state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Signed-in profile.
    pub user: Option<User>,
    /// Loading flag and last error.
    pub status: RequestStatus,
}

impl HasRequestStatus for AuthState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

fn invalid(errors: &FieldErrors) -> DomainError {
    let details = serde_json::to_value(errors).unwrap_or_default();
    DomainError::invalid_request(errors.to_string()).with_details(details)
}

/// Store over the account endpoints. Writes the session on login and
/// registration and clears it on logout.
pub struct AuthStore {
    api: Arc<dyn AuthApi>,
    sessions: Arc<dyn SessionStore>,
    state: Mutex<AuthState>,
}

impl AuthStore {
    /// Store seeded with the profile of any persisted session.
    pub fn new(api: Arc<dyn AuthApi>, sessions: Arc<dyn SessionStore>) -> Self {
        let user = sessions.load().map(|session| session.user);
        Self {
            api,
            sessions,
            state: Mutex::new(AuthState {
                user,
                status: RequestStatus::default(),
            }),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AuthState {
        with_state(&self.state, |s| s.clone())
    }

    /// Dismiss the last error.
    pub fn clear_error(&self) {
        with_state(&self.state, |s| s.status.clear_error());
    }

    /// Whether a session is stored.
    pub fn is_authenticated(&self) -> bool {
        self.sessions.load().is_some()
    }

    fn start_session(&self, grant: AuthGrant) -> Result<User, DomainError> {
        let Some(user) = grant.user else {
            let error = DomainError::internal("authentication response did not include a profile");
            with_state(&self.state, |s| s.status.record_error(error.message()));
            return Err(error);
        };
        let session = Session {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.unwrap_or_else(|| Token::new("")),
            user: user.clone(),
        };
        self.sessions
            .save(&session)
            .map_err(|err| DomainError::internal(err.to_string()))?;
        info!(user = %user.id, role = ?user.role, "signed in");
        with_state(&self.state, |s| s.user = Some(user.clone()));
        Ok(user)
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns the backend failure (for example bad credentials), also
    /// recorded as the last error.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, DomainError> {
        let grant = tracked(&self.state, self.api.login(credentials)).await?;
        self.start_session(grant)
    }

    /// Create an account and sign straight in.
    ///
    /// # Errors
    ///
    /// Returns field errors without calling the backend, or the backend
    /// failure.
    pub async fn register(&self, registration: &Registration) -> Result<User, DomainError> {
        let errors = registration.validate();
        if !errors.is_empty() {
            return Err(invalid(&errors));
        }
        let grant = tracked(&self.state, self.api.register(registration)).await?;
        self.start_session(grant)
    }

    /// Sign out. The server call is best-effort; the local session is always
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns an error only when the local session cannot be cleared.
    pub async fn logout(&self) -> Result<(), DomainError> {
        if self.sessions.load().is_some() {
            if let Err(err) = self.api.logout().await {
                warn!(error = %err, "server logout failed; clearing local session anyway");
            }
        }
        self.sessions
            .clear(ClearReason::LoggedOut)
            .map_err(|err| DomainError::internal(err.to_string()))?;
        with_state(&self.state, |s| s.user = None);
        Ok(())
    }

    /// Reload the profile and mirror it into the stored session.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn load_current_user(&self) -> Result<User, DomainError> {
        let user = tracked(&self.state, self.api.current_user()).await?;
        if let Some(session) = self.sessions.load() {
            let refreshed = Session {
                user: user.clone(),
                ..session
            };
            if let Err(err) = self.sessions.save(&refreshed) {
                warn!(error = %err, "could not persist refreshed profile");
            }
        }
        with_state(&self.state, |s| s.user = Some(user.clone()));
        Ok(user)
    }

    /// Upload a KYC document to the signed-in profile.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn upload_user_document(
        &self,
        file: DocumentUpload,
        document_type: DocumentType,
    ) -> Result<Document, DomainError> {
        let document = tracked(
            &self.state,
            self.api.upload_user_document(document_type, &file),
        )
        .await?;
        with_state(&self.state, |s| {
            if let Some(user) = s.user.as_mut() {
                user.documents.push(document.clone());
            }
        });
        Ok(document)
    }

    /// Change the password after local checks.
    ///
    /// # Errors
    ///
    /// Returns field errors without calling the backend, or the backend
    /// failure.
    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<(), DomainError> {
        let errors = request.validate();
        if !errors.is_empty() {
            return Err(invalid(&errors));
        }
        tracked(&self.state, self.api.change_password(request)).await
    }
}
