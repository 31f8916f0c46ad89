//! Applicant-side applications store.
//!
//! Holds the signed-in user's application list, the application being
//! viewed, and the shared loading/error status. Every operation goes
//! through [`ApplicationsApi`]; readers take immutable snapshots.

use std::sync::{Arc, Mutex};

use pagination::PageMeta;
use tracing::{debug, warn};

use super::ports::ApplicationsApi;
use super::request_status::{HasRequestStatus, RequestStatus, tracked, with_state};
use super::{
    Application, ApplicationFilters, ApplicationId, ApplicationPayload, ApplicationType,
    Document, DocumentType, DocumentUpload, DomainError, PayrollData, SmeData,
};

/// Immutable copy of the store state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationsState {
    /// Applications on the current page.
    pub applications: Vec<Application>,
    /// Application last fetched by id.
    pub current: Option<Application>,
    /// Paging metadata of `applications`.
    pub page: PageMeta,
    /// Filters of the last list call.
    pub filters: ApplicationFilters,
    /// Loading flag and last error.
    pub status: RequestStatus,
}

impl HasRequestStatus for ApplicationsState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

impl ApplicationsState {
    fn upsert(&mut self, application: &Application) {
        if let Some(slot) = self
            .applications
            .iter_mut()
            .find(|existing| existing.id == application.id)
        {
            *slot = application.clone();
        }
        self.current = Some(application.clone());
    }

    fn known(&self, id: ApplicationId) -> Option<&Application> {
        self.current
            .iter()
            .chain(self.applications.iter())
            .find(|application| application.id == id)
    }
}

/// Store over the applicant endpoints.
pub struct ApplicationsStore {
    api: Arc<dyn ApplicationsApi>,
    state: Mutex<ApplicationsState>,
}

impl ApplicationsStore {
    /// Empty store.
    pub fn new(api: Arc<dyn ApplicationsApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ApplicationsState::default()),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ApplicationsState {
        with_state(&self.state, |s| s.clone())
    }

    /// Forget the last error before a retry.
    pub fn clear_error(&self) {
        with_state(&self.state, |s| s.status.clear_error());
    }

    /// Load the list for `filters` and remember them for later refreshes.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn fetch_applications(
        &self,
        filters: ApplicationFilters,
    ) -> Result<Vec<Application>, DomainError> {
        let page = tracked(&self.state, self.api.list(&filters)).await?;
        debug!(count = page.items.len(), "applications loaded");
        with_state(&self.state, |s| {
            s.applications.clone_from(&page.items);
            s.page = page.meta;
            s.filters = filters;
        });
        Ok(page.items)
    }

    /// Reload the list with the last filters.
    ///
    /// # Errors
    ///
    /// See [`ApplicationsStore::fetch_applications`].
    pub async fn refresh(&self) -> Result<Vec<Application>, DomainError> {
        let filters = with_state(&self.state, |s| s.filters.clone());
        self.fetch_applications(filters).await
    }

    /// Load one application as the current one.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn fetch_application_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Application, DomainError> {
        let application = tracked(&self.state, self.api.get(id)).await?;
        with_state(&self.state, |s| s.upsert(&application));
        Ok(application)
    }

    /// Create an empty draft of `kind`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn create_draft_application(
        &self,
        kind: ApplicationType,
    ) -> Result<Application, DomainError> {
        let application = tracked(&self.state, self.api.create_draft(kind)).await?;
        with_state(&self.state, |s| {
            s.applications.insert(0, application.clone());
            s.current = Some(application.clone());
        });
        Ok(application)
    }

    async fn create(&self, payload: ApplicationPayload) -> Result<Application, DomainError> {
        let application = tracked(&self.state, self.api.create(&payload)).await?;
        with_state(&self.state, |s| {
            s.applications.insert(0, application.clone());
            s.current = Some(application.clone());
        });
        Ok(application)
    }

    /// Create an SME application from `data`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn create_sme_application(&self, data: SmeData) -> Result<Application, DomainError> {
        self.create(ApplicationPayload::Sme(data)).await
    }

    /// Create a payroll application from `data`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn create_payroll_application(
        &self,
        data: PayrollData,
    ) -> Result<Application, DomainError> {
        self.create(ApplicationPayload::Payroll(data)).await
    }

    /// Replace the payload of application `id`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn update_application(
        &self,
        id: ApplicationId,
        payload: ApplicationPayload,
    ) -> Result<Application, DomainError> {
        let application = tracked(&self.state, self.api.update(id, &payload)).await?;
        with_state(&self.state, |s| s.upsert(&application));
        Ok(application)
    }

    /// Replace the SME payload of application `id`.
    ///
    /// # Errors
    ///
    /// See [`ApplicationsStore::update_application`].
    pub async fn update_sme_application(
        &self,
        id: ApplicationId,
        data: SmeData,
    ) -> Result<Application, DomainError> {
        self.update_application(id, ApplicationPayload::Sme(data))
            .await
    }

    /// Replace the payroll payload of application `id`.
    ///
    /// # Errors
    ///
    /// See [`ApplicationsStore::update_application`].
    pub async fn update_payroll_application(
        &self,
        id: ApplicationId,
        data: PayrollData,
    ) -> Result<Application, DomainError> {
        self.update_application(id, ApplicationPayload::Payroll(data))
            .await
    }

    /// Upload one document against application `id`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn upload_document(
        &self,
        id: ApplicationId,
        file: DocumentUpload,
        document_type: DocumentType,
    ) -> Result<Document, DomainError> {
        let document = tracked(
            &self.state,
            self.api.upload_document(id, document_type, &file),
        )
        .await?;
        with_state(&self.state, |s| {
            if let Some(current) = s.current.as_mut().filter(|current| current.id == id) {
                current.documents.push(document.clone());
            }
        });
        Ok(document)
    }

    /// Submit application `id`, then refresh the list.
    ///
    /// # Errors
    ///
    /// Returns the submit failure. A failed refresh afterwards is only
    /// recorded as the last error.
    pub async fn submit_application(&self, id: ApplicationId) -> Result<Application, DomainError> {
        let application = tracked(&self.state, self.api.submit(id)).await?;
        with_state(&self.state, |s| s.upsert(&application));
        self.refresh_quietly().await;
        Ok(application)
    }

    /// Delete draft `id`, then refresh the list.
    ///
    /// Only drafts may be deleted by their owner. The status is checked
    /// locally first, fetching the application when it is not cached.
    ///
    /// # Errors
    ///
    /// Returns a conflict error for non-draft applications, or the backend
    /// failure.
    pub async fn delete_application(&self, id: ApplicationId) -> Result<(), DomainError> {
        let cached = with_state(&self.state, |s| s.known(id).cloned());
        let application = match cached {
            Some(application) => application,
            None => tracked(&self.state, self.api.get(id)).await?,
        };
        if !application.is_owner_editable() {
            let error = DomainError::conflict(format!(
                "only draft applications can be deleted; this one is {}",
                application.status
            ));
            with_state(&self.state, |s| s.status.record_error(error.message()));
            return Err(error);
        }

        tracked(&self.state, self.api.delete(id)).await?;
        with_state(&self.state, |s| {
            s.applications.retain(|application| application.id != id);
            if s.current.as_ref().is_some_and(|current| current.id == id) {
                s.current = None;
            }
        });
        self.refresh_quietly().await;
        Ok(())
    }

    async fn refresh_quietly(&self) {
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "list refresh after mutation failed");
        }
    }
}
