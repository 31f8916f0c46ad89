//! Admin review board: debounced list, selection, bulk and single-item
//! actions over [`AdminApi`].

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use pagination::PageMeta;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::bulk::{BulkAction, BulkOutcome, BulkStatusRequest};
use super::debounce::{Debouncer, Sleeper};
use super::field_edit::FieldEdit;
use super::query::AdminQuery;
use super::status_change::StatusChangeForm;
use crate::domain::ports::{AdminApi, Confirm};
use crate::domain::request_status::{HasRequestStatus, RequestStatus, tracked, with_state};
use crate::domain::{Application, ApplicationId, ApplicationStatus, DomainError, Role};

/// Immutable copy of the board state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminState {
    /// Filters, sort and page driving the list.
    pub query: AdminQuery,
    /// Rows of the current page.
    pub rows: Vec<Application>,
    /// Paging metadata of `rows`.
    pub page: PageMeta,
    /// Ids chosen for a bulk action.
    pub selected: BTreeSet<ApplicationId>,
    /// Application opened for review.
    pub current: Option<Application>,
    /// Warning left by a partially failed bulk action.
    pub warning: Option<String>,
    /// Loading flag and last error.
    pub status: RequestStatus,
}

impl HasRequestStatus for AdminState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

/// How a query change ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A newer change arrived within the window; nothing was fetched.
    Superseded,
    /// The list was fetched and applied.
    Fetched {
        /// Rows received.
        count: usize,
    },
}

/// Admin review workflow.
pub struct AdminBoard {
    api: Arc<dyn AdminApi>,
    role: Role,
    debouncer: Debouncer,
    state: Mutex<AdminState>,
}

impl AdminBoard {
    /// Board for an administrator with `role`, re-fetching after
    /// `debounce` of quiet.
    pub fn new(
        api: Arc<dyn AdminApi>,
        role: Role,
        sleeper: Arc<dyn Sleeper>,
        debounce: std::time::Duration,
    ) -> Self {
        Self {
            api,
            role,
            debouncer: Debouncer::new(sleeper, debounce),
            state: Mutex::new(AdminState::default()),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AdminState {
        with_state(&self.state, |s| s.clone())
    }

    /// Dismiss the last error and any bulk warning.
    pub fn clear_error(&self) {
        with_state(&self.state, |s| {
            s.status.clear_error();
            s.warning = None;
        });
    }

    /// Fetch the list for the current query now.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn refresh(&self) -> Result<usize, DomainError> {
        let ticket = self.debouncer.bump();
        self.fetch(ticket).await
    }

    async fn fetch(&self, ticket: u64) -> Result<usize, DomainError> {
        let query = with_state(&self.state, |s| s.query.clone());
        let page = tracked(&self.state, self.api.list(&query)).await?;
        let count = page.items.len();
        with_state(&self.state, |s| {
            // A newer query may have been issued while this one was in flight.
            if self.debouncer.is_current(ticket) {
                s.rows = page.items;
                s.page = page.meta;
            }
        });
        debug!(count, "admin list loaded");
        Ok(count)
    }

    /// Apply `change` to the query and re-fetch once the debounce window
    /// passes without a newer change.
    ///
    /// # Errors
    ///
    /// Returns the backend failure of the fetch, if one was issued.
    pub async fn change_query(
        &self,
        change: impl FnOnce(&mut AdminQuery),
    ) -> Result<RefreshOutcome, DomainError> {
        with_state(&self.state, |s| change(&mut s.query));
        let ticket = self.debouncer.bump();
        if !self.debouncer.settle(ticket).await {
            return Ok(RefreshOutcome::Superseded);
        }
        let count = self.fetch(ticket).await?;
        Ok(RefreshOutcome::Fetched { count })
    }

    /// Toggle selection of one row.
    pub fn toggle_selected(&self, id: ApplicationId) {
        with_state(&self.state, |s| {
            if !s.selected.remove(&id) {
                s.selected.insert(id);
            }
        });
    }

    /// Select every visible row.
    pub fn select_all_visible(&self) {
        with_state(&self.state, |s| {
            let ids: Vec<_> = s.rows.iter().map(|row| row.id).collect();
            s.selected.extend(ids);
        });
    }

    /// Deselect everything.
    pub fn clear_selection(&self) {
        with_state(&self.state, |s| s.selected.clear());
    }

    /// Approve or reject every selected application in one request.
    ///
    /// Asks `confirm` first. Afterwards the list is refreshed and the
    /// selection cleared; a partial failure leaves a generic warning.
    /// Below tier 2 every selected application must be one forward
    /// lifecycle step from the target.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error naming the ids that would need an
    /// override, or the backend failure of the batch call. The selection is
    /// kept either way.
    pub async fn bulk(
        &self,
        action: BulkAction,
        confirm: &dyn Confirm,
    ) -> Result<BulkOutcome, DomainError> {
        let ids: Vec<ApplicationId> =
            with_state(&self.state, |s| s.selected.iter().copied().collect());
        if ids.is_empty() {
            return Ok(BulkOutcome::NothingSelected);
        }
        let target = action.target_status();
        let blocked = self.overrides_among(&ids, target).await?;
        if !blocked.is_empty() {
            let message = format!(
                "{} selected applications cannot move to {target} without a tier-2 override",
                blocked.len()
            );
            return Err(DomainError::invalid_request(message)
                .with_details(json!({ "applicationIds": blocked })));
        }
        if !confirm.confirm(&action.prompt(ids.len())).await {
            return Ok(BulkOutcome::Cancelled);
        }

        let request = BulkStatusRequest {
            application_ids: ids,
            status: target,
        };
        let result = tracked(&self.state, self.api.bulk_update_status(&request)).await?;
        let outcome = BulkOutcome::from_result(request.application_ids.len(), result);
        info!(%action, requested = request.application_ids.len(), ?outcome, "bulk status change");

        with_state(&self.state, |s| {
            s.selected.clear();
            s.warning = match &outcome {
                BulkOutcome::PartiallyFailed { warning } => Some(warning.clone()),
                _ => None,
            };
        });
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "refresh after bulk action failed");
        }
        Ok(outcome)
    }

    /// Selected ids whose move to `target` would be an override this role
    /// may not perform. Ids not on the loaded page are fetched.
    async fn overrides_among(
        &self,
        ids: &[ApplicationId],
        target: ApplicationStatus,
    ) -> Result<Vec<ApplicationId>, DomainError> {
        if self.role.can_override_status() {
            return Ok(Vec::new());
        }
        let known = with_state(&self.state, |s| {
            ids.iter()
                .map(|id| {
                    let status = s
                        .rows
                        .iter()
                        .chain(s.current.iter())
                        .find(|row| row.id == *id)
                        .map(|row| row.status);
                    (*id, status)
                })
                .collect::<Vec<_>>()
        });
        let mut blocked = Vec::new();
        for (id, listed) in known {
            let current = match listed {
                Some(status) => status,
                None => tracked(&self.state, self.api.get(id)).await?.status,
            };
            if !current.can_transition_to(target) {
                blocked.push(id);
            }
        }
        Ok(blocked)
    }

    /// Open one application for review.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn open(&self, id: ApplicationId) -> Result<Application, DomainError> {
        let application = tracked(&self.state, self.api.get(id)).await?;
        with_state(&self.state, |s| s.current = Some(application.clone()));
        Ok(application)
    }

    /// Blank status form for the open application.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when nothing is open.
    pub fn status_form(&self) -> Result<StatusChangeForm, DomainError> {
        with_state(&self.state, |s| {
            s.current
                .as_ref()
                .map(|current| StatusChangeForm::new(current.status))
                .ok_or_else(|| DomainError::invalid_request("no application is open"))
        })
    }

    /// Validate `form` for this admin's role and send it.
    ///
    /// # Errors
    ///
    /// Returns field errors as an invalid-request error, or the backend
    /// failure.
    pub async fn change_status(
        &self,
        id: ApplicationId,
        form: &StatusChangeForm,
    ) -> Result<Application, DomainError> {
        let change = form.submit(self.role).map_err(|errors| {
            DomainError::invalid_request(errors.to_string())
                .with_details(serde_json::to_value(&errors).unwrap_or_default())
        })?;
        if form.is_override() {
            info!(%id, status = %change.status, "status override");
        }
        let application = tracked(&self.state, self.api.update_status(id, &change)).await?;
        with_state(&self.state, |s| {
            if let Some(row) = s.rows.iter_mut().find(|row| row.id == id) {
                row.status = application.status;
            }
            s.current = Some(application.clone());
        });
        Ok(application)
    }

    /// Optimistically set one payload field of the open application.
    ///
    /// The local copy changes immediately. On success the application is
    /// re-fetched to reconcile; on failure the field reverts.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing is open, the field or value is invalid,
    /// or the backend rejects the change.
    pub async fn edit_field(&self, field: &str, value: Value) -> Result<Application, DomainError> {
        let edit = with_state(&self.state, |s| -> Result<FieldEdit, DomainError> {
            let current = s
                .current
                .as_mut()
                .ok_or_else(|| DomainError::invalid_request("no application is open"))?;
            let edit = FieldEdit::begin(current, field)?;
            edit.apply(current, &value)?;
            Ok(edit)
        })?;
        let id = edit.application_id();

        let patch = edit.patch_body(&value);
        if let Err(err) = tracked(&self.state, self.api.patch_data(id, &patch)).await {
            warn!(%id, field = edit.field(), error = %err, "field edit rejected; reverting");
            with_state(&self.state, |s| {
                if let Some(current) = s.current.as_mut().filter(|current| current.id == id) {
                    if let Err(revert) = edit.revert(current) {
                        warn!(error = %revert, "could not revert field edit");
                    }
                }
            });
            return Err(err);
        }
        self.open(id).await
    }

    /// CSV of every application matching the current filters.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, also recorded as the last error.
    pub async fn export_csv(&self) -> Result<Vec<u8>, DomainError> {
        let query = with_state(&self.state, |s| s.query.clone());
        tracked(&self.state, self.api.export_csv(&query)).await
    }
}

#[cfg(test)]
mod tests;
