//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod admin_api;
mod applications_api;
mod auth_api;
mod confirm;
mod draft_store;
mod gateway_error;
mod session_store;

#[cfg(test)]
pub use admin_api::MockAdminApi;
pub use admin_api::AdminApi;
#[cfg(test)]
pub use applications_api::MockApplicationsApi;
pub use applications_api::ApplicationsApi;
#[cfg(test)]
pub use auth_api::MockAuthApi;
pub use auth_api::AuthApi;
#[cfg(test)]
pub use confirm::MockConfirm;
pub use confirm::{Confirm, FixedConfirm};
#[cfg(test)]
pub use draft_store::MockDraftStore;
pub use draft_store::{DraftStore, DraftStoreError, InMemoryDraftStore};
pub use gateway_error::GatewayError;
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{
    InMemorySessionStore, SESSION_CHANNEL_CAPACITY, SessionStore, SessionStoreError,
    initialize_session_sync,
};
pub(crate) use session_store::publish_change;
