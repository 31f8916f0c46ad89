//! HTTP adapters for the loan backend.
//!
//! [`GatewayClient`] carries the bearer token and the one-shot refresh; the
//! API adapters translate port calls into gateway requests.

mod admin;
mod applications;
mod auth;
mod dto;
mod gateway;

pub use admin::HttpAdminApi;
pub use applications::HttpApplicationsApi;
pub use auth::HttpAuthApi;
pub use gateway::{ApiRequest, GatewayClient, RequestBody};
