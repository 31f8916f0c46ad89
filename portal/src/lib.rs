//! Client core for the microfinance loan portal.
//!
//! `domain` holds the session, stores, wizard and admin review logic behind
//! ports; `outbound` adapts those ports to the HTTP API and the local state
//! directory.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod domain;
pub mod outbound;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use settings::{PortalSettings, SettingsError};
