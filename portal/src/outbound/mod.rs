//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed clients for the loan backend
//! - **storage**: file-backed session and draft persistence
//!
//! Adapters are thin translators between domain types and their transport
//! or on-disk representation. They contain no business logic.

pub mod http;
pub mod storage;
