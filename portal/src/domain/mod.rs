//! Domain primitives, aggregates and client-side workflows.
//!
//! Purpose: Define the loan portal's strongly typed entities, the ports the
//! outbound adapters implement, and the stores and workflows built on them.
//! Serialisation contracts (serde, camelCase on the wire) are documented on
//! each type.
//!
//! Public surface:
//! - DomainError / ErrorCode: failure payload shared by every layer.
//! - Application and its payloads, filters and status machine.
//! - Session and Token: persisted credentials.
//! - Wizard / WizardCoordinator: multi-step application forms.
//! - ApplicationsStore / AuthStore: remote state with loading and error.
//! - admin: review board, bulk actions and status changes.

pub mod admin;
pub mod application;
pub mod applications_store;
pub mod audit;
pub mod auth;
pub mod auth_store;
pub mod credit_history;
pub mod document;
pub mod error;
pub mod loan_terms;
pub mod payroll;
pub mod ports;
pub(crate) mod request_status;
pub mod session;
pub mod sme;
pub mod user;
pub mod validation;
pub mod wizard;

pub use self::application::{
    Application, ApplicationFilters, ApplicationId, ApplicationPayload, ApplicationShapeError,
    ApplicationStatus, ApplicationType,
};
pub use self::applications_store::{ApplicationsState, ApplicationsStore};
pub use self::audit::{AuditAction, AuditLog};
pub use self::auth::{
    AuthGrant, ChangePasswordRequest, LoginCredentials, LoginValidationError, MIN_PASSWORD_LEN,
    Registration,
};
pub use self::auth_store::{AuthState, AuthStore};
pub use self::credit_history::CreditHistory;
pub use self::document::{Document, DocumentId, DocumentType, DocumentUpload, UnknownDocumentType};
pub use self::error::{DomainError, ErrorCode};
pub use self::loan_terms::{ANNUAL_RATE_BPS, LoanQuote, RepaymentMethod};
pub use self::payroll::PayrollData;
pub use self::request_status::RequestStatus;
pub use self::session::{ClearReason, Session, SessionChange, Token};
pub use self::sme::SmeData;
pub use self::user::{Role, User, UserId, UserValidationError};
pub use self::validation::FieldErrors;
pub use self::wizard::{
    DraftSnapshot, PayrollStep, SmeStep, SubmissionReceipt, SubmitError, Wizard,
    WizardCoordinator, WizardForm,
};

/// Convenient domain result alias.
pub type DomainResult<T> = Result<T, DomainError>;
