//! Loan application aggregate, its lifecycle and list filters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::AuditLog;
use super::document::Document;
use super::payroll::PayrollData;
use super::sme::SmeData;

/// Backend-assigned application identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(Uuid);

impl ApplicationId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ApplicationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Loan product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationType {
    /// Small and medium enterprise loan.
    Sme,
    /// Salary-backed loan repaid by payroll deduction.
    Payroll,
}

impl ApplicationType {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sme => "SME",
            Self::Payroll => "PAYROLL",
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SME" => Ok(Self::Sme),
            "PAYROLL" => Ok(Self::Payroll),
            other => Err(format!("unknown application type: {other}")),
        }
    }
}

/// Application lifecycle status.
///
/// Forward edges: `DRAFT → SUBMITTED → UNDER_REVIEW → {APPROVED | REJECTED}`
/// and `APPROVED → DISBURSED → {REPAYED | DEFAULTED}`. Any other change is an
/// administrative override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// Being filled in by the applicant.
    Draft,
    /// Handed in; waiting for a reviewer.
    Submitted,
    /// Picked up by a reviewer.
    UnderReview,
    /// Accepted; not yet paid out.
    Approved,
    /// Declined.
    Rejected,
    /// Principal paid out.
    Disbursed,
    /// Fully repaid.
    Repayed,
    /// Written off after missed repayments.
    Defaulted,
}

impl ApplicationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Disbursed,
        Self::Repayed,
        Self::Defaulted,
    ];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Disbursed => "DISBURSED",
            Self::Repayed => "REPAYED",
            Self::Defaulted => "DEFAULTED",
        }
    }

    /// Statuses reachable by one forward step.
    pub const fn next(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Submitted],
            Self::Submitted => &[Self::UnderReview],
            Self::UnderReview => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Disbursed],
            Self::Disbursed => &[Self::Repayed, Self::Defaulted],
            Self::Rejected | Self::Repayed | Self::Defaulted => &[],
        }
    }

    /// Whether `target` is a forward lifecycle step from `self`.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next().contains(&target)
    }

    /// Whether no forward step remains.
    pub fn is_terminal(self) -> bool {
        self.next().is_empty()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown application status: {s}"))
    }
}

/// Type-specific application payload. Exactly one variant per application,
/// matching [`Application::application_type`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationPayload {
    /// SME form data.
    #[serde(rename = "smeData")]
    Sme(SmeData),
    /// Payroll form data.
    #[serde(rename = "payrollData")]
    Payroll(PayrollData),
}

impl ApplicationPayload {
    /// Product this payload belongs to.
    pub const fn application_type(&self) -> ApplicationType {
        match self {
            Self::Sme(_) => ApplicationType::Sme,
            Self::Payroll(_) => ApplicationType::Payroll,
        }
    }

    /// Requested principal, if entered.
    pub const fn loan_amount(&self) -> Option<u64> {
        match self {
            Self::Sme(data) => data.loan_amount,
            Self::Payroll(data) => data.loan_amount,
        }
    }
}

/// Errors raised when decoding an application whose payload does not match
/// its type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplicationShapeError {
    /// Both payloads were present.
    #[error("application {id} carries both SME and payroll payloads")]
    AmbiguousPayload {
        /// Offending application.
        id: ApplicationId,
    },
    /// The payload variant disagrees with `applicationType`.
    #[error("application {id} is {declared} but carries a {actual} payload")]
    MismatchedPayload {
        /// Offending application.
        id: ApplicationId,
        /// Type named in `applicationType`.
        declared: ApplicationType,
        /// Type implied by the payload.
        actual: ApplicationType,
    },
}

/// Loan application aggregate.
///
/// ## Invariants
/// - `payload.application_type() == application_type`.
/// - Owners may edit or delete only `DRAFT` applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ApplicationDto", into = "ApplicationDto")]
pub struct Application {
    /// Backend identifier.
    pub id: ApplicationId,
    /// Loan product.
    pub application_type: ApplicationType,
    /// Lifecycle status.
    pub status: ApplicationStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Submission time; `None` while a draft.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Applicant display name, on admin views.
    pub applicant_name: Option<String>,
    /// Product-specific form data.
    pub payload: ApplicationPayload,
    /// Uploaded documents.
    pub documents: Vec<Document>,
    /// Review history in backend order.
    pub audit_logs: Vec<AuditLog>,
}

impl Application {
    /// Whether the owner may still edit or delete this application.
    pub fn is_owner_editable(&self) -> bool {
        self.status == ApplicationStatus::Draft
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationDto {
    id: ApplicationId,
    application_type: ApplicationType,
    status: ApplicationStatus,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    applicant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sme_data: Option<SmeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payroll_data: Option<PayrollData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    audit_logs: Vec<AuditLog>,
}

impl From<Application> for ApplicationDto {
    fn from(value: Application) -> Self {
        let (sme_data, payroll_data) = match value.payload {
            ApplicationPayload::Sme(data) => (Some(data), None),
            ApplicationPayload::Payroll(data) => (None, Some(data)),
        };
        Self {
            id: value.id,
            application_type: value.application_type,
            status: value.status,
            created_at: value.created_at,
            submitted_at: value.submitted_at,
            applicant_name: value.applicant_name,
            sme_data,
            payroll_data,
            documents: value.documents,
            audit_logs: value.audit_logs,
        }
    }
}

impl TryFrom<ApplicationDto> for Application {
    type Error = ApplicationShapeError;

    fn try_from(value: ApplicationDto) -> Result<Self, Self::Error> {
        let id = value.id;
        let payload = match (value.sme_data, value.payroll_data) {
            (Some(data), None) => ApplicationPayload::Sme(data),
            (None, Some(data)) => ApplicationPayload::Payroll(data),
            // Fresh drafts may be created without any payload.
            (None, None) => match value.application_type {
                ApplicationType::Sme => ApplicationPayload::Sme(SmeData::default()),
                ApplicationType::Payroll => ApplicationPayload::Payroll(PayrollData::default()),
            },
            (Some(_), Some(_)) => return Err(ApplicationShapeError::AmbiguousPayload { id }),
        };
        if payload.application_type() != value.application_type {
            return Err(ApplicationShapeError::MismatchedPayload {
                id,
                declared: value.application_type,
                actual: payload.application_type(),
            });
        }
        Ok(Self {
            id,
            application_type: value.application_type,
            status: value.status,
            created_at: value.created_at,
            submitted_at: value.submitted_at,
            applicant_name: value.applicant_name,
            payload,
            documents: value.documents,
            audit_logs: value.audit_logs,
        })
    }
}

/// Optional filters for the applicant list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilters {
    /// Only this status.
    pub status: Option<ApplicationStatus>,
    /// Only this product.
    pub application_type: Option<ApplicationType>,
    /// Created on or after.
    pub from: Option<NaiveDate>,
    /// Created on or before.
    pub to: Option<NaiveDate>,
    /// Page to fetch; the backend default when unset.
    pub page: Option<PageRequest>,
}

impl ApplicationFilters {
    /// Query pairs for the set filters, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_owned()));
        }
        if let Some(kind) = self.application_type {
            pairs.push(("type", kind.as_str().to_owned()));
        }
        if let Some(from) = self.from {
            pairs.push(("startDate", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("endDate", to.to_string()));
        }
        if let Some(page) = self.page {
            pairs.extend(page.query_pairs());
        }
        pairs
    }
}
