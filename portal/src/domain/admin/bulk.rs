//! Bulk approve/reject over the current selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{ApplicationId, ApplicationStatus};

/// Warning shown when the backend reports that part of a batch failed.
pub const PARTIAL_FAILURE_WARNING: &str =
    "Some applications could not be updated. Refresh and check their status.";

/// Batch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkAction {
    /// Move every selected application to `APPROVED`.
    Approve,
    /// Move every selected application to `REJECTED`.
    Reject,
}

impl BulkAction {
    /// Status every selected application moves to.
    pub const fn target_status(self) -> ApplicationStatus {
        match self {
            Self::Approve => ApplicationStatus::Approved,
            Self::Reject => ApplicationStatus::Rejected,
        }
    }

    /// Prompt shown before the batch is sent.
    pub fn prompt(self, count: usize) -> String {
        let verb = match self {
            Self::Approve => "Approve",
            Self::Reject => "Reject",
        };
        let noun = if count == 1 { "application" } else { "applications" };
        format!("{verb} {count} selected {noun}?")
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => f.write_str("APPROVE"),
            Self::Reject => f.write_str("REJECT"),
        }
    }
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPROVE" | "APPROVED" => Ok(Self::Approve),
            "REJECT" | "REJECTED" => Ok(Self::Reject),
            other => Err(format!("unknown bulk action: {other}")),
        }
    }
}

/// Body of `PUT /admin/applications/status/bulk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    /// Applications to update.
    pub application_ids: Vec<ApplicationId>,
    /// Status they all move to.
    pub status: ApplicationStatus,
}

/// Counts reported by the backend. Missing counts read as zero; the client
/// never learns which ids failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkStatusResult {
    /// Applications the backend updated.
    pub updated_count: u32,
    /// Applications the backend could not update.
    pub failed_count: u32,
}

/// What a bulk action ended as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Nothing was selected; no request was sent.
    NothingSelected,
    /// The operator declined the confirmation; no request was sent.
    Cancelled,
    /// Every selected application was updated.
    Completed {
        /// Applications updated.
        count: usize,
    },
    /// Some updates failed. The warning is generic.
    PartiallyFailed {
        /// Text to show the operator.
        warning: String,
    },
}

impl BulkOutcome {
    /// Classify a backend result for `requested` ids.
    pub fn from_result(requested: usize, result: BulkStatusResult) -> Self {
        if result.failed_count > 0 {
            Self::PartiallyFailed {
                warning: PARTIAL_FAILURE_WARNING.to_owned(),
            }
        } else {
            Self::Completed { count: requested }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn request_serialises_ids_and_status() {
        let id = ApplicationId::random();
        let body = serde_json::to_value(BulkStatusRequest {
            application_ids: vec![id],
            status: BulkAction::Approve.target_status(),
        })
        .expect("serialises");
        assert_eq!(body["status"], "APPROVED");
        assert_eq!(body["applicationIds"][0], id.to_string());
    }

    #[rstest]
    #[case(BulkStatusResult { updated_count: 3, failed_count: 0 }, BulkOutcome::Completed { count: 3 })]
    #[case(
        BulkStatusResult { updated_count: 2, failed_count: 1 },
        BulkOutcome::PartiallyFailed { warning: PARTIAL_FAILURE_WARNING.to_owned() }
    )]
    fn classifies_results(#[case] result: BulkStatusResult, #[case] expected: BulkOutcome) {
        assert_eq!(BulkOutcome::from_result(3, result), expected);
    }

    #[rstest]
    fn empty_response_body_counts_as_success() {
        let result: BulkStatusResult = serde_json::from_str("{}").expect("decodes");
        assert_eq!(BulkOutcome::from_result(2, result), BulkOutcome::Completed { count: 2 });
    }

    #[rstest]
    fn prompt_pluralises() {
        assert_eq!(BulkAction::Reject.prompt(1), "Reject 1 selected application?");
        assert_eq!(BulkAction::Approve.prompt(3), "Approve 3 selected applications?");
    }
}
