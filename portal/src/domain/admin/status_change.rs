//! Single-application status change form with reason codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::validation::FieldErrors;
use crate::domain::{ApplicationStatus, Role};

/// Closed set of decision reasons. Each code belongs to exactly one target
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Approval: income checked against payslips or statements.
    IncomeVerified,
    /// Approval: clean credit reference.
    GoodCreditHistory,
    /// Approval: collateral covers the principal.
    AdequateCollateral,
    /// Approval: backed by a lending group.
    GroupGuarantee,
    /// Rejection: income too low for the repayment.
    InsufficientIncome,
    /// Rejection: required documents missing or unreadable.
    IncompleteDocuments,
    /// Rejection: adverse credit reference.
    PoorCreditHistory,
    /// Rejection: amount above the product limit.
    ExceedsLimit,
    /// Rejection: identity or employment not verified.
    FailedVerification,
}

impl ReasonCode {
    const APPROVAL: [Self; 4] = [
        Self::IncomeVerified,
        Self::GoodCreditHistory,
        Self::AdequateCollateral,
        Self::GroupGuarantee,
    ];
    const REJECTION: [Self; 5] = [
        Self::InsufficientIncome,
        Self::IncompleteDocuments,
        Self::PoorCreditHistory,
        Self::ExceedsLimit,
        Self::FailedVerification,
    ];

    /// Codes offered for `target`; empty when the target takes none.
    pub const fn for_target(target: ApplicationStatus) -> &'static [Self] {
        match target {
            ApplicationStatus::Approved => &Self::APPROVAL,
            ApplicationStatus::Rejected => &Self::REJECTION,
            _ => &[],
        }
    }

    /// Wire name, also used in the comment prefix.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IncomeVerified => "INCOME_VERIFIED",
            Self::GoodCreditHistory => "GOOD_CREDIT_HISTORY",
            Self::AdequateCollateral => "ADEQUATE_COLLATERAL",
            Self::GroupGuarantee => "GROUP_GUARANTEE",
            Self::InsufficientIncome => "INSUFFICIENT_INCOME",
            Self::IncompleteDocuments => "INCOMPLETE_DOCUMENTS",
            Self::PoorCreditHistory => "POOR_CREDIT_HISTORY",
            Self::ExceedsLimit => "EXCEEDS_LIMIT",
            Self::FailedVerification => "FAILED_VERIFICATION",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::APPROVAL
            .into_iter()
            .chain(Self::REJECTION)
            .find(|code| code.as_str() == wanted)
            .ok_or_else(|| format!("unknown reason code: {s}"))
    }
}

/// Validated body of `PUT /admin/applications/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    /// Target status.
    pub status: ApplicationStatus,
    /// Comment, prefixed with the reason code when one was chosen.
    pub comment: String,
}

/// Editable status change form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeForm {
    current: ApplicationStatus,
    target: Option<ApplicationStatus>,
    reason: Option<ReasonCode>,
    comment: String,
}

impl StatusChangeForm {
    /// Empty form for an application currently in `current`.
    pub fn new(current: ApplicationStatus) -> Self {
        Self {
            current,
            target: None,
            reason: None,
            comment: String::new(),
        }
    }

    /// Pick the target status. A reason that does not apply to the new
    /// target is dropped.
    pub fn set_target(&mut self, target: ApplicationStatus) {
        self.target = Some(target);
        if self
            .reason
            .is_some_and(|reason| !ReasonCode::for_target(target).contains(&reason))
        {
            self.reason = None;
        }
    }

    /// Pick or clear the reason code.
    pub fn set_reason(&mut self, reason: Option<ReasonCode>) {
        self.reason = reason;
    }

    /// Free-text comment.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Whether the chosen target leaves the forward lifecycle.
    pub fn is_override(&self) -> bool {
        self.target
            .is_some_and(|target| !self.current.can_transition_to(target))
    }

    /// Validate for an admin with `role` and build the request body.
    ///
    /// # Errors
    ///
    /// Returns field errors for a missing target or comment, a reason that
    /// does not belong to the target, or an override attempted by a role
    /// that may not override.
    pub fn submit(&self, role: Role) -> Result<StatusChange, FieldErrors> {
        let mut errors = FieldErrors::new();
        let comment = self.comment.trim();
        if comment.is_empty() {
            errors.insert("comment", "Comment is required");
        }
        let Some(target) = self.target else {
            errors.insert("status", "Target status is required");
            return Err(errors);
        };
        if target == self.current {
            errors.insert("status", format!("Application is already {target}"));
        } else if self.is_override() && !role.can_override_status() {
            errors.insert(
                "status",
                format!(
                    "Moving from {} to {target} is an override and needs a tier 2 administrator",
                    self.current
                ),
            );
        }
        if let Some(reason) = self.reason {
            if !ReasonCode::for_target(target).contains(&reason) {
                errors.insert(
                    "reasonCode",
                    format!("{reason} is not a valid reason for {target}"),
                );
            }
        }
        errors.into_result()?;

        let comment = match self.reason {
            Some(reason) => format!("[{reason}] {comment}"),
            None => comment.to_owned(),
        };
        Ok(StatusChange {
            status: target,
            comment,
        })
    }
}
