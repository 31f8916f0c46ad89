//! Self-reported credit history shared by both application types.

use serde::{Deserialize, Serialize};

use super::validation::{FieldErrors, require_text};

/// Credit history flags with their conditional detail fields.
///
/// ## Invariants
/// - `outstanding_loan_details` and a positive `outstanding_loan_amount` are
///   required iff `has_outstanding_loans`.
/// - `default_explanation` is required iff `has_defaulted_before`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreditHistory {
    /// Whether other loans are still being repaid.
    pub has_outstanding_loans: bool,
    /// Lenders and terms of those loans.
    pub outstanding_loan_details: String,
    /// Total still owed on them.
    pub outstanding_loan_amount: Option<u64>,
    /// Whether the applicant ever defaulted.
    pub has_defaulted_before: bool,
    /// What happened, when they did.
    pub default_explanation: String,
    /// Consent to a credit bureau check; must be given to submit.
    pub credit_reference_consent: bool,
}

impl CreditHistory {
    /// Record conditional-field errors into `errors`.
    pub fn validate(&self, errors: &mut FieldErrors) {
        if self.has_outstanding_loans {
            require_text(
                errors,
                "outstandingLoanDetails",
                &self.outstanding_loan_details,
                "Outstanding loan details",
            );
            match self.outstanding_loan_amount {
                Some(amount) if amount > 0 => {}
                Some(_) => errors.insert(
                    "outstandingLoanAmount",
                    "Outstanding loan amount must be greater than zero",
                ),
                None => errors.insert(
                    "outstandingLoanAmount",
                    "Outstanding loan amount is required",
                ),
            }
        }
        if self.has_defaulted_before {
            require_text(
                errors,
                "defaultExplanation",
                &self.default_explanation,
                "Default explanation",
            );
        }
        if !self.credit_reference_consent {
            errors.insert(
                "creditReferenceConsent",
                "Consent to a credit reference check is required",
            );
        }
    }
}
