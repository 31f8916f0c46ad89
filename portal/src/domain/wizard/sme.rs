//! SME wizard steps.

use std::fmt;

use chrono::NaiveDate;

use super::WizardForm;
use crate::domain::validation::FieldErrors;
use crate::domain::{ApplicationPayload, ApplicationType, DocumentType, LoanQuote, SmeData};

/// SME wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmeStep {
    /// Business identity and trading figures.
    Business,
    /// Amount, term and repayment method.
    Loan,
    /// Lending group membership.
    Group,
    /// Existing debt and consent.
    CreditHistory,
    /// Required uploads.
    Documents,
    /// Read-only summary with the quote.
    Review,
}

impl fmt::Display for SmeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Business => "Business details",
            Self::Loan => "Loan details",
            Self::Group => "Group membership",
            Self::CreditHistory => "Credit history",
            Self::Documents => "Documents",
            Self::Review => "Review",
        })
    }
}

impl WizardForm for SmeData {
    type Step = SmeStep;

    const APPLICATION_TYPE: ApplicationType = ApplicationType::Sme;
    const STEPS: &'static [SmeStep] = &[
        SmeStep::Business,
        SmeStep::Loan,
        SmeStep::Group,
        SmeStep::CreditHistory,
        SmeStep::Documents,
        SmeStep::Review,
    ];
    const DOCUMENTS_STEP: SmeStep = SmeStep::Documents;
    const REQUIRED_DOCUMENTS: &'static [DocumentType] = &[
        DocumentType::NationalIdFront,
        DocumentType::NationalIdBack,
        DocumentType::BusinessRegistration,
    ];
    const OPTIONAL_DOCUMENTS: &'static [DocumentType] = &[
        DocumentType::FinancialStatement,
        DocumentType::ProofOfAddress,
        DocumentType::AdditionalDocument,
    ];

    fn validate_step(&self, step: SmeStep, _today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match step {
            SmeStep::Business => self.validate_business(&mut errors),
            SmeStep::Loan => self.validate_loan(&mut errors),
            SmeStep::Group => self.validate_group(&mut errors),
            SmeStep::CreditHistory => self.credit_history.validate(&mut errors),
            SmeStep::Documents | SmeStep::Review => {}
        }
        errors
    }

    fn to_payload(&self) -> ApplicationPayload {
        ApplicationPayload::Sme(self.clone())
    }

    fn from_payload(payload: ApplicationPayload) -> Option<Self> {
        match payload {
            ApplicationPayload::Sme(data) => Some(data),
            ApplicationPayload::Payroll(_) => None,
        }
    }

    fn quote(&self) -> Option<LoanQuote> {
        SmeData::quote(self)
    }
}
