//! Payroll wizard steps.

use std::fmt;

use chrono::NaiveDate;

use super::WizardForm;
use crate::domain::validation::FieldErrors;
use crate::domain::{ApplicationPayload, ApplicationType, DocumentType, LoanQuote, PayrollData};

/// Payroll wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayrollStep {
    /// Identity and contact details.
    Personal,
    /// Emergency contact.
    NextOfKin,
    /// Employer and salary.
    Employment,
    /// Amount, term and purpose.
    Loan,
    /// Deduction consent and payroll officer.
    PayrollDeduction,
    /// Existing debt and consent.
    CreditHistory,
    /// Required uploads.
    Documents,
    /// Read-only summary with the quote.
    Review,
}

impl fmt::Display for PayrollStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Personal => "Personal details",
            Self::NextOfKin => "Next of kin",
            Self::Employment => "Employment",
            Self::Loan => "Loan details",
            Self::PayrollDeduction => "Payroll deduction",
            Self::CreditHistory => "Credit history",
            Self::Documents => "Documents",
            Self::Review => "Review",
        })
    }
}

impl WizardForm for PayrollData {
    type Step = PayrollStep;

    const APPLICATION_TYPE: ApplicationType = ApplicationType::Payroll;
    const STEPS: &'static [PayrollStep] = &[
        PayrollStep::Personal,
        PayrollStep::NextOfKin,
        PayrollStep::Employment,
        PayrollStep::Loan,
        PayrollStep::PayrollDeduction,
        PayrollStep::CreditHistory,
        PayrollStep::Documents,
        PayrollStep::Review,
    ];
    const DOCUMENTS_STEP: PayrollStep = PayrollStep::Documents;
    const REQUIRED_DOCUMENTS: &'static [DocumentType] = &[
        DocumentType::NationalIdFront,
        DocumentType::NationalIdBack,
        DocumentType::EmployerLetter,
        DocumentType::Payslip1,
        DocumentType::Payslip2,
        DocumentType::Payslip3,
    ];
    const OPTIONAL_DOCUMENTS: &'static [DocumentType] = &[
        DocumentType::ProofOfAddress,
        DocumentType::AdditionalDocument,
    ];

    fn validate_step(&self, step: PayrollStep, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();
        match step {
            PayrollStep::Personal => self.validate_personal(today, &mut errors),
            PayrollStep::NextOfKin => self.validate_next_of_kin(&mut errors),
            PayrollStep::Employment => self.validate_employment(today, &mut errors),
            PayrollStep::Loan => self.validate_loan(&mut errors),
            PayrollStep::PayrollDeduction => self.validate_deduction(&mut errors),
            PayrollStep::CreditHistory => self.credit_history.validate(&mut errors),
            PayrollStep::Documents | PayrollStep::Review => {}
        }
        errors
    }

    fn to_payload(&self) -> ApplicationPayload {
        ApplicationPayload::Payroll(self.clone())
    }

    fn from_payload(payload: ApplicationPayload) -> Option<Self> {
        match payload {
            ApplicationPayload::Payroll(data) => Some(data),
            ApplicationPayload::Sme(_) => None,
        }
    }

    fn quote(&self) -> Option<LoanQuote> {
        PayrollData::quote(self)
    }
}
