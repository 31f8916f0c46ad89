//! SME loan application payload and its per-section validation rules.

use serde::{Deserialize, Serialize};

use super::credit_history::CreditHistory;
use super::loan_terms::{LoanQuote, RepaymentMethod};
use super::validation::{FieldErrors, require_in_range, require_phone, require_some, require_text};

/// Smallest SME loan, in currency units.
pub const SME_MIN_LOAN: u64 = 100_000;
/// Largest SME loan, in currency units.
pub const SME_MAX_LOAN: u64 = 5_000_000;
/// Shortest SME payback period, in months.
pub const SME_MIN_PAYBACK_MONTHS: u64 = 3;
/// Longest SME payback period, in months.
pub const SME_MAX_PAYBACK_MONTHS: u64 = 24;
/// Minimum time the business must have traded, in months.
pub const SME_MIN_MONTHS_IN_OPERATION: u32 = 6;
/// Smallest lending group accepted.
pub const SME_MIN_GROUP_MEMBERS: u64 = 5;
/// Largest lending group accepted.
pub const SME_MAX_GROUP_MEMBERS: u64 = 30;

/// Business, loan, group and credit facts collected by the SME wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmeData {
    /// Trading name.
    pub business_name: String,
    /// Sector or kind of business.
    pub business_type: String,
    /// Business registration number.
    pub registration_number: String,
    /// Where the business operates.
    pub business_address: String,
    /// Business contact number.
    pub business_phone: String,
    /// Trading history in months.
    pub months_in_operation: Option<u32>,
    /// Headcount.
    pub number_of_employees: Option<u32>,
    /// Average monthly revenue.
    pub monthly_revenue: Option<u64>,

    /// Requested principal.
    pub loan_amount: Option<u64>,
    /// Term in months.
    pub payback_period_months: Option<u32>,
    /// Instalment frequency.
    pub repayment_method: Option<RepaymentMethod>,
    /// What the money is for.
    pub loan_purpose: String,

    /// Whether the applicant borrows through a lending group.
    pub is_group_member: bool,
    /// Group name, for group members.
    pub group_name: String,
    /// Role within the group.
    pub group_role: String,
    /// Group size.
    pub group_member_count: Option<u32>,

    /// Shared credit questions.
    #[serde(flatten)]
    pub credit_history: CreditHistory,
}

impl SmeData {
    /// Business section checks.
    pub fn validate_business(&self, errors: &mut FieldErrors) {
        require_text(errors, "businessName", &self.business_name, "Business name");
        require_text(errors, "businessType", &self.business_type, "Business type");
        require_text(
            errors,
            "registrationNumber",
            &self.registration_number,
            "Registration number",
        );
        require_text(
            errors,
            "businessAddress",
            &self.business_address,
            "Business address",
        );
        require_phone(errors, "businessPhone", &self.business_phone, "Business phone");
        match self.months_in_operation {
            None => errors.insert("monthsInOperation", "Time in operation is required"),
            Some(months) if months < SME_MIN_MONTHS_IN_OPERATION => errors.insert(
                "monthsInOperation",
                format!(
                    "Business must have operated for at least {SME_MIN_MONTHS_IN_OPERATION} months"
                ),
            ),
            Some(_) => {}
        }
        match self.monthly_revenue {
            Some(revenue) if revenue > 0 => {}
            Some(_) => errors.insert("monthlyRevenue", "Monthly revenue must be greater than zero"),
            None => errors.insert("monthlyRevenue", "Monthly revenue is required"),
        }
    }

    /// Loan section checks: absolute amount bounds and payback bounds.
    pub fn validate_loan(&self, errors: &mut FieldErrors) {
        require_in_range(
            errors,
            "loanAmount",
            self.loan_amount,
            (SME_MIN_LOAN, SME_MAX_LOAN),
            "Loan amount",
        );
        require_in_range(
            errors,
            "paybackPeriodMonths",
            self.payback_period_months.map(u64::from),
            (SME_MIN_PAYBACK_MONTHS, SME_MAX_PAYBACK_MONTHS),
            "Payback period",
        );
        require_some(
            errors,
            "repaymentMethod",
            self.repayment_method.as_ref(),
            "Repayment method",
        );
        require_text(errors, "loanPurpose", &self.loan_purpose, "Loan purpose");
    }

    /// Group section checks; only enforced for group members.
    pub fn validate_group(&self, errors: &mut FieldErrors) {
        if !self.is_group_member {
            return;
        }
        require_text(errors, "groupName", &self.group_name, "Group name");
        require_text(errors, "groupRole", &self.group_role, "Group role");
        require_in_range(
            errors,
            "groupMemberCount",
            self.group_member_count.map(u64::from),
            (SME_MIN_GROUP_MEMBERS, SME_MAX_GROUP_MEMBERS),
            "Group member count",
        );
    }

    /// Indicative repayment quote, once amount, term and method are known.
    pub fn quote(&self) -> Option<LoanQuote> {
        LoanQuote::compute(
            self.loan_amount?,
            self.payback_period_months?,
            self.repayment_method?,
        )
    }
}
