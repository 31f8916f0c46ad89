//! Payroll (salary-deduction) loan application payload and its rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::credit_history::CreditHistory;
use super::loan_terms::{LoanQuote, RepaymentMethod};
use super::validation::{
    FieldErrors, age_on, months_between, require_email, require_in_range, require_phone,
    require_text,
};

/// Youngest eligible applicant, in years.
pub const PAYROLL_MIN_AGE: i32 = 18;
/// Oldest eligible applicant, in years.
pub const PAYROLL_MAX_AGE: i32 = 60;
/// Minimum time with the current employer, in months.
pub const PAYROLL_MIN_TENURE_MONTHS: i32 = 6;
/// Loan ceiling as a multiple of net monthly salary.
pub const PAYROLL_SALARY_MULTIPLE: u64 = 24;
/// Shortest payroll payback period, in months.
pub const PAYROLL_MIN_PAYBACK_MONTHS: u64 = 1;
/// Longest payroll payback period, in months.
pub const PAYROLL_MAX_PAYBACK_MONTHS: u64 = 36;

/// Personal, next-of-kin, employment, loan and deduction facts collected by
/// the payroll wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayrollData {
    /// Name as on the national ID.
    pub full_name: String,
    /// Used for the age check.
    pub date_of_birth: Option<NaiveDate>,
    /// National ID number.
    pub national_id: String,
    /// Applicant mobile number.
    pub phone_number: String,
    /// Contact email.
    pub email: String,
    /// Home address.
    pub residential_address: String,

    /// Emergency contact.
    pub next_of_kin_name: String,
    /// How they are related.
    pub next_of_kin_relationship: String,
    /// Their phone number.
    pub next_of_kin_phone: String,

    /// Current employer.
    pub employer_name: String,
    /// Position held.
    pub job_title: String,
    /// Payroll or staff number.
    pub employee_number: String,
    /// Start with the current employer; drives the tenure check.
    pub employment_start_date: Option<NaiveDate>,
    /// Salary before deductions.
    pub gross_monthly_salary: Option<u64>,
    /// Take-home pay; caps the loan amount.
    pub net_monthly_salary: Option<u64>,

    /// Requested principal.
    pub loan_amount: Option<u64>,
    /// Term in months.
    pub payback_period_months: Option<u32>,
    /// What the money is for.
    pub loan_purpose: String,

    /// Consent to repay through payroll deduction.
    pub consent_to_deduction: bool,
    /// Employer contact who handles deductions.
    pub payroll_officer_name: String,
    /// Their phone or email.
    pub payroll_officer_contact: String,

    /// Shared credit questions.
    #[serde(flatten)]
    pub credit_history: CreditHistory,
}

impl PayrollData {
    /// Personal section checks, including the age window.
    pub fn validate_personal(&self, today: NaiveDate, errors: &mut FieldErrors) {
        require_text(errors, "fullName", &self.full_name, "Full name");
        require_text(errors, "nationalId", &self.national_id, "National ID");
        require_phone(errors, "phoneNumber", &self.phone_number, "Phone number");
        require_email(errors, "email", &self.email, "Email");
        require_text(
            errors,
            "residentialAddress",
            &self.residential_address,
            "Residential address",
        );
        match self.date_of_birth {
            None => errors.insert("dateOfBirth", "Date of birth is required"),
            Some(born) => {
                let age = age_on(born, today);
                if !(PAYROLL_MIN_AGE..=PAYROLL_MAX_AGE).contains(&age) {
                    errors.insert(
                        "dateOfBirth",
                        format!(
                            "Applicant must be between {PAYROLL_MIN_AGE} and {PAYROLL_MAX_AGE} years old"
                        ),
                    );
                }
            }
        }
    }

    /// Next-of-kin section checks.
    pub fn validate_next_of_kin(&self, errors: &mut FieldErrors) {
        require_text(errors, "nextOfKinName", &self.next_of_kin_name, "Next of kin name");
        require_text(
            errors,
            "nextOfKinRelationship",
            &self.next_of_kin_relationship,
            "Relationship",
        );
        require_phone(
            errors,
            "nextOfKinPhone",
            &self.next_of_kin_phone,
            "Next of kin phone",
        );
        if !self.phone_number.trim().is_empty()
            && self.phone_number.trim() == self.next_of_kin_phone.trim()
        {
            errors.insert(
                "nextOfKinPhone",
                "Next of kin phone must differ from the applicant's phone",
            );
        }
    }

    /// Employment section checks, including minimum tenure and salary sanity.
    pub fn validate_employment(&self, today: NaiveDate, errors: &mut FieldErrors) {
        require_text(errors, "employerName", &self.employer_name, "Employer name");
        require_text(errors, "jobTitle", &self.job_title, "Job title");
        require_text(errors, "employeeNumber", &self.employee_number, "Employee number");
        match self.employment_start_date {
            None => errors.insert("employmentStartDate", "Employment start date is required"),
            Some(start) if months_between(start, today) < PAYROLL_MIN_TENURE_MONTHS => {
                errors.insert(
                    "employmentStartDate",
                    format!(
                        "At least {PAYROLL_MIN_TENURE_MONTHS} months with the current employer is required"
                    ),
                );
            }
            Some(_) => {}
        }
        match (self.gross_monthly_salary, self.net_monthly_salary) {
            (None, _) => errors.insert("grossMonthlySalary", "Gross monthly salary is required"),
            (_, None) => errors.insert("netMonthlySalary", "Net monthly salary is required"),
            (Some(_), Some(0)) => errors.insert(
                "netMonthlySalary",
                "Net monthly salary must be greater than zero",
            ),
            (Some(gross), Some(net)) if net > gross => errors.insert(
                "netMonthlySalary",
                "Net monthly salary cannot exceed gross salary",
            ),
            _ => {}
        }
    }

    /// Largest loan allowed by the salary multiple, once net salary is known.
    pub fn loan_ceiling(&self) -> Option<u64> {
        self.net_monthly_salary
            .map(|net| net.saturating_mul(PAYROLL_SALARY_MULTIPLE))
    }

    /// Loan section checks: positive amount under the salary ceiling and
    /// payback bounds.
    pub fn validate_loan(&self, errors: &mut FieldErrors) {
        match (self.loan_amount, self.loan_ceiling()) {
            (None, _) => errors.insert("loanAmount", "Loan amount is required"),
            (Some(0), _) => errors.insert("loanAmount", "Loan amount must be greater than zero"),
            (Some(_), None) => errors.insert(
                "loanAmount",
                "Net monthly salary is required to check the loan limit",
            ),
            (Some(amount), Some(ceiling)) if amount > ceiling => errors.insert(
                "loanAmount",
                format!(
                    "Loan amount cannot exceed {PAYROLL_SALARY_MULTIPLE} times net monthly salary ({ceiling})"
                ),
            ),
            _ => {}
        }
        require_in_range(
            errors,
            "paybackPeriodMonths",
            self.payback_period_months.map(u64::from),
            (PAYROLL_MIN_PAYBACK_MONTHS, PAYROLL_MAX_PAYBACK_MONTHS),
            "Payback period",
        );
        require_text(errors, "loanPurpose", &self.loan_purpose, "Loan purpose");
    }

    /// Payroll deduction section checks.
    pub fn validate_deduction(&self, errors: &mut FieldErrors) {
        if !self.consent_to_deduction {
            errors.insert(
                "consentToDeduction",
                "Consent to payroll deduction is required",
            );
        }
        require_text(
            errors,
            "payrollOfficerName",
            &self.payroll_officer_name,
            "Payroll officer name",
        );
        require_phone(
            errors,
            "payrollOfficerContact",
            &self.payroll_officer_contact,
            "Payroll officer contact",
        );
    }

    /// Indicative repayment quote; payroll loans are repaid monthly.
    pub fn quote(&self) -> Option<LoanQuote> {
        LoanQuote::compute(
            self.loan_amount?,
            self.payback_period_months?,
            RepaymentMethod::Monthly,
        )
    }
}
