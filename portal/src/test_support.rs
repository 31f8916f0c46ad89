//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Application, ApplicationId, ApplicationPayload, ApplicationStatus, CreditHistory,
    DocumentUpload, PayrollData, RepaymentMethod, Role, Session, SmeData, User, UserId,
};

/// Instant every fixture clock reports.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_now(),
    })
}

pub fn consenting_credit_history() -> CreditHistory {
    CreditHistory {
        credit_reference_consent: true,
        ..CreditHistory::default()
    }
}

/// SME form that passes every step.
pub fn valid_sme() -> SmeData {
    SmeData {
        business_name: "Mama Lishe Foods".to_owned(),
        business_type: "Food vendor".to_owned(),
        registration_number: "BRN-20931".to_owned(),
        business_address: "Kariakoo, Dar es Salaam".to_owned(),
        business_phone: "0712345678".to_owned(),
        months_in_operation: Some(30),
        number_of_employees: Some(4),
        monthly_revenue: Some(900_000),
        loan_amount: Some(2_000_000),
        payback_period_months: Some(12),
        repayment_method: Some(RepaymentMethod::Monthly),
        loan_purpose: "Stock".to_owned(),
        credit_history: consenting_credit_history(),
        ..SmeData::default()
    }
}

/// Payroll form that passes every step on [`fixture_now`].
pub fn valid_payroll() -> PayrollData {
    PayrollData {
        full_name: "Neema Juma".to_owned(),
        date_of_birth: Some(date(1990, 3, 14)),
        national_id: "19900314-12345-00001-22".to_owned(),
        phone_number: "0754000111".to_owned(),
        email: "neema@example.com".to_owned(),
        residential_address: "Sinza, Dar es Salaam".to_owned(),
        next_of_kin_name: "Juma Said".to_owned(),
        next_of_kin_relationship: "Father".to_owned(),
        next_of_kin_phone: "0754000222".to_owned(),
        employer_name: "Tanesco".to_owned(),
        job_title: "Accountant".to_owned(),
        employee_number: "EMP-7781".to_owned(),
        employment_start_date: Some(date(2019, 1, 7)),
        gross_monthly_salary: Some(1_800_000),
        net_monthly_salary: Some(1_250_000),
        loan_amount: Some(5_000_000),
        payback_period_months: Some(24),
        loan_purpose: "Home improvement".to_owned(),
        consent_to_deduction: true,
        payroll_officer_name: "Rehema Ally".to_owned(),
        payroll_officer_contact: "0754000333".to_owned(),
        credit_history: consenting_credit_history(),
    }
}

pub fn application(id: ApplicationId, status: ApplicationStatus) -> Application {
    application_with(id, status, ApplicationPayload::Sme(valid_sme()))
}

pub fn application_with(
    id: ApplicationId,
    status: ApplicationStatus,
    payload: ApplicationPayload,
) -> Application {
    Application {
        id,
        application_type: payload.application_type(),
        status,
        created_at: fixture_now(),
        submitted_at: None,
        applicant_name: Some("Amina Mushi".to_owned()),
        payload,
        documents: Vec::new(),
        audit_logs: Vec::new(),
    }
}

pub fn user(role: Role) -> User {
    User {
        id: UserId::random(),
        email: "amina@example.com".to_owned(),
        first_name: "Amina".to_owned(),
        last_name: "Mushi".to_owned(),
        phone_number: Some("0712345678".to_owned()),
        national_id: None,
        role,
        documents: Vec::new(),
    }
}

pub fn session(role: Role) -> Session {
    Session::new("access-1", "refresh-1", user(role))
}

pub fn upload(name: &str) -> DocumentUpload {
    DocumentUpload::new(name, name.as_bytes().to_vec())
}
