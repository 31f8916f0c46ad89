//! Loan terms and the display-only repayment quote.
//!
//! Figures are indicative: the backend computes the authoritative schedule.
//! Amounts are whole currency units and rates are basis points, so the
//! arithmetic stays in integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Annual flat interest rate applied to quotes, in basis points (8.5%).
pub const ANNUAL_RATE_BPS: u64 = 850;

const BPS_PER_UNIT: u128 = 10_000;
const MONTHS_PER_YEAR: u128 = 12;

/// How often instalments fall due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepaymentMethod {
    /// Four instalments a month.
    Weekly,
    /// Two instalments a month.
    #[serde(rename = "Bi-Weekly", alias = "BiWeekly")]
    BiWeekly,
    /// One instalment a month.
    Monthly,
}

impl RepaymentMethod {
    /// Instalments paid over `months`.
    pub const fn installments(self, months: u32) -> u32 {
        match self {
            Self::Weekly => months.saturating_mul(4),
            Self::BiWeekly => months.saturating_mul(2),
            Self::Monthly => months,
        }
    }

    /// Wire label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::BiWeekly => "Bi-Weekly",
            Self::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for RepaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "bi-weekly" | "biweekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!("unknown repayment method: {other}")),
        }
    }
}

/// Declining-balance style quote shown next to the loan step.
///
/// `interest = principal × (annual_rate / 12) × months`, rounded to the
/// nearest unit; the instalment is the total divided by the instalment
/// count, also rounded to the nearest unit.
///
/// # Examples
/// ```
/// use loan_portal::domain::{LoanQuote, RepaymentMethod};
///
/// let quote = LoanQuote::compute(2_000_000, 12, RepaymentMethod::Monthly).expect("quote");
/// assert_eq!(quote.total_interest, 170_000);
/// assert_eq!(quote.total_repayment, 2_170_000);
/// assert_eq!(quote.installment_amount, 180_833);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    /// Amount borrowed.
    pub principal: u64,
    /// Term in months.
    pub months: u32,
    /// Annual rate in basis points.
    pub annual_rate_bps: u64,
    /// Instalment frequency.
    pub method: RepaymentMethod,
    /// Interest over the whole term.
    pub total_interest: u64,
    /// Principal plus interest.
    pub total_repayment: u64,
    /// Number of instalments.
    pub installment_count: u32,
    /// Amount of each instalment.
    pub installment_amount: u64,
}

impl LoanQuote {
    /// Quote at [`ANNUAL_RATE_BPS`]. Returns `None` for a zero term or
    /// amounts too large to represent.
    pub fn compute(principal: u64, months: u32, method: RepaymentMethod) -> Option<Self> {
        Self::compute_with_rate(principal, months, method, ANNUAL_RATE_BPS)
    }

    /// Quote at an explicit annual rate in basis points.
    pub fn compute_with_rate(
        principal: u64,
        months: u32,
        method: RepaymentMethod,
        annual_rate_bps: u64,
    ) -> Option<Self> {
        if months == 0 {
            return None;
        }
        let numerator = u128::from(principal)
            .checked_mul(u128::from(annual_rate_bps))?
            .checked_mul(u128::from(months))?;
        let interest = rounded_div(numerator, BPS_PER_UNIT * MONTHS_PER_YEAR)?;
        let total_interest = u64::try_from(interest).ok()?;
        let total_repayment = principal.checked_add(total_interest)?;
        let installment_count = method.installments(months);
        let installment =
            rounded_div(u128::from(total_repayment), u128::from(installment_count))?;
        Some(Self {
            principal,
            months,
            annual_rate_bps,
            method,
            total_interest,
            total_repayment,
            installment_count,
            installment_amount: u64::try_from(installment).ok()?,
        })
    }
}

/// Division rounding halves up. `None` for a zero denominator or overflow.
fn rounded_div(numerator: u128, denominator: u128) -> Option<u128> {
    numerator
        .checked_add(denominator >> 1)?
        .checked_div(denominator)
}
