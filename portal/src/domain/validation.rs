//! Field-scoped validation results and shared field checks.
//!
//! Validation is synchronous and never leaves the client. Each failing field
//! maps to one message; the first message recorded for a field wins so the
//! most basic problem (for example "required") is reported before range
//! checks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Map of camelCase field names to human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message unless the field already has one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether `field` failed.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the map itself when any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Record a "required" error when `value` is blank.
pub fn require_text(errors: &mut FieldErrors, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.insert(field, format!("{label} is required"));
    }
}

/// Record a "required" error when `value` is `None`.
pub fn require_some<T>(errors: &mut FieldErrors, field: &str, value: Option<&T>, label: &str) {
    if value.is_none() {
        errors.insert(field, format!("{label} is required"));
    }
}

/// Record errors for a missing value or one outside `min..=max`.
pub fn require_in_range(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<u64>,
    (min, max): (u64, u64),
    label: &str,
) {
    match value {
        None => errors.insert(field, format!("{label} is required")),
        Some(v) if v < min || v > max => {
            errors.insert(field, format!("{label} must be between {min} and {max}"));
        }
        Some(_) => {}
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        // Optional leading +, then 9 to 15 digits with optional spaces.
        Regex::new(r"^\+?[0-9][0-9 ]{7,17}[0-9]$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

/// Whether `value` looks like an email address.
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value.trim())
}

/// Whether `value` looks like a phone number.
pub fn is_valid_phone(value: &str) -> bool {
    let trimmed = value.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    phone_regex().is_match(trimmed) && (9..=15).contains(&digits)
}

/// Record a required/format error for an email field.
pub fn require_email(errors: &mut FieldErrors, field: &str, value: &str, label: &str) {
    require_text(errors, field, value, label);
    if !value.trim().is_empty() && !is_valid_email(value) {
        errors.insert(field, format!("{label} must be a valid email address"));
    }
}

/// Record a required/format error for a phone field.
pub fn require_phone(errors: &mut FieldErrors, field: &str, value: &str, label: &str) {
    require_text(errors, field, value, label);
    if !value.trim().is_empty() && !is_valid_phone(value) {
        errors.insert(field, format!("{label} must be a valid phone number"));
    }
}

/// Whole years between `born` and `today`.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    years
}

/// Whole months between `start` and `today`; negative for future dates.
pub fn months_between(start: NaiveDate, today: NaiveDate) -> i32 {
    let mut months = (today.year() - start.year()) * 12;
    months += i32::try_from(today.month()).unwrap_or(0) - i32::try_from(start.month()).unwrap_or(0);
    if today.day() < start.day() {
        months -= 1;
    }
    months
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[rstest]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.insert("loanAmount", "Loan amount is required");
        errors.insert("loanAmount", "Loan amount must be positive");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("loanAmount"), Some("Loan amount is required"));
    }

    #[rstest]
    #[case(None, Some("Term is required"))]
    #[case(Some(2), Some("Term must be between 3 and 24"))]
    #[case(Some(25), Some("Term must be between 3 and 24"))]
    #[case(Some(3), None)]
    #[case(Some(24), None)]
    fn range_checks_are_inclusive(#[case] value: Option<u64>, #[case] expected: Option<&str>) {
        let mut errors = FieldErrors::new();
        require_in_range(&mut errors, "term", value, (3, 24), "Term");
        assert_eq!(errors.get("term"), expected);
    }

    #[rstest]
    #[case("amina@example.com", true)]
    #[case("amina@example", false)]
    #[case("amina example.com", false)]
    fn email_format(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_valid_email(value), expected);
    }

    #[rstest]
    #[case("+255 712 345 678", true)]
    #[case("0712345678", true)]
    #[case("12345", false)]
    #[case("07123abc78", false)]
    fn phone_format(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_valid_phone(value), expected);
    }

    #[rstest]
    #[case(date(2000, 6, 15), date(2018, 6, 14), 17)]
    #[case(date(2000, 6, 15), date(2018, 6, 15), 18)]
    #[case(date(2000, 2, 29), date(2001, 2, 28), 0)]
    fn age_counts_completed_years(
        #[case] born: NaiveDate,
        #[case] today: NaiveDate,
        #[case] expected: i32,
    ) {
        assert_eq!(age_on(born, today), expected);
    }

    #[rstest]
    #[case(date(2024, 1, 31), date(2024, 7, 30), 5)]
    #[case(date(2024, 1, 31), date(2024, 7, 31), 6)]
    #[case(date(2025, 1, 1), date(2024, 7, 31), -6)]
    fn months_between_counts_completed_months(
        #[case] start: NaiveDate,
        #[case] today: NaiveDate,
        #[case] expected: i32,
    ) {
        assert_eq!(months_between(start, today), expected);
    }

    #[rstest]
    fn display_joins_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("b", "two");
        errors.insert("a", "one");
        assert_eq!(errors.to_string(), "a: one; b: two");
    }
}
