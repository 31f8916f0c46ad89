//! Authentication inputs: login credentials, registration and password change.
//!
//! Constructors validate raw strings before a store talks to a port, so
//! malformed input never reaches the backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::session::Token;
use super::user::User;
use super::validation::{FieldErrors, is_valid_email, require_email, require_phone, require_text};

/// Shortest password accepted on registration and password change.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email was not shaped like an address.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and shaped like an address.
/// - `password` is non-empty but keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use loan_portal::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" amina@example.com ", "secret").unwrap();
/// assert_eq!(creds.email(), "amina@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    ///
    /// # Errors
    ///
    /// Returns [`LoginValidationError`] for blank or malformed input.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if !is_valid_email(normalized) {
            return Err(LoginValidationError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used as the login identifier.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// New-account details.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Local mobile number.
    pub phone_number: String,
    /// Chosen password; wiped on drop.
    pub password: Zeroizing<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .finish_non_exhaustive()
    }
}

impl Registration {
    /// Field-scoped checks run before calling `/auth/register`.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "firstName", &self.first_name, "First name");
        require_text(&mut errors, "lastName", &self.last_name, "Last name");
        require_email(&mut errors, "email", &self.email, "Email");
        require_phone(&mut errors, "phoneNumber", &self.phone_number, "Phone number");
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        errors
    }
}

/// Password change request.
#[derive(Clone, PartialEq, Eq)]
pub struct ChangePasswordRequest {
    /// Password in use now.
    pub current_password: Zeroizing<String>,
    /// Replacement password.
    pub new_password: Zeroizing<String>,
    /// Must repeat `new_password`.
    pub confirm_password: Zeroizing<String>,
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangePasswordRequest { .. }")
    }
}

impl ChangePasswordRequest {
    /// Build a request from raw strings.
    pub fn new(current: &str, new: &str, confirm: &str) -> Self {
        Self {
            current_password: Zeroizing::new(current.to_owned()),
            new_password: Zeroizing::new(new.to_owned()),
            confirm_password: Zeroizing::new(confirm.to_owned()),
        }
    }

    /// Field-scoped checks run before calling `/auth/change-password`.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(
            &mut errors,
            "currentPassword",
            &self.current_password,
            "Current password",
        );
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                "newPassword",
                format!("New password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        } else if *self.new_password == *self.current_password {
            errors.insert(
                "newPassword",
                "New password must differ from the current password",
            );
        }
        if *self.confirm_password != *self.new_password {
            errors.insert("confirmPassword", "Passwords do not match");
        }
        errors
    }
}

/// Token pair plus profile returned by login, register and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    /// Bearer token for API calls.
    pub access_token: Token,
    /// Replacement refresh token, when the backend rotates it.
    #[serde(default)]
    pub refresh_token: Option<Token>,
    /// Profile of the signed-in user, when included.
    #[serde(default)]
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("amina", "pw", LoginValidationError::InvalidEmail)]
    #[case("amina@example.com", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn password_whitespace_is_preserved() {
        let creds = LoginCredentials::try_from_parts("a@b.co", " pw ").expect("valid");
        assert_eq!(creds.password(), " pw ");
    }

    #[rstest]
    #[case("oldpassword", "short", "short", Some("newPassword"))]
    #[case("oldpassword", "oldpassword", "oldpassword", Some("newPassword"))]
    #[case("oldpassword", "newpassword", "different", Some("confirmPassword"))]
    #[case("oldpassword", "newpassword", "newpassword", None)]
    fn change_password_rules(
        #[case] current: &str,
        #[case] new: &str,
        #[case] confirm: &str,
        #[case] failing: Option<&str>,
    ) {
        let errors = ChangePasswordRequest::new(current, new, confirm).validate();
        match failing {
            Some(field) => assert!(errors.contains(field), "errors: {errors}"),
            None => assert!(errors.is_empty(), "errors: {errors}"),
        }
    }

    #[rstest]
    fn registration_requires_contact_details() {
        let registration = Registration {
            first_name: "Amina".to_owned(),
            last_name: String::new(),
            email: "bad".to_owned(),
            phone_number: "0712345678".to_owned(),
            password: Zeroizing::new("longenough".to_owned()),
        };
        let errors = registration.validate();
        assert!(errors.contains("lastName"));
        assert!(errors.contains("email"));
        assert!(!errors.contains("phoneNumber"));
    }

    #[rstest]
    fn registration_debug_hides_password() {
        let registration = Registration {
            first_name: "Amina".to_owned(),
            last_name: "Mushi".to_owned(),
            email: "a@b.co".to_owned(),
            phone_number: "0712345678".to_owned(),
            password: Zeroizing::new("hunter22".to_owned()),
        };
        assert!(!format!("{registration:?}").contains("hunter22"));
    }
}
