//! User identity, role and profile.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::Document;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// The id was blank.
    EmptyId,
    /// The id was not a UUID.
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError`] for blank or non-UUID input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Portal role. Admin tiers share the review dashboard; only tier 2 may
/// override the status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Borrower using the application wizard.
    Applicant,
    /// Reviewer limited to forward lifecycle moves.
    #[serde(rename = "ADMIN_TIER1")]
    AdminTier1,
    /// Senior reviewer who may override the lifecycle.
    #[serde(rename = "ADMIN_TIER2")]
    AdminTier2,
}

impl Role {
    /// Whether the role may use the admin review workflow.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::AdminTier1 | Self::AdminTier2)
    }

    /// Whether the role may move an application against the lifecycle.
    pub const fn can_override_status(self) -> bool {
        matches!(self, Self::AdminTier2)
    }
}

/// Authenticated user profile as returned by `/auth/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Mobile number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// National ID number, once provided.
    #[serde(default)]
    pub national_id: Option<String>,
    /// Portal role.
    pub role: Role,
    /// KYC documents attached to the profile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
}

impl User {
    /// First and last name joined, falling back to the email.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case(" 123e4567-e89b-12d3-a456-426614174000", UserValidationError::InvalidId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    fn rejects_invalid_ids(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
    }

    #[rstest]
    #[case(json!("APPLICANT"), Role::Applicant)]
    #[case(json!("ADMIN_TIER1"), Role::AdminTier1)]
    #[case(json!("ADMIN_TIER2"), Role::AdminTier2)]
    fn roles_decode_from_wire_names(#[case] raw: serde_json::Value, #[case] expected: Role) {
        let role: Role = serde_json::from_value(raw).expect("role decodes");
        assert_eq!(role, expected);
    }

    #[rstest]
    fn only_tier_two_overrides() {
        assert!(!Role::Applicant.can_override_status());
        assert!(!Role::AdminTier1.can_override_status());
        assert!(Role::AdminTier2.can_override_status());
        assert!(Role::AdminTier1.is_admin());
    }

    #[rstest]
    fn display_name_falls_back_to_email() {
        let user: User = serde_json::from_value(json!({
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "email": "amina@example.com",
            "role": "APPLICANT"
        }))
        .expect("user decodes");
        assert_eq!(user.display_name(), "amina@example.com");
    }
}
