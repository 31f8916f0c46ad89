//! Uploaded documents and the closed set of document type tags.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::application::ApplicationId;
use super::user::UserId;

/// Closed set of document tags accepted by the upload endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Front of the national ID card.
    NationalIdFront,
    /// Back of the national ID card.
    NationalIdBack,
    /// Passport-style photo.
    ProfilePicture,
    /// Utility bill or lease.
    ProofOfAddress,
    /// Anything else the applicant wants to add.
    AdditionalDocument,
    /// Letter confirming employment.
    EmployerLetter,
    /// Most recent payslip.
    #[serde(rename = "PAYSLIP_1")]
    Payslip1,
    /// Payslip before that.
    #[serde(rename = "PAYSLIP_2")]
    Payslip2,
    /// Third most recent payslip.
    #[serde(rename = "PAYSLIP_3")]
    Payslip3,
    /// Business registration certificate.
    BusinessRegistration,
    /// Business financial statement.
    FinancialStatement,
}

impl DocumentType {
    /// Every tag, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::NationalIdFront,
        Self::NationalIdBack,
        Self::ProfilePicture,
        Self::ProofOfAddress,
        Self::AdditionalDocument,
        Self::EmployerLetter,
        Self::Payslip1,
        Self::Payslip2,
        Self::Payslip3,
        Self::BusinessRegistration,
        Self::FinancialStatement,
    ];

    /// Wire name used in multipart uploads and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NationalIdFront => "NATIONAL_ID_FRONT",
            Self::NationalIdBack => "NATIONAL_ID_BACK",
            Self::ProfilePicture => "PROFILE_PICTURE",
            Self::ProofOfAddress => "PROOF_OF_ADDRESS",
            Self::AdditionalDocument => "ADDITIONAL_DOCUMENT",
            Self::EmployerLetter => "EMPLOYER_LETTER",
            Self::Payslip1 => "PAYSLIP_1",
            Self::Payslip2 => "PAYSLIP_2",
            Self::Payslip3 => "PAYSLIP_3",
            Self::BusinessRegistration => "BUSINESS_REGISTRATION",
            Self::FinancialStatement => "FINANCIAL_STATEMENT",
        }
    }

    /// camelCase field name used for per-document validation messages.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::NationalIdFront => "nationalIdFront",
            Self::NationalIdBack => "nationalIdBack",
            Self::ProfilePicture => "profilePicture",
            Self::ProofOfAddress => "proofOfAddress",
            Self::AdditionalDocument => "additionalDocument",
            Self::EmployerLetter => "employerLetter",
            Self::Payslip1 => "payslip1",
            Self::Payslip2 => "payslip2",
            Self::Payslip3 => "payslip3",
            Self::BusinessRegistration => "businessRegistration",
            Self::FinancialStatement => "financialStatement",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown document tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document type: {0}")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownDocumentType(s.to_owned()))
    }
}

/// Backend-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stored document metadata.
///
/// Documents are created on upload. Only the verification fields change
/// afterwards, and only through admin action on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Backend identifier.
    pub id: DocumentId,
    /// Owning application; `None` for profile documents.
    #[serde(default)]
    pub application_id: Option<ApplicationId>,
    /// Owning user, for profile documents.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Original file name.
    pub file_name: String,
    /// Download link, when the backend exposes one.
    #[serde(default)]
    pub file_url: Option<String>,
    /// What the document is.
    pub document_type: DocumentType,
    /// Whether an admin verified it.
    #[serde(default)]
    pub verified: bool,
    /// When it was verified.
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

/// A file selected for upload: name, MIME type and raw bytes.
///
/// Raw contents never reach draft snapshots.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// Name sent with the upload.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Build an upload, guessing the MIME type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_owned();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

impl fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn wire_names_match_serde() {
        for kind in DocumentType::ALL {
            let encoded = serde_json::to_value(kind).expect("tag serialises");
            assert_eq!(encoded, serde_json::Value::String(kind.as_str().to_owned()));
        }
    }

    #[rstest]
    #[case("payslip_2", DocumentType::Payslip2)]
    #[case(" NATIONAL_ID_BACK ", DocumentType::NationalIdBack)]
    fn parses_tags_case_insensitively(#[case] raw: &str, #[case] expected: DocumentType) {
        assert_eq!(raw.parse::<DocumentType>().expect("known tag"), expected);
    }

    #[rstest]
    fn rejects_unknown_tags() {
        assert!("PASSPORT".parse::<DocumentType>().is_err());
    }

    #[rstest]
    #[case("id.PDF", "application/pdf")]
    #[case("front.jpeg", "image/jpeg")]
    #[case("notes", "application/octet-stream")]
    fn guesses_content_type(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(DocumentUpload::new(name, Vec::new()).content_type, expected);
    }
}
