//! Append-only audit trail entries attached to an application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::application::ApplicationStatus;

/// Kind of action recorded in the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// The status moved.
    StatusChange,
    /// A payload field was changed.
    FieldEdit,
    /// A free-text note.
    Note,
}

/// One audit trail entry. Entries are never edited once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// What happened.
    pub action: AuditAction,
    /// Display name or email of the admin who acted.
    pub actor: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Comment left with the action; may be empty.
    #[serde(default)]
    pub note: String,
    /// Status before a status change.
    #[serde(default)]
    pub from_status: Option<ApplicationStatus>,
    /// Status after a status change.
    #[serde(default)]
    pub to_status: Option<ApplicationStatus>,
}
