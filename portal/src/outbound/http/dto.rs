//! Wire DTOs for request bodies and tolerant response shapes.
//!
//! Domain types already carry their camelCase serde contracts; these cover
//! request bodies built from borrowed fields and the few response shapes
//! that vary between backend versions.

use pagination::Paginated;
use serde::{Deserialize, Serialize};

use crate::domain::{ApplicationPayload, ApplicationType};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshRequestDto<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RegisterRequestDto<'a> {
    pub(super) first_name: &'a str,
    pub(super) last_name: &'a str,
    pub(super) email: &'a str,
    pub(super) phone_number: &'a str,
    pub(super) password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChangePasswordDto<'a> {
    pub(super) current_password: &'a str,
    pub(super) new_password: &'a str,
    pub(super) confirm_password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateDraftDto {
    pub(super) application_type: ApplicationType,
}

/// `{ "applicationType": "SME", "smeData": { … } }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PayloadDto<'a> {
    pub(super) application_type: ApplicationType,
    #[serde(flatten)]
    pub(super) payload: &'a ApplicationPayload,
}

impl<'a> From<&'a ApplicationPayload> for PayloadDto<'a> {
    fn from(payload: &'a ApplicationPayload) -> Self {
        Self {
            application_type: payload.application_type(),
            payload,
        }
    }
}

/// Error body; either field may carry the human-readable message.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ErrorBodyDto {
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn into_message(self) -> Option<String> {
        [self.message, self.error]
            .into_iter()
            .flatten()
            .find(|message| !message.trim().is_empty())
    }
}

/// List responses arrive paginated or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ListDto<T> {
    Page(Paginated<T>),
    Items(Vec<T>),
}

impl<T> From<ListDto<T>> for Paginated<T> {
    fn from(value: ListDto<T>) -> Self {
        match value {
            ListDto::Page(page) => page,
            ListDto::Items(items) => Self::single_page(items),
        }
    }
}
