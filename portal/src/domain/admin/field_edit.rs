//! Optimistic single-field edit with rollback.
//!
//! `begin` captures the last known-good value of one payload field. `apply`
//! writes the proposed value into the local copy; `revert` restores the
//! captured value when the backend rejects the change.

use serde_json::{Map, Value};

use crate::domain::{Application, ApplicationId, ApplicationPayload, DomainError};

/// One in-flight field edit.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    application_id: ApplicationId,
    field: String,
    original: Value,
}

impl FieldEdit {
    /// Capture the current value of `field` (camelCase payload name).
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when the payload has no such field.
    pub fn begin(application: &Application, field: &str) -> Result<Self, DomainError> {
        let field = field.trim();
        let original = payload_fields(&application.payload)?
            .get(field)
            .cloned()
            .ok_or_else(|| DomainError::invalid_request(format!("unknown field: {field}")))?;
        Ok(Self {
            application_id: application.id,
            field: field.to_owned(),
            original,
        })
    }

    /// Application being edited.
    pub const fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    /// Payload field name.
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Value captured when the edit began.
    pub fn original(&self) -> &Value {
        &self.original
    }

    /// Body for `PATCH /admin/applications/{id}/data`.
    pub fn patch_body(&self, value: &Value) -> Value {
        let mut body = Map::new();
        body.insert(self.field.clone(), value.clone());
        Value::Object(body)
    }

    /// Write `value` into the local copy.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when `value` has the wrong shape for
    /// the field; the application is left untouched.
    pub fn apply(&self, application: &mut Application, value: &Value) -> Result<(), DomainError> {
        let mut fields = payload_fields(&application.payload)?;
        fields.insert(self.field.clone(), value.clone());
        application.payload = rebuild_payload(&application.payload, fields)?;
        Ok(())
    }

    /// Restore the captured value.
    ///
    /// # Errors
    ///
    /// Propagates payload re-encoding failures.
    pub fn revert(&self, application: &mut Application) -> Result<(), DomainError> {
        self.apply(application, &self.original)
    }
}

fn payload_fields(payload: &ApplicationPayload) -> Result<Map<String, Value>, DomainError> {
    let encoded = match payload {
        ApplicationPayload::Sme(data) => serde_json::to_value(data),
        ApplicationPayload::Payroll(data) => serde_json::to_value(data),
    }
    .map_err(|err| DomainError::internal(format!("payload encoding failed: {err}")))?;
    match encoded {
        Value::Object(fields) => Ok(fields),
        _ => Err(DomainError::internal("payload did not encode as an object")),
    }
}

fn rebuild_payload(
    current: &ApplicationPayload,
    fields: Map<String, Value>,
) -> Result<ApplicationPayload, DomainError> {
    let value = Value::Object(fields);
    let rebuilt = match current {
        ApplicationPayload::Sme(_) => serde_json::from_value(value).map(ApplicationPayload::Sme),
        ApplicationPayload::Payroll(_) => {
            serde_json::from_value(value).map(ApplicationPayload::Payroll)
        }
    };
    rebuilt.map_err(|err| DomainError::invalid_request(format!("invalid field value: {err}")))
}
