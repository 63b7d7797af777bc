//! Request schemas.
//!
//! Every operation validates its payload through an explicit, ordered list of field checks.
//! Each check returns a `Result`; the failures are collected into a single [`FieldErrors`]
//! mapping before anything is handed to a workflow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidationErrors;

use crate::domain::ObjectId;

pub mod init;
pub mod retrieve;
pub mod update;

pub const MISSING_FIELD_ERROR: &str = "Missing data for required field.";
pub const NULL_FIELD_ERROR: &str = "Field may not be null.";
pub const INVALID_OBJECT_ID_ERROR: &str = "Invalid ObjectId.";
pub const INVALID_INTEGER_ERROR: &str = "Not a valid integer.";
pub const UNKNOWN_FIELD_ERROR: &str = "Unknown field.";

pub type Payload = Map<String, Value>;

/// Parses a raw message body. Anything that is not a JSON object counts as an empty request,
/// so validation reports missing fields instead of failing outright.
pub fn parse_payload(body: &[u8]) -> Payload {
    match serde_json::from_slice::<Value>(body.trim_ascii()) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            log::debug!("Request body is not a JSON object: {}", other);
            Payload::new()
        }
        Err(e) => {
            log::debug!("Request body is not valid JSON: {}", e);
            Payload::new()
        }
    }
}

/// Field name to the list of messages reported for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn from_messages(field: &str, messages: Vec<String>) -> Self {
        let mut errors = Self::new();
        for message in messages {
            errors.add(field, message);
        }
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|m| m.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` when nothing was collected.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors = FieldErrors::new();
        for (field, errors) in errors.field_errors() {
            for error in errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                field_errors.add(&field, message);
            }
        }
        field_errors
    }
}

/// Runs one field check and records its failure under `field`.
pub(crate) fn collect<T>(
    errors: &mut FieldErrors,
    field: &str,
    result: Result<T, Vec<String>>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(messages) => {
            errors.merge(FieldErrors::from_messages(field, messages));
            None
        }
    }
}

pub(crate) fn required<'a>(payload: &'a Payload, field: &str) -> Result<&'a Value, Vec<String>> {
    match payload.get(field) {
        None => Err(vec![MISSING_FIELD_ERROR.to_string()]),
        Some(Value::Null) => Err(vec![NULL_FIELD_ERROR.to_string()]),
        Some(value) => Ok(value),
    }
}

pub(crate) fn object_id(value: &Value) -> Result<ObjectId, Vec<String>> {
    value
        .as_str()
        .and_then(|s| s.parse::<ObjectId>().ok())
        .ok_or_else(|| vec![INVALID_OBJECT_ID_ERROR.to_string()])
}

/// Accepts JSON integers and strings holding an integer.
pub(crate) fn integer(value: &Value) -> Result<i64, Vec<String>> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| vec![INVALID_INTEGER_ERROR.to_string()])
}
