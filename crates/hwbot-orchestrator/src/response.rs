//! Shape checks for the homework statuses response.
//!
//! The API body is untrusted: nothing reads a field before these functions
//! have confirmed it exists and has the expected JSON type.

use serde_json::Value;

use crate::error::{HwbotError, Result};

/// Key holding the list of homework records.
pub const HOMEWORKS_KEY: &str = "homeworks";

/// Key holding the server timestamp to use as the next `from_date`.
pub const CURRENT_DATE_KEY: &str = "current_date";

/// Returns the JSON type name of a value, for error messages.
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extracts the homework records from an API response.
///
/// An empty slice is a valid outcome and means nothing changed since the
/// requested `from_date`.
///
/// # Errors
///
/// - `HwbotError::TypeMismatch` if the response is not an object or
///   `homeworks` is not an array.
/// - `HwbotError::MissingField` if `homeworks` is absent.
pub fn extract_homeworks(response: &Value) -> Result<&[Value]> {
    let object = response
        .as_object()
        .ok_or_else(|| HwbotError::type_mismatch("API response", "object", json_type_name(response)))?;

    let homeworks = object
        .get(HOMEWORKS_KEY)
        .ok_or_else(|| HwbotError::missing_field(HOMEWORKS_KEY))?;

    let records = homeworks.as_array().ok_or_else(|| {
        HwbotError::type_mismatch(HOMEWORKS_KEY, "array", json_type_name(homeworks))
    })?;

    tracing::debug!(count = records.len(), "API response passed validation");
    Ok(records.as_slice())
}

/// Returns the server-reported `current_date`, if present and an integer.
pub fn current_date(response: &Value) -> Option<i64> {
    response.get(CURRENT_DATE_KEY).and_then(Value::as_i64)
}
