//! Homework status codes and their verdict sentences.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{HwbotError, Result};
use crate::response::json_type_name;

/// Review status of a homework submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    /// Reviewer accepted the work.
    Approved,
    /// Reviewer has picked the work up.
    Reviewing,
    /// Reviewer left comments to address.
    Rejected,
}

impl HomeworkStatus {
    /// Every known status, in table order.
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Parses an API status code. Returns `None` for unknown codes.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "approved" => Some(Self::Approved),
            "reviewing" => Some(Self::Reviewing),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// The API status code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// The sentence sent to the student for this status.
    #[must_use]
    pub const fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }

    /// Reverse lookup of [`HomeworkStatus::verdict`].
    #[must_use]
    pub fn from_verdict(sentence: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.verdict() == sentence)
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A validated homework record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworkRecord {
    /// Name of the submission as reported by the API.
    pub homework_name: String,
    /// Current review status.
    pub status: HomeworkStatus,
}

impl HomeworkRecord {
    /// Validates a raw API record.
    ///
    /// # Errors
    ///
    /// - `HwbotError::TypeMismatch` if the record is not an object or a field
    ///   is not a string.
    /// - `HwbotError::MissingField` if `homework_name` or `status` is absent.
    /// - `HwbotError::UnknownStatus` if the status code is not recognized.
    pub fn from_value(record: &Value) -> Result<Self> {
        let object = record
            .as_object()
            .ok_or_else(|| HwbotError::type_mismatch("homework record", "object", json_type_name(record)))?;

        let homework_name = string_field(object, "homework_name")?;
        let code = string_field(object, "status")?;
        let status = HomeworkStatus::parse(code).ok_or_else(|| HwbotError::unknown_status(code))?;

        Ok(Self {
            homework_name: homework_name.to_string(),
            status,
        })
    }

    /// The notification text for this record.
    #[must_use]
    pub fn verdict_text(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.homework_name,
            self.status.verdict()
        )
    }
}

/// Reads a required string field from a record.
fn string_field<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    let value = object.get(name).ok_or_else(|| HwbotError::missing_field(name))?;
    value
        .as_str()
        .ok_or_else(|| HwbotError::type_mismatch(name, "string", json_type_name(value)))
}

/// Turns a raw API record into the notification text.
///
/// # Errors
///
/// See [`HomeworkRecord::from_value`].
pub fn describe(record: &Value) -> Result<String> {
    let record = HomeworkRecord::from_value(record)?;
    tracing::debug!(homework = %record.homework_name, status = %record.status, "Parsed homework status");
    Ok(record.verdict_text())
}
