//! Error types for the homework notifier.
//!
//! This module defines the error hierarchy for every stage of a poll cycle,
//! from startup configuration through the API request, response validation,
//! status translation and message delivery.

use std::path::PathBuf;

/// A specialized `Result` type for notifier operations.
pub type Result<T> = std::result::Result<T, HwbotError>;

/// Errors that can occur while configuring or running the notifier.
///
/// Configuration errors are fatal and only raised at startup. Every other
/// variant is recoverable: the poll loop logs it and retries on the next cycle.
#[derive(Debug, thiserror::Error)]
pub enum HwbotError {
    // ========================================================================
    // Startup Errors
    // ========================================================================
    /// One or more required environment variables are missing or blank.
    #[error("Missing required environment variables: {}\n\nSuggestion: Export them or add them to a .env file", .missing.join(", "))]
    ConfigurationError {
        /// Names of the missing variables, in declaration order.
        missing: Vec<String>,
    },

    /// Invalid JSON syntax in the settings file.
    #[error("Invalid JSON in settings file '{path}': {message}\n\nSuggestion: Validate your hwbot.json with a JSON linter")]
    ConfigParseError {
        /// Path to the settings file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Settings validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Per-cycle Errors
    // ========================================================================
    /// The homework API could not be reached or answered with an error.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// A value in the API response has the wrong JSON type.
    #[error("{what} has unexpected type: expected {expected}, got {found}")]
    TypeMismatch {
        /// What was being inspected (e.g. "API response", "homeworks").
        what: String,
        /// The JSON type that was expected.
        expected: &'static str,
        /// The JSON type that was found.
        found: &'static str,
    },

    /// A required key is absent from the API response.
    #[error("missing key '{field}' in API response")]
    MissingField {
        /// Name of the missing key.
        field: String,
    },

    /// A homework record carries a status outside the known set.
    #[error("unknown homework status '{status}'")]
    UnknownStatus {
        /// The unrecognized status code.
        status: String,
    },

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// The messaging transport failed to deliver a message.
    #[error("failed to send message: {message}")]
    SendFailed {
        /// Description of the delivery failure.
        message: String,
    },
}

/// Failures reaching the homework API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Connection, DNS or timeout failure.
    #[error("endpoint {endpoint} is unreachable: {message} (from_date={from_date})")]
    Unreachable {
        /// The endpoint URL that was requested.
        endpoint: String,
        /// The `from_date` parameter sent with the request.
        from_date: i64,
        /// Description of the underlying failure.
        message: String,
    },

    /// The API answered with a non-200 status code.
    #[error("API responded with status {status}: {reason}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Reason phrase for the status code.
        reason: String,
    },

    /// The API answered 200 but the body is not valid JSON.
    #[error("API response is not valid JSON: {message}")]
    InvalidBody {
        /// Description of the decode failure.
        message: String,
    },
}

impl HwbotError {
    /// Creates a new `ConfigurationError` from the names of missing variables.
    #[must_use]
    pub fn configuration<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ConfigurationError {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `TypeMismatch` error.
    #[must_use]
    pub fn type_mismatch(what: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Creates a new `MissingField` error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a new `UnknownStatus` error.
    #[must_use]
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Creates a new `SendFailed` error.
    #[must_use]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Returns `true` if this error must stop the process.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError { .. }
                | Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
        )
    }

    /// Returns `true` if the poll loop can carry on after this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}
