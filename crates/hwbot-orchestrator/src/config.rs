//! Configuration types for the homework notifier.
//!
//! Secrets come from the environment ([`Credentials`]); tunables come from an
//! optional `hwbot.json` file ([`Settings`]). Both are combined into a
//! [`Config`] once at startup and passed explicitly to every component.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HwbotError, Result};

/// The default settings file name.
const CONFIG_FILE_NAME: &str = "hwbot.json";

/// Environment variable holding the Practicum API token.
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the recipient chat id.
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Default pause between poll cycles in seconds.
const fn default_retry_period() -> u64 {
    600
}

/// Default timeout for a single HTTP request in seconds.
const fn default_request_timeout() -> u64 {
    30
}

/// Default homework statuses endpoint.
fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string()
}

/// Default Telegram Bot API base URL.
fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Default log file path.
fn default_log_file() -> String {
    "program.log".to_string()
}

/// Non-secret tunables for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Pause between the end of one cycle and the start of the next.
    #[serde(default = "default_retry_period")]
    pub retry_period_secs: u64,

    /// Upper bound on each HTTP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Homework statuses endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Telegram Bot API base URL, without the `/bot<token>` suffix.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Log file path. Empty disables file logging.
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry_period_secs: default_retry_period(),
            request_timeout_secs: default_request_timeout(),
            endpoint: default_endpoint(),
            telegram_api_url: default_telegram_api_url(),
            log_file: default_log_file(),
        }
    }
}

impl Settings {
    /// Loads settings from `hwbot.json` in the current working directory.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            HwbotError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_file(&current_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads settings from a specific file path.
    ///
    /// If the file does not exist, returns default settings.
    ///
    /// # Errors
    ///
    /// Returns `HwbotError::ConfigParseError` if the file cannot be read or
    /// contains invalid JSON, and `HwbotError::ConfigValidationError` if the
    /// values are out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.validate()?;
                return Ok(settings);
            }
            Err(e) => {
                return Err(HwbotError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let settings: Self = serde_json::from_str(&contents)
            .map_err(|e| HwbotError::config_parse(path, e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings values.
    ///
    /// # Errors
    ///
    /// Returns `HwbotError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.retry_period_secs == 0 {
            return Err(HwbotError::config_validation(
                "retryPeriodSecs must be greater than 0",
                "Set retryPeriodSecs to at least 1 in your hwbot.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(HwbotError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 in your hwbot.json",
            ));
        }

        if self.endpoint.trim().is_empty() {
            return Err(HwbotError::config_validation(
                "endpoint must not be empty",
                "Remove the endpoint field from hwbot.json to use the Practicum default",
            ));
        }

        if self.telegram_api_url.trim().is_empty() {
            return Err(HwbotError::config_validation(
                "telegramApiUrl must not be empty",
                "Remove the telegramApiUrl field from hwbot.json to use the Telegram default",
            ));
        }

        Ok(())
    }

    /// Pause between poll cycles.
    #[must_use]
    pub const fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    /// Timeout applied to each HTTP request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Secrets required before any network call is made.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Practicum API token, sent as `Authorization: OAuth <token>`.
    pub practicum_token: String,
    /// Telegram bot token.
    pub telegram_token: String,
    /// Recipient chat id (numeric id or `@channel` name).
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("practicum_token", &redact(&self.practicum_token))
            .field("telegram_token", &redact(&self.telegram_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment.
    ///
    /// Missing variables become empty strings; call [`Credentials::verify`]
    /// to reject them.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads credentials through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).unwrap_or_default();
        Self {
            practicum_token: get(PRACTICUM_TOKEN_VAR),
            telegram_token: get(TELEGRAM_TOKEN_VAR),
            telegram_chat_id: get(TELEGRAM_CHAT_ID_VAR),
        }
    }

    /// Names of the required variables that are absent or blank.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (PRACTICUM_TOKEN_VAR, &self.practicum_token),
            (TELEGRAM_TOKEN_VAR, &self.telegram_token),
            (TELEGRAM_CHAT_ID_VAR, &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Fails if any required secret is missing.
    ///
    /// # Errors
    ///
    /// Returns `HwbotError::ConfigurationError` naming every missing variable.
    pub fn verify(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HwbotError::configuration(missing))
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Tunables.
    pub settings: Settings,
    /// Secrets.
    pub credentials: Credentials,
}

impl Config {
    /// Combines settings and credentials, running the credential gate.
    ///
    /// # Errors
    ///
    /// Returns `HwbotError::ConfigurationError` if a secret is missing, or
    /// `HwbotError::ConfigValidationError` if the settings are invalid.
    pub fn new(settings: Settings, credentials: Credentials) -> Result<Self> {
        settings.validate()?;
        credentials.verify()?;
        Ok(Self {
            settings,
            credentials,
        })
    }
}
