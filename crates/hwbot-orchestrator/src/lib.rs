//! Homework status notifier
//!
//! Polls the Practicum homework API, detects review status changes and
//! relays them to a Telegram chat.

pub mod api;
pub mod config;
pub mod error;
pub mod notifier;
pub mod poll_state;
pub mod poller;
pub mod response;
pub mod verdict;

pub use api::{HomeworkApi, PracticumClient};
pub use config::{
    Config, Credentials, Settings, PRACTICUM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR, TELEGRAM_TOKEN_VAR,
};
pub use error::{HwbotError, RequestError, Result};
pub use notifier::{MessageTransport, Notifier, TelegramTransport, TELEGRAM_MESSAGE_LIMIT};
pub use poll_state::{PollState, PollStatus};
pub use poller::{CycleOutcome, Poller, FAILURE_PREFIX};
pub use response::{current_date, extract_homeworks};
pub use verdict::{describe, HomeworkRecord, HomeworkStatus};
