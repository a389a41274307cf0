//! The poll loop.
//!
//! Each cycle fetches updates, validates the response, turns the latest
//! record into a verdict and notifies the recipient when the verdict changed.
//! Errors never escape a cycle: they are logged and relayed to the recipient,
//! once per distinct message.

use std::time::Duration;

use crate::api::{HomeworkApi, PracticumClient};
use crate::config::Config;
use crate::error::Result;
use crate::notifier::{MessageTransport, Notifier, TelegramTransport};
use crate::poll_state::PollState;
use crate::response::{current_date, extract_homeworks};
use crate::verdict::describe;

/// Prefix of the message sent to the recipient when a cycle fails.
pub const FAILURE_PREFIX: &str = "Сбой в работе программы";

/// Result of a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The API reported no new submissions.
    NoUpdates,
    /// The latest verdict matches the one already delivered.
    Unchanged,
    /// A new verdict was delivered.
    Notified,
    /// A new verdict was computed but delivery failed.
    NotDelivered,
    /// The cycle failed.
    Failed {
        /// Text relayed (or suppressed) for the recipient.
        message: String,
        /// Whether the message was delivered in this cycle.
        notified: bool,
    },
}

impl CycleOutcome {
    /// Returns `true` if the cycle failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Drives poll cycles against a homework API and a message transport.
pub struct Poller<A, T> {
    api: A,
    notifier: Notifier<T>,
    state: PollState,
    retry_period: Duration,
}

impl Poller<PracticumClient, TelegramTransport> {
    /// Builds a poller wired to the real Practicum API and Telegram.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api = PracticumClient::new(config)?;
        let transport = TelegramTransport::new(config)?;
        let notifier = Notifier::new(transport, config.credentials.telegram_chat_id.clone());
        Ok(Self::new(api, notifier, config.settings.retry_period()))
    }
}

impl<A: HomeworkApi, T: MessageTransport> Poller<A, T> {
    /// Creates a poller whose window starts at the current time.
    pub fn new(api: A, notifier: Notifier<T>, retry_period: Duration) -> Self {
        Self {
            api,
            notifier,
            state: PollState::new(),
            retry_period,
        }
    }

    /// Replaces the initial state.
    #[must_use]
    pub fn with_state(mut self, state: PollState) -> Self {
        self.state = state;
        self
    }

    /// Current state.
    pub const fn state(&self) -> &PollState {
        &self.state
    }

    /// The notifier used for delivery.
    pub const fn notifier(&self) -> &Notifier<T> {
        &self.notifier
    }

    /// The homework API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Pause between cycles.
    pub const fn retry_period(&self) -> Duration {
        self.retry_period
    }

    /// Runs cycles forever, sleeping for the retry period after each one.
    ///
    /// Only returns if the future is dropped (e.g. on Ctrl+C).
    pub async fn run(&mut self) {
        tracing::info!(
            retry_period_secs = self.retry_period.as_secs(),
            window = self.state.window,
            "Poll loop started"
        );
        loop {
            let outcome = self.run_cycle().await;
            tracing::debug!(
                cycle = self.state.cycles,
                status = %self.state.status,
                ?outcome,
                "Cycle finished"
            );
            tokio::time::sleep(self.retry_period).await;
        }
    }

    /// Runs a single cycle. Never fails; errors are reported in the outcome.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.state.begin_cycle();

        match self.poll_once().await {
            Ok(outcome) => {
                self.state.record_success();
                outcome
            }
            Err(e) => {
                self.state.record_failure();
                let message = format!("{FAILURE_PREFIX}: {e}");
                tracing::error!(
                    cycle = self.state.cycles,
                    window = self.state.window,
                    error = %e,
                    "Poll cycle failed"
                );

                let notified = if self.state.is_new_error(&message) {
                    let delivered = self.notifier.notify(&message).await;
                    if delivered {
                        self.state.remember_error(message.clone());
                    }
                    delivered
                } else {
                    tracing::debug!("Same error already reported, not notifying");
                    false
                };

                CycleOutcome::Failed { message, notified }
            }
        }
    }

    async fn poll_once(&mut self) -> Result<CycleOutcome> {
        let response = self.api.fetch_updates(self.state.window).await?;
        let homeworks = extract_homeworks(&response)?;

        let outcome = match homeworks.first() {
            None => {
                tracing::debug!("No new homework status");
                CycleOutcome::NoUpdates
            }
            Some(latest) => {
                let verdict = describe(latest)?;
                if self.state.is_new_verdict(&verdict) {
                    if self.notifier.notify(&verdict).await {
                        self.state.remember_verdict(verdict);
                        CycleOutcome::Notified
                    } else {
                        CycleOutcome::NotDelivered
                    }
                } else {
                    tracing::debug!("Homework status unchanged");
                    CycleOutcome::Unchanged
                }
            }
        };

        self.state.advance_window(current_date(&response));
        Ok(outcome)
    }
}
