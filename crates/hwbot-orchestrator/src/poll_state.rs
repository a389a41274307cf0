//! In-memory state carried between poll cycles.
//!
//! Nothing here is persisted; a restart begins with a fresh window at the
//! current time and no remembered notifications.

use std::fmt;

use chrono::{DateTime, Utc};

// ============================================================================
// PollStatus
// ============================================================================

/// Health of the poll loop as of the last finished cycle.
///
/// - `Polling` -> `Degraded` when a cycle fails.
/// - `Degraded` -> `Polling` on the next cycle that succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollStatus {
    /// The last cycle completed normally.
    #[default]
    Polling,
    /// The last cycle raised an error.
    Degraded,
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

// ============================================================================
// PollState
// ============================================================================

/// Poll window plus the last notified verdict and error.
#[derive(Debug, Clone)]
pub struct PollState {
    /// Lower bound (seconds since epoch) for the next API query.
    pub window: i64,

    /// Last verdict text delivered to the recipient.
    pub last_verdict: Option<String>,

    /// Last error text delivered to the recipient.
    pub last_error: Option<String>,

    /// Outcome of the last cycle.
    pub status: PollStatus,

    /// Number of cycles run so far.
    pub cycles: u64,

    /// Number of messages delivered so far.
    pub notifications: u64,

    /// Number of cycles that failed.
    pub failures: u64,

    /// When the state was created.
    pub started_at: DateTime<Utc>,
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}

impl PollState {
    /// Creates a state whose window starts at the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Utc::now().timestamp())
    }

    /// Creates a state with an explicit starting window.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_orchestrator::{PollState, PollStatus};
    ///
    /// let state = PollState::with_window(1_700_000_000);
    /// assert_eq!(state.window, 1_700_000_000);
    /// assert_eq!(state.status, PollStatus::Polling);
    /// assert!(state.last_verdict.is_none());
    /// ```
    #[must_use]
    pub fn with_window(window: i64) -> Self {
        Self {
            window,
            last_verdict: None,
            last_error: None,
            status: PollStatus::Polling,
            cycles: 0,
            notifications: 0,
            failures: 0,
            started_at: Utc::now(),
        }
    }

    /// Returns `true` if `verdict` differs from the last delivered verdict.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_orchestrator::PollState;
    ///
    /// let mut state = PollState::with_window(0);
    /// assert!(state.is_new_verdict("approved"));
    ///
    /// state.remember_verdict("approved");
    /// assert!(!state.is_new_verdict("approved"));
    /// assert!(state.is_new_verdict("rejected"));
    /// ```
    #[must_use]
    pub fn is_new_verdict(&self, verdict: &str) -> bool {
        self.last_verdict.as_deref() != Some(verdict)
    }

    /// Records a delivered verdict.
    pub fn remember_verdict(&mut self, verdict: impl Into<String>) {
        self.last_verdict = Some(verdict.into());
        self.notifications += 1;
    }

    /// Returns `true` if `message` differs from the last delivered error.
    #[must_use]
    pub fn is_new_error(&self, message: &str) -> bool {
        self.last_error.as_deref() != Some(message)
    }

    /// Records a delivered error message.
    pub fn remember_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.notifications += 1;
    }

    /// Moves the window to the server-reported date, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_orchestrator::PollState;
    ///
    /// let mut state = PollState::with_window(100);
    /// state.advance_window(None);
    /// assert_eq!(state.window, 100);
    ///
    /// state.advance_window(Some(700));
    /// assert_eq!(state.window, 700);
    /// ```
    pub fn advance_window(&mut self, current_date: Option<i64>) {
        if let Some(date) = current_date {
            self.window = date;
        }
    }

    /// Marks the start of a cycle.
    pub fn begin_cycle(&mut self) {
        self.cycles += 1;
    }

    /// Marks the current cycle as successful.
    ///
    /// Clears the remembered error so the same failure is reported again if
    /// it comes back after this success.
    pub fn record_success(&mut self) {
        self.status = PollStatus::Polling;
        self.last_error = None;
    }

    /// Marks the current cycle as failed.
    pub fn record_failure(&mut self) {
        self.status = PollStatus::Degraded;
        self.failures += 1;
    }

    /// Returns `true` if the last cycle failed.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self.status, PollStatus::Degraded)
    }

    /// Returns the duration since the state was created.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

// ============================================================================
// Tests
// ============================================================================
