//! Wait request parameters.
//!
//! One [`WaitConfig`] governs one polling session. The defaults mirror the
//! cadence Prism mutating operations are documented with: a 10 second poll
//! interval with the same initial delay, and a 30 minute overall deadline.

use std::time::Duration;

use error_stack::Report;

use crate::error::WaitError;
use crate::types::TaskStatus;

/// Default poll interval and initial delay.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default overall deadline for a wait session.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How a fetched status relates to the configured pending and target sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Still running, keep polling
    Pending,
    /// Successfully terminal
    Target,
    /// Neither pending nor target: terminal failure, stop immediately
    Terminal,
}

/// Parameters governing one polling session.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Statuses treated as "still running"
    pub pending: Vec<TaskStatus>,
    /// Statuses treated as successfully terminal
    pub target: Vec<TaskStatus>,
    /// Time between consecutive polls
    pub poll_interval: Duration,
    /// Delay before the first poll
    pub initial_delay: Duration,
    /// Overall deadline for the session
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            pending: vec![TaskStatus::Queued, TaskStatus::Running],
            target: vec![TaskStatus::Succeeded],
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_delay: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WaitConfig {
    /// Create a config with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for creation flows, where tasks may surface as `PENDING`
    /// before entering the queue.
    pub fn creation() -> Self {
        Self::default().with_pending(vec![
            TaskStatus::Queued,
            TaskStatus::Running,
            TaskStatus::Pending,
        ])
    }

    /// Set the pending-status set.
    pub fn with_pending(mut self, pending: Vec<TaskStatus>) -> Self {
        self.pending = pending;
        self
    }

    /// Set the target-status set.
    pub fn with_target(mut self, target: Vec<TaskStatus>) -> Self {
        self.target = target;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the delay before the first poll.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the overall deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify a fetched status against the pending and target sets.
    ///
    /// Any status in neither set is [`StatusClass::Terminal`]: the waiter
    /// fails fast rather than polling a status it cannot reason about.
    pub fn classify(&self, status: &TaskStatus) -> StatusClass {
        if self.target.contains(status) {
            StatusClass::Target
        } else if self.pending.contains(status) {
            StatusClass::Pending
        } else {
            StatusClass::Terminal
        }
    }

    /// Check the wait request invariants.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Configuration`] when either status set is empty,
    /// the sets overlap, or the poll interval is zero.
    pub fn validate(&self) -> Result<(), Report<WaitError>> {
        if self.pending.is_empty() {
            return Err(Report::new(WaitError::Configuration {
                message: "pending-status set must not be empty".into(),
            }));
        }
        if self.target.is_empty() {
            return Err(Report::new(WaitError::Configuration {
                message: "target-status set must not be empty".into(),
            }));
        }
        if let Some(overlap) = self.pending.iter().find(|s| self.target.contains(s)) {
            return Err(Report::new(WaitError::Configuration {
                message: format!("status {overlap} is both pending and target"),
            }));
        }
        if self.poll_interval.is_zero() {
            return Err(Report::new(WaitError::Configuration {
                message: "poll interval must be greater than zero".into(),
            }));
        }
        Ok(())
    }
}
