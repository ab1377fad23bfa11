//! Error types for task fetching and waiting.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

use crate::types::TaskStatus;

/// Result type for task fetch operations.
pub type FetchResult<T> = Result<T, Report<FetchError>>;

/// Result type for wait operations.
pub type WaitResult<T> = Result<T, Report<WaitError>>;

/// Errors that can occur while fetching a task from the remote API.
#[derive(Debug, Display)]
pub enum FetchError {
    /// Task identifier not resolvable yet; safe to poll again
    #[display("task {task_id} is not visible yet")]
    NotYetVisible { task_id: String },

    /// Error status reported by the remote endpoint
    #[display("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Network connectivity issues
    #[display("Network error: {message}")]
    Network { message: String },

    /// Serialization/deserialization errors
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// Client configuration errors
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error for FetchError {}

impl FetchError {
    /// Whether the waiter may keep polling after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotYetVisible { .. })
    }
}

/// Terminal outcomes of a wait, other than success.
///
/// Failure statuses surface the task's own `error_detail` and
/// `progress_message` unmodified, together with the task identifier, so
/// operators can correlate with the remote task history.
#[derive(Debug, Display)]
pub enum WaitError {
    /// Task reached a recognized failure status
    #[display(
        "task {task_id} reached status {status}: error_detail: {}, progress_message: {}",
        error_detail.as_deref().unwrap_or(""),
        progress_message.as_deref().unwrap_or("")
    )]
    TaskFailed {
        task_id: String,
        status: TaskStatus,
        error_detail: Option<String>,
        progress_message: Option<String>,
    },

    /// Task reported a status outside both the pending and target sets
    #[display("task {task_id} reported unrecognized status {status}")]
    UnrecognizedStatus { task_id: String, status: TaskStatus },

    /// Deadline elapsed while the task was still pending
    #[display(
        "timed out waiting for task {task_id}, last observed status: {}",
        last_status.as_ref().map_or("none", TaskStatus::as_str)
    )]
    Timeout {
        task_id: String,
        last_status: Option<TaskStatus>,
    },

    /// Wait was cancelled by the caller
    #[display("wait for task {task_id} was cancelled")]
    Cancelled { task_id: String },

    /// Non-transient fetch failure, surfaced without retry
    #[display("failed to fetch task {task_id}")]
    Fetch { task_id: String },

    /// Invalid wait request parameters
    #[display("invalid wait request: {message}")]
    Configuration { message: String },
}

impl Error for WaitError {}
