//! Bounded polling until a remote task reaches a terminal state.
//!
//! Every mutating Prism operation returns a task identifier and leaves the
//! actual work to run asynchronously on the remote side. [`TaskWaiter`]
//! blocks the calling operation until that task finishes, translating its
//! final state into a snapshot or a structured error.
//!
//! The wait is a small finite-state machine:
//!
//! ```text
//! NotStarted --first poll--> Polling
//! Polling    --status in pending set--------> Polling (self-loop)
//! Polling    --status in target set---------> Succeeded
//! Polling    --other status / fetch error---> Failed
//! Polling    --deadline between polls-------> TimedOut
//! Polling    --caller cancellation----------> Cancelled
//! ```
//!
//! Transient "task not yet visible" lookup errors count as pending, bounded
//! only by the overall deadline. Every other fetch error is surfaced once,
//! without retry: the external API layer already applied its own retry
//! policy, and the caller decides whether to redo the whole operation.

use error_stack::Report;
use tokio::select;
use tokio::time::sleep;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::config::StatusClass;
use crate::config::WaitConfig;
use crate::error::WaitError;
use crate::error::WaitResult;
use crate::types::TaskSnapshot;
use crate::types::TaskStatus;
use crate::types::TaskStore;

/// Lifecycle of one wait session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// No poll attempted yet
    NotStarted,
    /// Actively polling the task
    Polling,
    /// Task reached a target status
    Succeeded,
    /// Task reached a failure status, or a fetch failed hard
    Failed,
    /// Deadline elapsed while the task was still pending
    TimedOut,
    /// Caller cancelled the wait
    Cancelled,
}

/// Polls a [`TaskStore`] until a task leaves the pending set.
///
/// Each call to [`wait`](Self::wait) runs its own independent polling
/// sequence; nothing is cached or shared between concurrent waits, even for
/// the same task identifier.
pub struct TaskWaiter<'a, S> {
    store: &'a S,
    config: WaitConfig,
}

impl<'a, S: TaskStore> TaskWaiter<'a, S> {
    /// Create a waiter over the given task store.
    pub fn new(store: &'a S, config: WaitConfig) -> Self {
        Self { store, config }
    }

    /// Wait for the task to reach a target status, without external
    /// cancellation.
    ///
    /// # Errors
    ///
    /// See [`wait_with_cancel`](Self::wait_with_cancel).
    pub async fn wait(&self, task_id: &str) -> WaitResult<TaskSnapshot> {
        self.wait_with_cancel(task_id, &CancellationToken::new())
            .await
    }

    /// Wait for the task to reach a target status.
    ///
    /// Cancellation is observed at poll boundaries only: an in-flight fetch
    /// is allowed to complete, but its result is discarded once `cancel` has
    /// fired.
    ///
    /// # Errors
    ///
    /// * [`WaitError::TaskFailed`] when the task reaches a recognized
    ///   failure status, carrying its `error_detail` and `progress_message`
    ///   verbatim
    /// * [`WaitError::UnrecognizedStatus`] when the status is in neither the
    ///   pending nor the target set
    /// * [`WaitError::Timeout`] when the deadline elapses between polls,
    ///   with the last observed status for diagnostics
    /// * [`WaitError::Cancelled`] when `cancel` fires first
    /// * [`WaitError::Fetch`] when a non-transient fetch error occurs
    /// * [`WaitError::Configuration`] for an empty task identifier or an
    ///   invalid [`WaitConfig`]
    pub async fn wait_with_cancel(
        &self,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> WaitResult<TaskSnapshot> {
        if task_id.is_empty() {
            return Err(Report::new(WaitError::Configuration {
                message: "task identifier must not be empty".into(),
            }));
        }
        self.config.validate()?;

        let deadline = Instant::now() + self.config.timeout;
        let mut last_status: Option<TaskStatus> = None;

        debug!(task_id, state = ?WaitState::NotStarted, timeout = ?self.config.timeout, "waiting for task");

        // NotStarted -> Polling after the initial delay.
        if !self.config.initial_delay.is_zero()
            && !idle(self.config.initial_delay, cancel).await
        {
            return Err(self.cancelled(task_id));
        }

        loop {
            let fetched = self.store.fetch_task(task_id).await;

            if cancel.is_cancelled() {
                trace!(task_id, "discarding in-flight fetch result after cancellation");
                return Err(self.cancelled(task_id));
            }

            match fetched {
                Ok(snapshot) => {
                    last_status = Some(snapshot.status.clone());
                    match self.config.classify(&snapshot.status) {
                        StatusClass::Target => {
                            debug!(task_id, status = %snapshot.status, state = ?WaitState::Succeeded, "task completed");
                            return Ok(snapshot);
                        }
                        StatusClass::Pending => {
                            trace!(task_id, status = %snapshot.status, state = ?WaitState::Polling, "task still pending");
                        }
                        StatusClass::Terminal => {
                            warn!(task_id, status = %snapshot.status, state = ?WaitState::Failed, "task reached a non-target terminal status");
                            return Err(Report::new(failure_for(task_id, snapshot)));
                        }
                    }
                }
                Err(report) if report.current_context().is_transient() => {
                    debug!(task_id, "task not visible yet, continuing to poll");
                }
                Err(report) => {
                    warn!(task_id, state = ?WaitState::Failed, "task fetch failed");
                    return Err(report.change_context(WaitError::Fetch {
                        task_id: task_id.to_owned(),
                    }));
                }
            }

            // Polling self-loop. The deadline is checked only between poll
            // attempts; a poll is skipped when it could not start before the
            // deadline.
            if Instant::now() + self.config.poll_interval > deadline {
                debug!(task_id, last_status = ?last_status, state = ?WaitState::TimedOut, "deadline elapsed");
                return Err(Report::new(WaitError::Timeout {
                    task_id: task_id.to_owned(),
                    last_status,
                }));
            }

            if !idle(self.config.poll_interval, cancel).await {
                return Err(self.cancelled(task_id));
            }
        }
    }

    fn cancelled(&self, task_id: &str) -> Report<WaitError> {
        debug!(task_id, state = ?WaitState::Cancelled, "wait cancelled");
        Report::new(WaitError::Cancelled {
            task_id: task_id.to_owned(),
        })
    }
}

/// Wait for a task with the given config, constructing a throwaway waiter.
///
/// Convenience wrapper over [`TaskWaiter::wait`] for call sites that do not
/// reuse the waiter.
///
/// # Errors
///
/// See [`TaskWaiter::wait_with_cancel`].
pub async fn wait_for_task<S: TaskStore>(
    store: &S,
    task_id: &str,
    config: WaitConfig,
) -> WaitResult<TaskSnapshot> {
    TaskWaiter::new(store, config).wait(task_id).await
}

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns `false` on cancellation.
async fn idle(duration: std::time::Duration, cancel: &CancellationToken) -> bool {
    select! {
        () = cancel.cancelled() => false,
        () = sleep(duration) => true,
    }
}

fn failure_for(task_id: &str, snapshot: TaskSnapshot) -> WaitError {
    if snapshot.status.is_recognized_failure() {
        WaitError::TaskFailed {
            task_id: task_id.to_owned(),
            status: snapshot.status,
            error_detail: snapshot.error_detail,
            progress_message: snapshot.progress_message,
        }
    } else {
        WaitError::UnrecognizedStatus {
            task_id: task_id.to_owned(),
            status: snapshot.status,
        }
    }
}
