//! Task data model shared between the waiter and API clients.

use core::fmt;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::error::FetchResult;

/// Lifecycle status of a remote task.
///
/// Statuses outside the known lifecycle set survive deserialization verbatim
/// as [`TaskStatus::Other`], so the waiter can fail fast on them instead of
/// silently dropping information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Task accepted, not yet scheduled
    Queued,
    /// Task is executing
    Running,
    /// Task is created but not yet queued
    Pending,
    /// Cancellation requested, not yet effective
    Canceling,
    /// Task finished successfully
    Succeeded,
    /// Task finished with an error
    Failed,
    /// Task was cancelled before completion
    Canceled,
    /// Task was suspended by the remote system
    Suspended,
    /// Status outside the known lifecycle set, kept verbatim
    Other(String),
}

impl TaskStatus {
    /// Wire spelling of the status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Pending => "PENDING",
            Self::Canceling => "CANCELING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Suspended => "SUSPENDED",
            Self::Other(s) => s,
        }
    }

    /// Whether this is a failure status the remote API itself defines.
    pub fn is_recognized_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceled | Self::Suspended)
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "PENDING" => Self::Pending,
            "CANCELING" => Self::Canceling,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELED" => Self::Canceled,
            "SUSPENDED" => Self::Suspended,
            _ => Self::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an entity a task created or mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    /// Globally unique identifier of the entity
    pub ext_id: String,
    /// Relationship tag, e.g. `vmm:ahv:config:vm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Human-readable entity name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single observation of a remote task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Globally unique task identifier
    pub ext_id: String,
    /// Status at the time of the fetch
    pub status: TaskStatus,
    /// Remote error detail, present on failed tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Last progress message reported by the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_message: Option<String>,
    /// Entities the task created or mutated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities_affected: Vec<EntityReference>,
    /// When the remote side started executing the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_time: Option<DateTime<Utc>>,
    /// When the task reached a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<DateTime<Utc>>,
}

impl TaskSnapshot {
    /// Look up the entity a completed task touched, by relationship tag.
    ///
    /// An OVA deployment, for example, records the deployed VM under the
    /// `vmm:ahv:config:vm` relationship; its `extId` is the new resource
    /// identifier.
    pub fn affected_entity(&self, rel: &str) -> Option<&str> {
        self.entities_affected
            .iter()
            .find(|e| e.rel.as_deref() == Some(rel))
            .map(|e| e.ext_id.as_str())
    }
}

/// Reference to a spawned task, returned by mutating API calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReference {
    /// Identifier of the spawned task
    pub ext_id: String,
}

/// Payload of a Prism response envelope.
///
/// The wire format carries a `$objectType` discriminator; it is resolved here,
/// once, at the client boundary. Downstream code only ever sees the concrete
/// variant it asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$objectType")]
pub enum ResponseData {
    /// A full task entity
    #[serde(rename = "prism.v4.config.Task")]
    Task(TaskSnapshot),
    /// A reference to a freshly spawned task
    #[serde(rename = "prism.v4.config.TaskReference")]
    TaskReference(TaskReference),
}

/// Top-level Prism response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// The discriminated payload
    pub data: ResponseData,
}

/// Source of task snapshots.
///
/// Decouples the waiter from any concrete API client: production code uses
/// [`crate::PrismClient`], tests script their own fetch sequences.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch the current snapshot of a task by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FetchError::NotYetVisible`] while the identifier is
    /// not resolvable yet, and a non-transient variant for any other failure.
    async fn fetch_task(&self, task_id: &str) -> FetchResult<TaskSnapshot>;
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn status_round_trips_wire_spelling() {
        for raw in ["QUEUED", "RUNNING", "SUCCEEDED", "FAILED", "CANCELED"] {
            let status = TaskStatus::from(raw.to_owned());
            assert_eq!(status.as_str(), raw);
        }

        let odd = TaskStatus::from("HALF_DONE".to_owned());
        assert_eq!(odd, TaskStatus::Other("HALF_DONE".to_owned()));
        assert_eq!(odd.as_str(), "HALF_DONE");
    }

    #[test]
    fn recognized_failures() {
        assert!(TaskStatus::Failed.is_recognized_failure());
        assert!(TaskStatus::Canceled.is_recognized_failure());
        assert!(!TaskStatus::Running.is_recognized_failure());
        assert!(!TaskStatus::Other("HALF_DONE".into()).is_recognized_failure());
    }

    #[test]
    fn envelope_resolves_task_entity() {
        let body = r#"{
            "data": {
                "$objectType": "prism.v4.config.Task",
                "extId": "ZXJnb24=:abc-123",
                "status": "SUCCEEDED",
                "entitiesAffected": [
                    {"extId": "vm-9", "rel": "vmm:ahv:config:vm"}
                ]
            }
        }"#;

        let envelope: ResponseEnvelope =
            serde_json::from_str(body).expect("should decode envelope");
        match envelope.data {
            ResponseData::Task(task) => {
                assert_eq!(task.status, TaskStatus::Succeeded);
                assert_eq!(task.affected_entity("vmm:ahv:config:vm"), Some("vm-9"));
                assert_eq!(task.affected_entity("vmm:ahv:config:disk"), None);
            }
            other => panic!("expected a task entity, got {other:?}"),
        }
    }

    #[test]
    fn envelope_resolves_task_reference() {
        let body = r#"{
            "data": {
                "$objectType": "prism.v4.config.TaskReference",
                "extId": "ZXJnb24=:def-456"
            }
        }"#;

        let envelope: ResponseEnvelope =
            serde_json::from_str(body).expect("should decode envelope");
        assert_eq!(
            envelope.data,
            ResponseData::TaskReference(TaskReference {
                ext_id: "ZXJnb24=:def-456".to_owned()
            })
        );
    }

    #[test]
    fn snapshot_keeps_failure_fields_verbatim() {
        let body = r#"{
            "extId": "t-1",
            "status": "FAILED",
            "errorDetail": "disk full",
            "progressMessage": "writing image (83%)"
        }"#;

        let snapshot: TaskSnapshot = serde_json::from_str(body).expect("should decode task");
        assert_eq!(snapshot.error_detail.as_deref(), Some("disk full"));
        assert_eq!(
            snapshot.progress_message.as_deref(),
            Some("writing image (83%)")
        );
    }
}
