//! Asynchronous task polling for the Nutanix Prism v4 API.
//!
//! Mutating Prism operations (VM deployment from an OVA, disk attach,
//! power-state changes, deletes, ...) return immediately with a task
//! reference; the work itself runs asynchronously on the cluster. This crate
//! provides the waiter that bridges the gap:
//!
//! - [`TaskWaiter`] polls a task at a fixed cadence until it reaches a
//!   target status, a failure status, or a deadline elapses
//! - [`WaitConfig`] carries the pending/target status sets and timing knobs
//! - [`PrismClient`] is a ready-made [`TaskStore`] for the Prism v4 task
//!   endpoint
//!
//! # Examples
//!
//! ```no_run
//! use prism_tasks::{PrismClient, PrismConfig, TaskWaiter, WaitConfig};
//!
//! # async fn example() {
//! let client = PrismClient::new(PrismConfig::new(
//!     "https://prism-central:9440",
//!     "admin",
//!     "secret",
//! ))
//! .expect("valid endpoint");
//!
//! // A mutating call returned this task identifier earlier.
//! let waiter = TaskWaiter::new(&client, WaitConfig::creation());
//! let task = waiter.wait("ZXJnb24=:7f1a9c2e").await.expect("deployment");
//!
//! let vm_id = task.affected_entity("vmm:ahv:config:vm");
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod waiter;

pub use client::PrismClient;
pub use client::PrismConfig;
pub use config::StatusClass;
pub use config::WaitConfig;
pub use error::FetchError;
pub use error::FetchResult;
pub use error::WaitError;
pub use error::WaitResult;
pub use types::EntityReference;
pub use types::ResponseData;
pub use types::ResponseEnvelope;
pub use types::TaskReference;
pub use types::TaskSnapshot;
pub use types::TaskStatus;
pub use types::TaskStore;
pub use waiter::wait_for_task;
pub use waiter::TaskWaiter;
pub use waiter::WaitState;
