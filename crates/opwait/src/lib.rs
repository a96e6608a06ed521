//! opwait: completion poller for long-running cloud operations
//!
//! Control-plane APIs accept a mutating request (create a graph, restart a
//! cluster, delete a backup) and finish the work asynchronously. This crate
//! provides the one loop every resource handler needs afterwards: probe the
//! resource, classify its status, and stop on success, failure, timeout or
//! cancellation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           resource lifecycle handler             │
//! │     (submit request, then wait for it)           │
//! └─────────────────┬───────────────────────────────┘
//!                   │ probe + classifier + config
//! ┌─────────────────▼───────────────────────────────┐
//! │                    opwait                        │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │            OperationPoller               │   │
//! │  │   delay → probe → classify → interval    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐ ┌──────────────┐ ┌─────────┐  │
//! │  │ StatusTable  │ │ status (JSON)│ │ config  │  │
//! │  └──────────────┘ └──────────────┘ └─────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use opwait::{status, OperationPoller, PollConfig, ProbeError, StatusTable};
//! use std::time::Duration;
//!
//! let probe = move || {
//!     let client = client.clone();
//!     let id = graph_id.clone();
//!     async move {
//!         client.get_graph(&id).await.map_err(|e| ProbeError::request(e.to_string()))
//!     }
//! };
//! let classifier = StatusTable::new()
//!     .success(["200"])
//!     .failure(["300", "303", "800"])
//!     .with_extractor(status::json_status("graph.status"));
//! let config = PollConfig::new(Duration::from_secs(3600))
//!     .with_interval(Duration::from_secs(30))
//!     .stabilize(3);
//!
//! let body = OperationPoller::new(probe, classifier, config)
//!     .label(format!("graph-create/{}", graph_id))
//!     .wait()
//!     .await?;
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod poller;
pub mod status;

// Re-exports
pub use classify::{Classification, Classify, StatusTable, TableClassifier, UnknownStatus};
pub use config::{Phase, PollConfig, PollOverride, PollProfiles, PollSettings, ResourceTimeouts};
pub use error::{ConfigError, ProbeError, Result, WaitError};
pub use poller::{Completion, OperationPoller, Probe, WaitResult, wait_until_terminal};
pub use tokio_util::sync::CancellationToken;
