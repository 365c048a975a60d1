//! Annotation-driven TTL garbage collection for Kubernetes pods and jobs.
//!
//! Each run lists every pod (and, optionally, every job) across all
//! namespaces, reads a TTL in seconds from a configured annotation and
//! deletes objects that have lived strictly longer than their TTL.

pub mod annotations;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod record;
pub mod store;
pub mod sweep;
pub mod telemetry;

pub use config::{ConfigError, SweeperConfig};
pub use error::{StoreError, SweepError};
pub use orchestrator::{RunSummary, SweepOrchestrator};
pub use record::{DeleteOptions, Propagation, ResourceKind, ResourceRecord, ResourceStatus};
pub use store::{KubeStore, ResourceStore};
pub use sweep::{Disposition, Reason, SweepResult, SweepRules, Sweeper};
