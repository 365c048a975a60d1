//! Kind-agnostic view of the cluster objects the sweeper inspects.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Pod phases that still hold cluster resources and may be reaped.
const ELIGIBLE_POD_PHASES: [&str; 2] = ["Pending", "Running"];

/// Resource kinds the sweeper knows how to clean up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Job,
}

impl ResourceKind {
    /// Plural, upper-case label used in section headers and summaries
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Self::Pod => "PODS",
            Self::Job => "JOBS",
        }
    }

    /// Whether a record passes the kind's pre-TTL filter.
    ///
    /// Pods must be `Pending` or `Running`; jobs are always considered.
    #[must_use]
    pub fn is_eligible(self, record: &ResourceRecord) -> bool {
        match &record.status {
            ResourceStatus::Pod { phase } => phase
                .as_deref()
                .is_some_and(|phase| ELIGIBLE_POD_PHASES.contains(&phase)),
            ResourceStatus::Job { .. } => true,
        }
    }

    /// Delete options for this kind. Jobs cascade to their pods in the background.
    #[must_use]
    pub fn delete_options(self) -> DeleteOptions {
        match self {
            Self::Pod => DeleteOptions::default(),
            Self::Job => DeleteOptions {
                propagation: Some(Propagation::Background),
            },
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pod => write!(f, "pod"),
            Self::Job => write!(f, "job"),
        }
    }
}

/// Garbage collector propagation mode for dependents of a deleted object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Background,
    Foreground,
    Orphan,
}

/// Options attached to a single delete call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// `None` leaves the choice to the API server default
    pub propagation: Option<Propagation>,
}

/// Kind-specific status carried by a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    Pod {
        phase: Option<String>,
    },
    Job {
        active: Option<i32>,
        succeeded: Option<i32>,
        failed: Option<i32>,
    },
}

impl ResourceStatus {
    /// Diagnostic label: the pod phase, or the derived job state.
    ///
    /// Job state is `Active`, `Succeeded`, `Failed` or `Unknown`, checked in
    /// that order with the first positive counter winning.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pod { phase } => phase.as_deref().unwrap_or("Unknown"),
            Self::Job {
                active,
                succeeded,
                failed,
            } => {
                let positive = |count: &Option<i32>| count.is_some_and(|n| n > 0);
                if positive(active) {
                    "Active"
                } else if positive(succeeded) {
                    "Succeeded"
                } else if positive(failed) {
                    "Failed"
                } else {
                    "Unknown"
                }
            }
        }
    }

    /// Number of active pods for a job, zero for anything else.
    #[must_use]
    pub fn active_pods(&self) -> i32 {
        match self {
            Self::Job { active, .. } => active.unwrap_or(0),
            Self::Pod { .. } => 0,
        }
    }
}

/// A listed cluster object, reduced to what the TTL decision needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub annotations: BTreeMap<String, String>,
    pub status: ResourceStatus,
}

impl ResourceRecord {
    fn from_meta(kind: ResourceKind, metadata: ObjectMeta, status: ResourceStatus) -> Self {
        Self {
            kind,
            namespace: metadata.namespace,
            name: metadata.name,
            creation_timestamp: metadata.creation_timestamp.map(|time| time.0),
            annotations: metadata.annotations.unwrap_or_default(),
            status,
        }
    }
}

impl From<Pod> for ResourceRecord {
    fn from(pod: Pod) -> Self {
        let phase = pod.status.and_then(|status| status.phase);
        Self::from_meta(ResourceKind::Pod, pod.metadata, ResourceStatus::Pod { phase })
    }
}

impl From<Job> for ResourceRecord {
    fn from(job: Job) -> Self {
        let status = job.status.unwrap_or_default();
        Self::from_meta(
            ResourceKind::Job,
            job.metadata,
            ResourceStatus::Job {
                active: status.active,
                succeeded: status.succeeded,
                failed: status.failed,
            },
        )
    }
}
