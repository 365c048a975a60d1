//! # TTL Sweep
//!
//! One pass over every instance of a resource kind. Each record is classified
//! as [`Disposition::Delete`], [`Disposition::Keep`] or [`Disposition::Skip`]
//! against a single `now` snapshot, and expired records are deleted.
//!
//! Deletions are counted when attempted, not when confirmed, so
//! `deleted + skipped` always equals the number of records processed.
//! Failed attempts are also tallied in [`SweepResult::failed`].

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::annotations::{age_seconds, is_expired, ttl_seconds};
use crate::error::SweepError;
use crate::record::{ResourceKind, ResourceRecord};
use crate::store::ResourceStore;

/// Per-record outcome of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Delete,
    Keep,
    Skip,
}

/// Why a record ended up with its disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Pod phase outside Pending/Running
    IneligiblePhase,
    /// Annotation absent or not a non-negative integer
    NoTtlDirective,
    NoCreationTimestamp,
    WithinTtl,
    /// Expired job without active pods while active-only mode is on
    NoActivePods,
    Expired,
}

impl Reason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IneligiblePhase => "ineligible phase",
            Self::NoTtlDirective => "no ttl directive",
            Self::NoCreationTimestamp => "no creation timestamp",
            Self::WithinTtl => "within TTL",
            Self::NoActivePods => "no active pods",
            Self::Expired => "expired",
        }
    }
}

/// Decision for one record, before any delete call is made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub disposition: Disposition,
    pub reason: Reason,
    pub age_secs: Option<i64>,
    pub ttl_secs: Option<u64>,
}

impl Evaluation {
    fn skip(reason: Reason) -> Self {
        Self {
            disposition: Disposition::Skip,
            reason,
            age_secs: None,
            ttl_secs: None,
        }
    }
}

/// Knobs shared by every sweep in a run
#[derive(Debug, Clone, Default)]
pub struct SweepRules {
    /// Annotation holding the TTL in seconds
    pub annotation_key: String,
    /// Log decisions without issuing delete calls
    pub dry_run: bool,
    /// Only delete expired jobs that still have active pods
    pub jobs_require_active: bool,
}

/// Diagnostic record of what happened to one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub namespace: String,
    pub name: String,
    pub state: String,
    pub disposition: Disposition,
    pub reason: Reason,
    /// Set when a delete call was issued and failed
    pub delete_error: Option<String>,
}

/// Aggregate result of sweeping one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepResult {
    pub kind: ResourceKind,
    /// Delete attempts, including dry-run and failed ones
    pub deleted: usize,
    /// Skipped and kept records
    pub skipped: usize,
    /// Delete attempts that returned an error
    pub failed: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl SweepResult {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            deleted: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    #[must_use]
    pub fn processed(&self) -> usize {
        self.deleted + self.skipped
    }
}

/// Runs TTL sweeps against a store with a fixed notion of "now"
pub struct Sweeper<'a, S: ResourceStore + ?Sized> {
    store: &'a S,
    rules: &'a SweepRules,
    now: DateTime<Utc>,
}

impl<'a, S: ResourceStore + ?Sized> Sweeper<'a, S> {
    #[must_use]
    pub fn new(store: &'a S, rules: &'a SweepRules, now: DateTime<Utc>) -> Self {
        Self { store, rules, now }
    }

    /// Classify a record without touching the cluster.
    #[must_use]
    pub fn evaluate(&self, record: &ResourceRecord) -> Evaluation {
        if !record.kind.is_eligible(record) {
            return Evaluation::skip(Reason::IneligiblePhase);
        }

        let Some(ttl) = ttl_seconds(&record.annotations, &self.rules.annotation_key) else {
            return Evaluation::skip(Reason::NoTtlDirective);
        };
        let Some(created) = record.creation_timestamp else {
            return Evaluation::skip(Reason::NoCreationTimestamp);
        };

        let age = age_seconds(self.now, created);
        let (disposition, reason) = if !is_expired(age, ttl) {
            (Disposition::Keep, Reason::WithinTtl)
        } else if record.kind == ResourceKind::Job
            && self.rules.jobs_require_active
            && record.status.active_pods() <= 0
        {
            (Disposition::Keep, Reason::NoActivePods)
        } else {
            (Disposition::Delete, Reason::Expired)
        };

        Evaluation {
            disposition,
            reason,
            age_secs: Some(age),
            ttl_secs: Some(ttl),
        }
    }

    /// Sweep every instance of `kind`.
    ///
    /// # Errors
    /// Returns `SweepError::List` if the list call fails and
    /// `SweepError::MissingIdentity` as soon as a record without namespace or
    /// name is encountered; no later record is processed in that case.
    pub async fn sweep(&self, kind: ResourceKind) -> Result<SweepResult, SweepError> {
        info!("=== CLEANING UP {} ===", kind.plural());

        let records = self
            .store
            .list_all(kind)
            .await
            .map_err(|source| SweepError::List { kind, source })?;
        info!(kind = %kind, count = records.len(), "Found {} {}s total", records.len(), kind);

        let mut result = SweepResult::new(kind);
        for record in &records {
            let (namespace, name) = identity(kind, record)?;
            let state = record.status.label().to_string();
            let evaluation = self.evaluate(record);

            let mut outcome = RecordOutcome {
                namespace: namespace.to_string(),
                name: name.to_string(),
                state,
                disposition: evaluation.disposition,
                reason: evaluation.reason,
                delete_error: None,
            };

            match (evaluation.disposition, evaluation.age_secs, evaluation.ttl_secs) {
                (Disposition::Skip, _, _) => {
                    debug!(
                        namespace,
                        resource = name,
                        state = %outcome.state,
                        reason = evaluation.reason.as_str(),
                        "SKIP {kind} {namespace}/{name}"
                    );
                    result.skipped += 1;
                }
                (disposition, Some(age), Some(ttl)) => {
                    info!(
                        namespace,
                        resource = name,
                        state = %outcome.state,
                        age_secs = age,
                        ttl_secs = ttl,
                        "- CHECK {kind} {namespace}/{name}: state={}, age={age}s, ttl={ttl}s",
                        outcome.state
                    );
                    if disposition == Disposition::Delete {
                        result.deleted += 1;
                        outcome.delete_error = self.delete(kind, namespace, name, age, ttl).await;
                        if outcome.delete_error.is_some() {
                            result.failed += 1;
                        }
                    } else {
                        info!(
                            namespace,
                            resource = name,
                            reason = evaluation.reason.as_str(),
                            "  → KEEP {kind} {namespace}/{name} ({})",
                            evaluation.reason.as_str()
                        );
                        result.skipped += 1;
                    }
                }
                // Keep/Delete always carry age and ttl
                (_, _, _) => result.skipped += 1,
            }

            result.outcomes.push(outcome);
        }

        info!(
            kind = %kind,
            deleted = result.deleted,
            skipped = result.skipped,
            failed = result.failed,
            "{}: deleted={}, skipped={}",
            kind.plural(),
            result.deleted,
            result.skipped
        );
        Ok(result)
    }

    /// Issue the delete call; returns the error text when it fails.
    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        age: i64,
        ttl: u64,
    ) -> Option<String> {
        if self.rules.dry_run {
            info!(
                namespace,
                resource = name,
                "  → DRY RUN: would delete {kind} {namespace}/{name} (age {age}s > ttl {ttl}s)"
            );
            return None;
        }

        info!(
            namespace,
            resource = name,
            "  → DELETING {kind} {namespace}/{name} (age {age}s > ttl {ttl}s)"
        );
        match self
            .store
            .delete(kind, namespace, name, kind.delete_options())
            .await
        {
            Ok(()) => None,
            Err(e) if e.is_not_found() => {
                warn!(namespace, resource = name, error = %e, "  !! {kind} {namespace}/{name} already gone");
                Some(e.to_string())
            }
            Err(e) => {
                error!(namespace, resource = name, error = %e, "  !! ERROR deleting {kind} {namespace}/{name}: {e}");
                Some(e.to_string())
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Namespace and name of a listed record; both are guaranteed by the API
/// server, so their absence is fatal.
fn identity(kind: ResourceKind, record: &ResourceRecord) -> Result<(&str, &str), SweepError> {
    let namespace = non_empty(record.namespace.as_deref()).ok_or(SweepError::MissingIdentity {
        kind,
        field: "namespace",
    })?;
    let name = non_empty(record.name.as_deref()).ok_or(SweepError::MissingIdentity {
        kind,
        field: "name",
    })?;
    Ok((namespace, name))
}
