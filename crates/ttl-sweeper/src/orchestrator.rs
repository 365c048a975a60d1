//! Runs the configured kind sweeps in sequence with one shared `now`.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::SweepError;
use crate::record::ResourceKind;
use crate::store::ResourceStore;
use crate::sweep::{SweepResult, SweepRules, Sweeper};

/// Combined results of every sweep in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub results: Vec<SweepResult>,
}

impl RunSummary {
    /// Result for `kind`, if that kind was swept
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&SweepResult> {
        self.results.iter().find(|result| result.kind == kind)
    }

    #[must_use]
    pub fn total_deleted(&self) -> usize {
        self.results.iter().map(|result| result.deleted).sum()
    }

    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.results.iter().map(|result| result.skipped).sum()
    }

    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.results.iter().map(|result| result.failed).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, result) in self.results.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{kind}s deleted={}, {kind}s skipped={}",
                result.deleted,
                result.skipped,
                kind = result.kind
            )?;
            if result.failed > 0 {
                write!(f, ", {}s failed={}", result.kind, result.failed)?;
            }
        }
        Ok(())
    }
}

/// Sweeps pods and, optionally, jobs against an injected store
pub struct SweepOrchestrator<S: ResourceStore> {
    store: S,
    rules: SweepRules,
    kinds: Vec<ResourceKind>,
}

impl<S: ResourceStore> SweepOrchestrator<S> {
    /// Pods are always swept; jobs follow when `include_jobs` is set.
    #[must_use]
    pub fn new(store: S, rules: SweepRules, include_jobs: bool) -> Self {
        let kinds = if include_jobs {
            vec![ResourceKind::Pod, ResourceKind::Job]
        } else {
            vec![ResourceKind::Pod]
        };
        Self {
            store,
            rules,
            kinds,
        }
    }

    #[must_use]
    pub fn kinds(&self) -> &[ResourceKind] {
        &self.kinds
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run every sweep once against the same `now`.
    ///
    /// # Errors
    /// Propagates the first fatal [`SweepError`]; later kinds are not swept.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary, SweepError> {
        let sweeper = Sweeper::new(&self.store, &self.rules, now);
        let mut summary = RunSummary::default();

        for kind in &self.kinds {
            summary.results.push(sweeper.sweep(*kind).await?);
        }

        info!(
            deleted = summary.total_deleted(),
            skipped = summary.total_skipped(),
            failed = summary.total_failed(),
            dry_run = self.rules.dry_run,
            "FINISH ttl-sweeper: {summary}"
        );
        Ok(summary)
    }
}
