//! In-memory [`ResourceStore`] and record builders shared by integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ttl_sweeper::{
    DeleteOptions, ResourceKind, ResourceRecord, ResourceStatus, ResourceStore, StoreError,
};

pub const TTL_KEY: &str = "cleanup.cto.dev/ttl-seconds";

/// A delete call observed by the fake store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
    pub options: DeleteOptions,
}

#[derive(Default)]
pub struct InMemoryStore {
    pub pods: Vec<ResourceRecord>,
    pub jobs: Vec<ResourceRecord>,
    /// `(namespace, name)` pairs whose delete call fails
    pub failing: HashSet<(String, String)>,
    /// `(namespace, name)` pairs reported as already gone
    pub vanished: HashSet<(String, String)>,
    pub list_error: Option<ResourceKind>,
    pub deletes: Mutex<Vec<DeleteCall>>,
    pub lists: Mutex<Vec<ResourceKind>>,
}

impl InMemoryStore {
    pub fn with_pods(pods: Vec<ResourceRecord>) -> Self {
        Self {
            pods,
            ..Default::default()
        }
    }

    pub fn deleted(&self) -> Vec<DeleteCall> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn deleted_names(&self) -> Vec<String> {
        self.deleted().into_iter().map(|call| call.name).collect()
    }

    pub fn listed(&self) -> Vec<ResourceKind> {
        self.lists.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<ResourceRecord>, StoreError> {
        self.lists.lock().unwrap().push(kind);
        if self.list_error == Some(kind) {
            return Err(StoreError::Other("connection refused".to_string()));
        }
        Ok(match kind {
            ResourceKind::Pod => self.pods.clone(),
            ResourceKind::Job => self.jobs.clone(),
        })
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        options: DeleteOptions,
    ) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push(DeleteCall {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            options,
        });

        let key = (namespace.to_string(), name.to_string());
        if self.vanished.contains(&key) {
            return Err(StoreError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        if self.failing.contains(&key) {
            return Err(StoreError::Other("forbidden".to_string()));
        }
        Ok(())
    }
}

fn annotations(ttl: Option<&str>) -> BTreeMap<String, String> {
    ttl.map(|value| BTreeMap::from([(TTL_KEY.to_string(), value.to_string())]))
        .unwrap_or_default()
}

pub fn pod(
    name: &str,
    phase: Option<&str>,
    age_secs: Option<i64>,
    ttl: Option<&str>,
    now: DateTime<Utc>,
) -> ResourceRecord {
    ResourceRecord {
        kind: ResourceKind::Pod,
        namespace: Some("workloads".to_string()),
        name: Some(name.to_string()),
        creation_timestamp: age_secs.map(|age| now - Duration::seconds(age)),
        annotations: annotations(ttl),
        status: ResourceStatus::Pod {
            phase: phase.map(str::to_string),
        },
    }
}

pub fn job(
    name: &str,
    active: Option<i32>,
    age_secs: Option<i64>,
    ttl: Option<&str>,
    now: DateTime<Utc>,
) -> ResourceRecord {
    ResourceRecord {
        kind: ResourceKind::Job,
        namespace: Some("batch".to_string()),
        name: Some(name.to_string()),
        creation_timestamp: age_secs.map(|age| now - Duration::seconds(age)),
        annotations: annotations(ttl),
        status: ResourceStatus::Job {
            active,
            succeeded: None,
            failed: None,
        },
    }
}
