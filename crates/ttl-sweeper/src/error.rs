//! Error types for sweeping and the cluster store seam.

use thiserror::Error;

use crate::record::ResourceKind;

/// Errors raised by a [`ResourceStore`](crate::store::ResourceStore)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("Store error: {0}")]
    Other(String),
}

impl StoreError {
    /// True when the object was already gone, e.g. reaped by the cluster's
    /// own garbage collector between list and delete.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Kube(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

/// Fatal errors that abort a sweep
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("listed {kind} is missing its {field}; refusing to continue the sweep")]
    MissingIdentity {
        kind: ResourceKind,
        field: &'static str,
    },

    #[error("failed to list {kind}s across all namespaces: {source}")]
    List {
        kind: ResourceKind,
        #[source]
        source: StoreError,
    },
}
