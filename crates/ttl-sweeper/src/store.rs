//! Cluster store capability consumed by the sweeper.
//!
//! The sweep only ever needs two operations per kind: list every instance
//! across all namespaces, and delete one instance by namespace and name.
//! [`KubeStore`] implements them against the API server; tests substitute
//! an in-memory store.

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams, PropagationPolicy};
use kube::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::StoreError;
use crate::record::{DeleteOptions, Propagation, ResourceKind, ResourceRecord};

/// Default number of objects requested per list page
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// List/delete capability over cluster objects
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// List every instance of `kind` across all namespaces, in server order.
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<ResourceRecord>, StoreError>;

    /// Delete a single namespaced instance of `kind`.
    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        options: DeleteOptions,
    ) -> Result<(), StoreError>;
}

/// [`ResourceStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    page_size: u32,
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the list page size (values below 1 are clamped to 1)
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn list_paged<K>(&self, api: &Api<K>) -> Result<Vec<K>, kube::Error>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        let mut items = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = ListParams::default().limit(self.page_size);
            if let Some(token) = continue_token.as_deref() {
                params = params.continue_token(token);
            }

            let page = api.list(&params).await?;
            debug!(count = page.items.len(), "Fetched list page");
            items.extend(page.items);

            match page.metadata.continue_.filter(|token| !token.is_empty()) {
                Some(token) => continue_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }
}

fn delete_params(options: DeleteOptions) -> DeleteParams {
    DeleteParams {
        propagation_policy: options.propagation.map(|mode| match mode {
            Propagation::Background => PropagationPolicy::Background,
            Propagation::Foreground => PropagationPolicy::Foreground,
            Propagation::Orphan => PropagationPolicy::Orphan,
        }),
        ..Default::default()
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<ResourceRecord>, StoreError> {
        let records = match kind {
            ResourceKind::Pod => {
                let pods: Api<Pod> = Api::all(self.client.clone());
                self.list_paged(&pods)
                    .await?
                    .into_iter()
                    .map(ResourceRecord::from)
                    .collect()
            }
            ResourceKind::Job => {
                let jobs: Api<Job> = Api::all(self.client.clone());
                self.list_paged(&jobs)
                    .await?
                    .into_iter()
                    .map(ResourceRecord::from)
                    .collect()
            }
        };
        Ok(records)
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        options: DeleteOptions,
    ) -> Result<(), StoreError> {
        let params = delete_params(options);
        match kind {
            ResourceKind::Pod => {
                let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
                pods.delete(name, &params).await?;
            }
            ResourceKind::Job => {
                let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
                jobs.delete(name, &params).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_delete_params_request_background_cascade() {
        let params = delete_params(ResourceKind::Job.delete_options());
        assert!(matches!(
            params.propagation_policy,
            Some(PropagationPolicy::Background)
        ));
    }

    #[test]
    fn pod_delete_params_use_server_default() {
        let params = delete_params(ResourceKind::Pod.delete_options());
        assert!(params.propagation_policy.is_none());
        assert!(params.grace_period_seconds.is_none());
    }
}
