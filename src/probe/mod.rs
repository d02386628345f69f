//! Existence probes and idempotent ensurers
//!
//! Each probe separates the pure question (does X exist?) from the
//! effecting answer (make X exist), so the idempotence contract can be
//! tested against fake collaborators without touching real tools.

use crate::external::{ClusterManager, ProbeError, ReleaseManager, WorkloadManager};
use std::path::Path;
use tracing::info;

/// Outcome of an idempotent ensure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    Created,
    AlreadyPresent,
}

/// Cluster state, computed on demand and never cached
///
/// Cluster existence can change externally between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterState {
    pub exists: bool,
    pub context_name: String,
}

/// Release state, computed on demand and never cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseState {
    pub exists: bool,
    pub revision: Option<i64>,
}

/// Queries and creates clusters through the cluster manager
pub struct ClusterProbe<'a> {
    manager: &'a dyn ClusterManager,
}

impl<'a> ClusterProbe<'a> {
    pub fn new(manager: &'a dyn ClusterManager) -> Self {
        ClusterProbe { manager }
    }

    pub async fn exists(&self, cluster: &str) -> Result<bool, ProbeError> {
        Ok(self.manager.list_clusters().await?.contains(cluster))
    }

    pub async fn state(&self, cluster: &str) -> Result<ClusterState, ProbeError> {
        Ok(ClusterState {
            exists: self.exists(cluster).await?,
            context_name: format!("kind-{}", cluster),
        })
    }

    /// Create the cluster if absent; calling twice never errors and never
    /// issues a duplicate create
    pub async fn ensure(
        &self,
        cluster: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<Ensured, ProbeError> {
        if self.exists(cluster).await? {
            info!(cluster = %cluster, "Cluster already exists");
            return Ok(Ensured::AlreadyPresent);
        }

        self.manager.create_cluster(cluster, kubeconfig).await?;
        Ok(Ensured::Created)
    }
}

/// Idempotently ensures a namespace exists
pub struct NamespaceEnsurer<'a> {
    manager: &'a dyn WorkloadManager,
}

impl<'a> NamespaceEnsurer<'a> {
    pub fn new(manager: &'a dyn WorkloadManager) -> Self {
        NamespaceEnsurer { manager }
    }

    pub async fn ensure(
        &self,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<Ensured, ProbeError> {
        if self.manager.namespace_exists(namespace, kubeconfig).await? {
            info!(namespace = %namespace, "Namespace already exists");
            return Ok(Ensured::AlreadyPresent);
        }

        self.manager.create_namespace(namespace, kubeconfig).await?;
        Ok(Ensured::Created)
    }
}

/// Queries release existence and revision through the release manager
pub struct ReleaseProbe<'a> {
    manager: &'a dyn ReleaseManager,
}

impl<'a> ReleaseProbe<'a> {
    pub fn new(manager: &'a dyn ReleaseManager) -> Self {
        ReleaseProbe { manager }
    }

    pub async fn state(
        &self,
        release: &str,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<ReleaseState, ProbeError> {
        let releases = self.manager.list_releases(namespace, kubeconfig).await?;

        Ok(match releases.iter().find(|r| r.name == release) {
            Some(found) => ReleaseState {
                exists: true,
                revision: Some(found.revision),
            },
            None => ReleaseState {
                exists: false,
                revision: None,
            },
        })
    }
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod tests;
