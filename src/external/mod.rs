//! Narrow interfaces over the external collaborators
//!
//! The cluster manager (kind), workload manager (kubectl), and release
//! manager (helm) are opaque external tools. Nothing here reimplements
//! them; each trait is the smallest surface the orchestration needs, and
//! each adapter is a thin `tokio::process` wrapper.

pub mod command;
pub mod helm;
pub mod kind;
pub mod kubectl;
pub mod prereq;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use helm::HelmReleaseManager;
pub use kind::KindClusterManager;
pub use kubectl::KubectlWorkloadManager;
pub use prereq::{check_prerequisites, PrereqError};

/// A collaborator was unreachable or answered with something we cannot use
///
/// Fatal to the enclosing step, never to the process.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("malformed output from {tool}: {detail}")]
    Malformed {
        tool: &'static str,
        detail: String,
    },
}

/// One entry from the release manager's listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub name: String,
    pub revision: i64,
}

/// Everything the release manager needs to install or upgrade a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub release: String,
    pub namespace: String,
    pub chart: PathBuf,
    pub values: PathBuf,
    pub kubeconfig: Option<PathBuf>,
    /// Block until the workload reports ready
    pub wait: bool,
}

/// Manages the lifecycle of named clusters
#[async_trait]
pub trait ClusterManager: Send + Sync {
    async fn list_clusters(&self) -> Result<BTreeSet<String>, ProbeError>;

    async fn create_cluster(
        &self,
        name: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError>;
}

/// Manages namespaces and the context selecting the target cluster
///
/// The kubeconfig is threaded explicitly through every call so that
/// isolated per-environment configurations stay isolated.
#[async_trait]
pub trait WorkloadManager: Send + Sync {
    async fn namespace_exists(
        &self,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<bool, ProbeError>;

    async fn create_namespace(
        &self,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError>;

    async fn switch_context(
        &self,
        context: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError>;
}

/// Manages named, versioned instantiations of the templated workload
#[async_trait]
pub trait ReleaseManager: Send + Sync {
    async fn list_releases(
        &self,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<Vec<ReleaseInfo>, ProbeError>;

    async fn install(&self, request: &ReleaseRequest) -> Result<(), ProbeError>;

    async fn upgrade(&self, request: &ReleaseRequest) -> Result<(), ProbeError>;

    async fn uninstall(
        &self,
        release: &str,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError>;
}
