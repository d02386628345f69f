//! kind adapter for the cluster manager seam

use super::command;
use super::{ClusterManager, ProbeError};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

/// Drives the `kind` binary
pub struct KindClusterManager;

#[async_trait]
impl ClusterManager for KindClusterManager {
    async fn list_clusters(&self) -> Result<BTreeSet<String>, ProbeError> {
        let stdout = command::capture("kind", ["get", "clusters"]).await?;

        // One cluster name per line; empty output means no clusters
        Ok(stdout
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    async fn create_cluster(
        &self,
        name: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError> {
        info!(cluster = %name, "Creating kind cluster");

        let mut args: Vec<OsString> = vec![
            "create".into(),
            "cluster".into(),
            "--name".into(),
            name.into(),
        ];
        if let Some(path) = kubeconfig {
            args.push("--kubeconfig".into());
            args.push(path.as_os_str().to_os_string());
        }

        command::run("kind", args).await?;

        info!(cluster = %name, "Cluster ready");
        Ok(())
    }
}
