//! kubectl adapter for the workload manager seam

use super::command;
use super::{ProbeError, WorkloadManager};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info};

/// Drives the `kubectl` binary
pub struct KubectlWorkloadManager;

fn with_kubeconfig(mut args: Vec<OsString>, kubeconfig: Option<&Path>) -> Vec<OsString> {
    if let Some(path) = kubeconfig {
        args.push("--kubeconfig".into());
        args.push(path.as_os_str().to_os_string());
    }
    args
}

#[async_trait]
impl WorkloadManager for KubectlWorkloadManager {
    async fn namespace_exists(
        &self,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<bool, ProbeError> {
        let args = with_kubeconfig(
            vec!["get".into(), "namespace".into(), namespace.into()],
            kubeconfig,
        );

        let output = command::raw_output("kubectl", args).await?;

        if output.status.success() {
            return Ok(true);
        }

        // kubectl answers a missing namespace with a NotFound error on
        // stderr; anything else is a real failure
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("NotFound") {
            debug!(namespace = %namespace, "Namespace not found");
            return Ok(false);
        }

        Err(command::command_failed("kubectl", &output))
    }

    async fn create_namespace(
        &self,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError> {
        info!(namespace = %namespace, "Creating namespace");

        let args = with_kubeconfig(
            vec!["create".into(), "namespace".into(), namespace.into()],
            kubeconfig,
        );

        command::run("kubectl", args).await
    }

    async fn switch_context(
        &self,
        context: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError> {
        info!(context = %context, "Switching kubectl context");

        let args = with_kubeconfig(
            vec!["config".into(), "use-context".into(), context.into()],
            kubeconfig,
        );

        command::run("kubectl", args).await
    }
}
