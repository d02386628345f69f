//! helm adapter for the release manager seam

use super::command;
use super::{ProbeError, ReleaseInfo, ReleaseManager, ReleaseRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// One entry of `helm list --output json`
///
/// helm reports the revision as a string.
#[derive(Debug, Deserialize)]
struct HelmListEntry {
    name: String,
    revision: String,
}

/// Parse `helm list --output json` into release infos
fn parse_list_output(stdout: &str) -> Result<Vec<ReleaseInfo>, ProbeError> {
    let entries: Vec<HelmListEntry> =
        serde_json::from_str(stdout).map_err(|e| ProbeError::Malformed {
            tool: "helm",
            detail: format!("list output: {}", e),
        })?;

    entries
        .into_iter()
        .map(|entry| {
            let revision = entry.revision.parse::<i64>().map_err(|_| ProbeError::Malformed {
                tool: "helm",
                detail: format!("revision {:?} for release {}", entry.revision, entry.name),
            })?;
            Ok(ReleaseInfo {
                name: entry.name,
                revision,
            })
        })
        .collect()
}

/// Drives the `helm` binary
pub struct HelmReleaseManager {
    wait_timeout: Duration,
}

impl HelmReleaseManager {
    pub fn new(wait_timeout: Duration) -> Self {
        HelmReleaseManager { wait_timeout }
    }

    fn timeout_arg(&self) -> OsString {
        format!("{}s", self.wait_timeout.as_secs()).into()
    }

    fn apply_args(&self, verb: &str, request: &ReleaseRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            verb.into(),
            request.release.as_str().into(),
            request.chart.as_os_str().to_os_string(),
            "--namespace".into(),
            request.namespace.as_str().into(),
            "--values".into(),
            request.values.as_os_str().to_os_string(),
        ];
        if request.wait {
            args.push("--wait".into());
            args.push("--timeout".into());
            args.push(self.timeout_arg());
        }
        if let Some(path) = &request.kubeconfig {
            args.push("--kubeconfig".into());
            args.push(path.as_os_str().to_os_string());
        }
        args
    }
}

#[async_trait]
impl ReleaseManager for HelmReleaseManager {
    async fn list_releases(
        &self,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<Vec<ReleaseInfo>, ProbeError> {
        let mut args: Vec<OsString> = vec![
            "list".into(),
            "--namespace".into(),
            namespace.into(),
            "--output".into(),
            "json".into(),
        ];
        if let Some(path) = kubeconfig {
            args.push("--kubeconfig".into());
            args.push(path.as_os_str().to_os_string());
        }

        let stdout = command::capture("helm", args).await?;
        parse_list_output(&stdout)
    }

    async fn install(&self, request: &ReleaseRequest) -> Result<(), ProbeError> {
        info!(release = %request.release, namespace = %request.namespace, "Installing release");
        command::run("helm", self.apply_args("install", request)).await
    }

    async fn upgrade(&self, request: &ReleaseRequest) -> Result<(), ProbeError> {
        info!(release = %request.release, namespace = %request.namespace, "Upgrading release");
        command::run("helm", self.apply_args("upgrade", request)).await
    }

    async fn uninstall(
        &self,
        release: &str,
        namespace: &str,
        kubeconfig: Option<&Path>,
    ) -> Result<(), ProbeError> {
        info!(release = %release, namespace = %namespace, "Uninstalling release");

        let mut args: Vec<OsString> = vec![
            "uninstall".into(),
            release.into(),
            "--namespace".into(),
            namespace.into(),
            "--timeout".into(),
            self.timeout_arg(),
        ];
        if let Some(path) = kubeconfig {
            args.push("--kubeconfig".into());
            args.push(path.as_os_str().to_os_string());
        }

        command::run("helm", args).await
    }
}

#[cfg(test)]
#[path = "helm_test.rs"]
mod tests;
