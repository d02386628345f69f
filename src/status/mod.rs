//! Read-only status reporting across environments
//!
//! Never mutates anything except the current context, which it must
//! switch to scope the release query. A missing cluster short-circuits
//! the environment without touching the release manager at all.

use crate::executor::Collaborators;
use crate::plan::Plan;
use crate::probe::{ClusterProbe, ReleaseProbe};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// State of one environment at report time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub environment: String,
    pub cluster_exists: bool,
    pub release_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    /// Probe failure, isolated to this environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusEntry {
    fn absent(environment: String) -> Self {
        StatusEntry {
            environment,
            cluster_exists: false,
            release_exists: false,
            revision: None,
            error: None,
        }
    }

    fn failed(environment: String, error: String) -> Self {
        StatusEntry {
            environment,
            cluster_exists: false,
            release_exists: false,
            revision: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub environments: Vec<StatusEntry>,
}

impl StatusReport {
    pub fn any_error(&self) -> bool {
        self.environments.iter().any(|e| e.error.is_some())
    }
}

pub struct StatusReporter {
    collaborators: Collaborators,
}

impl StatusReporter {
    pub fn new(collaborators: Collaborators) -> Self {
        StatusReporter { collaborators }
    }

    /// Read current state for every environment of a Status-mode plan
    ///
    /// Environment order is the plan's order. Probe failures land in the
    /// affected entry and never abort the remaining environments.
    pub async fn report(&self, plan: &Plan) -> StatusReport {
        let mut entries = Vec::new();

        for env in plan.environments() {
            entries.push(self.environment_entry(env).await);
        }

        StatusReport {
            generated_at: Utc::now(),
            environments: entries,
        }
    }

    async fn environment_entry(&self, env: &crate::config::Environment) -> StatusEntry {
        let kubeconfig = env.kubeconfig.as_deref();
        let cluster_probe = ClusterProbe::new(self.collaborators.clusters.as_ref());

        let cluster = match cluster_probe.state(&env.cluster).await {
            Ok(state) => state,
            Err(e) => {
                warn!(environment = %env.name, error = %e, "Cluster probe failed");
                return StatusEntry::failed(env.name.clone(), e.to_string());
            }
        };

        // Querying a nonexistent cluster's context is a no-op returning
        // false, not an error
        if !cluster.exists {
            info!(environment = %env.name, cluster = %env.cluster, "Cluster absent");
            return StatusEntry::absent(env.name.clone());
        }

        if let Err(e) = self
            .collaborators
            .workloads
            .switch_context(&cluster.context_name, kubeconfig)
            .await
        {
            warn!(environment = %env.name, error = %e, "Context switch failed");
            return StatusEntry {
                environment: env.name.clone(),
                cluster_exists: true,
                release_exists: false,
                revision: None,
                error: Some(e.to_string()),
            };
        }

        let release_probe = ReleaseProbe::new(self.collaborators.releases.as_ref());
        match release_probe
            .state(&env.release, &env.namespace, kubeconfig)
            .await
        {
            Ok(release) => StatusEntry {
                environment: env.name.clone(),
                cluster_exists: true,
                release_exists: release.exists,
                revision: release.revision,
                error: None,
            },
            Err(e) => {
                warn!(environment = %env.name, error = %e, "Release probe failed");
                StatusEntry {
                    environment: env.name.clone(),
                    cluster_exists: true,
                    release_exists: false,
                    revision: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
