//! Plan execution
//!
//! Steps of one environment run in strict sequence, because each step
//! depends on the side effect of the previous one. Environments are
//! independent units of work: a failure inside one marks its remaining
//! steps skipped and leaves every other environment untouched.

use crate::config::Environment;
use crate::external::{
    ClusterManager, ProbeError, ReleaseManager, ReleaseRequest, WorkloadManager,
};
use crate::plan::{Mode, Plan, Step, StepKind};
use crate::probe::{ClusterProbe, Ensured, NamespaceEnsurer, ReleaseProbe};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info};

/// Worker bound when parallel mode is enabled
const MAX_PARALLEL_ENVIRONMENTS: usize = 4;

/// What a successful step actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreatedCluster,
    ReusedCluster,
    SwitchedContext,
    CreatedNamespace,
    ReusedNamespace,
    Installed,
    Upgraded,
    Uninstalled,
}

/// Why a step did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An earlier step of the same environment failed
    PriorStepFailed,
    /// Teardown found no cluster to tear down
    ClusterAbsent,
    /// Teardown found no release to tear down
    ReleaseAbsent,
    /// The overall deadline expired before the step started
    Cancelled,
}

/// Why a step failed
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("wait for ready exceeded {limit:?}")]
    Timeout { limit: Duration },
}

#[derive(Debug)]
pub enum Outcome {
    Success(Action),
    Skipped(SkipReason),
    Failed(FailureReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct StepResult {
    pub step: Step,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl StepResult {
    fn instant(step: Step, outcome: Outcome) -> Self {
        StepResult {
            step,
            outcome,
            elapsed: Duration::ZERO,
        }
    }
}

/// The three external tools, behind their narrow seams
#[derive(Clone)]
pub struct Collaborators {
    pub clusters: Arc<dyn ClusterManager>,
    pub workloads: Arc<dyn WorkloadManager>,
    pub releases: Arc<dyn ReleaseManager>,
}

pub struct Executor {
    collaborators: Collaborators,
    chart: PathBuf,
    wait_timeout: Duration,
    deadline: Option<Instant>,
    parallel: bool,
}

impl Executor {
    pub fn new(collaborators: Collaborators, chart: PathBuf, wait_timeout: Duration) -> Self {
        Executor {
            collaborators,
            chart,
            wait_timeout,
            deadline: None,
            parallel: false,
        }
    }

    /// Abort steps not yet started once this instant passes
    ///
    /// Never interrupts an in-flight step.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Process environments concurrently
    ///
    /// Only sound with isolated per-environment kubeconfigs; registry
    /// validation enforces that before this is ever enabled.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Execute every step of the plan, one result per step, in plan order
    pub async fn execute(&self, plan: &Plan) -> Vec<StepResult> {
        info!(
            run = %plan.run_id,
            mode = ?plan.mode,
            steps = plan.steps.len(),
            parallel = self.parallel,
            "Executing plan"
        );

        let groups = group_by_environment(&plan.steps);

        let grouped = if self.parallel {
            let mut indexed: Vec<(usize, Vec<StepResult>)> =
                futures::stream::iter(groups.into_iter().enumerate().map(
                    |(index, steps)| async move {
                        (index, self.run_environment(plan.mode, steps).await)
                    },
                ))
                .buffer_unordered(MAX_PARALLEL_ENVIRONMENTS)
                .collect()
                .await;
            // Report in plan order regardless of completion order
            indexed.sort_by_key(|(index, _)| *index);
            indexed.into_iter().map(|(_, results)| results).collect()
        } else {
            let mut grouped = Vec::with_capacity(groups.len());
            for steps in groups {
                grouped.push(self.run_environment(plan.mode, steps).await);
            }
            grouped
        };

        let results: Vec<StepResult> = grouped.into_iter().flatten().collect();

        let failed = results.iter().filter(|r| r.outcome.is_failed()).count();
        let skipped = results.iter().filter(|r| r.outcome.is_skipped()).count();
        info!(
            run = %plan.run_id,
            total = results.len(),
            failed = failed,
            skipped = skipped,
            "Plan execution finished"
        );

        results
    }

    async fn run_environment(&self, mode: Mode, steps: Vec<Step>) -> Vec<StepResult> {
        if steps.is_empty() {
            return Vec::new();
        }

        // Teardown resolves cluster absence at execution time: a cluster
        // that is gone means there is nothing left to tear down.
        if mode == Mode::Uninstall && !self.cancelled() {
            let env = steps[0].environment.clone();
            let probe = ClusterProbe::new(self.collaborators.clusters.as_ref());
            match probe.exists(&env.cluster).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(environment = %env.name, cluster = %env.cluster, "Cluster absent, nothing to tear down");
                    return steps
                        .into_iter()
                        .map(|step| {
                            StepResult::instant(step, Outcome::Skipped(SkipReason::ClusterAbsent))
                        })
                        .collect();
                }
                Err(e) => {
                    error!(environment = %env.name, error = %e, "Cluster probe failed");
                    let mut results = Vec::with_capacity(steps.len());
                    let mut remaining = steps.into_iter();
                    if let Some(first) = remaining.next() {
                        results.push(StepResult::instant(
                            first,
                            Outcome::Failed(FailureReason::Probe(e)),
                        ));
                    }
                    for step in remaining {
                        results.push(StepResult::instant(
                            step,
                            Outcome::Skipped(SkipReason::PriorStepFailed),
                        ));
                    }
                    return results;
                }
            }
        }

        let mut results = Vec::with_capacity(steps.len());
        let mut failed = false;

        for step in steps {
            if self.cancelled() {
                results.push(StepResult::instant(
                    step,
                    Outcome::Skipped(SkipReason::Cancelled),
                ));
                continue;
            }
            if failed {
                results.push(StepResult::instant(
                    step,
                    Outcome::Skipped(SkipReason::PriorStepFailed),
                ));
                continue;
            }

            let started = Instant::now();
            let outcome = self.run_step(&step).await;
            let elapsed = started.elapsed();

            match &outcome {
                Outcome::Success(action) => {
                    info!(
                        environment = %step.environment.name,
                        step = %step.kind,
                        action = ?action,
                        elapsed = ?elapsed,
                        "Step succeeded"
                    );
                }
                Outcome::Skipped(reason) => {
                    info!(
                        environment = %step.environment.name,
                        step = %step.kind,
                        reason = ?reason,
                        "Step skipped"
                    );
                }
                Outcome::Failed(reason) => {
                    error!(
                        environment = %step.environment.name,
                        step = %step.kind,
                        reason = %reason,
                        "Step failed"
                    );
                    failed = true;
                }
            }

            results.push(StepResult {
                step,
                outcome,
                elapsed,
            });
        }

        results
    }

    async fn run_step(&self, step: &Step) -> Outcome {
        let env = &step.environment;
        let kubeconfig = env.kubeconfig.as_deref();

        let outcome = match step.kind {
            StepKind::EnsureCluster => self
                .ensure_cluster(env, kubeconfig)
                .await
                .map(Outcome::Success),
            StepKind::SwitchContext => self
                .switch_context(env, kubeconfig)
                .await
                .map(Outcome::Success),
            StepKind::EnsureNamespace => self
                .ensure_namespace(env, kubeconfig)
                .await
                .map(Outcome::Success),
            StepKind::InstallOrUpgrade => self
                .install_or_upgrade(env, kubeconfig)
                .await
                .map(Outcome::Success),
            StepKind::Uninstall => self.uninstall(env, kubeconfig).await,
        };

        outcome.unwrap_or_else(Outcome::Failed)
    }

    async fn ensure_cluster(
        &self,
        env: &Environment,
        kubeconfig: Option<&Path>,
    ) -> Result<Action, FailureReason> {
        let probe = ClusterProbe::new(self.collaborators.clusters.as_ref());
        match probe.ensure(&env.cluster, kubeconfig).await? {
            Ensured::Created => Ok(Action::CreatedCluster),
            Ensured::AlreadyPresent => Ok(Action::ReusedCluster),
        }
    }

    async fn switch_context(
        &self,
        env: &Environment,
        kubeconfig: Option<&Path>,
    ) -> Result<Action, FailureReason> {
        self.collaborators
            .workloads
            .switch_context(&env.context_name(), kubeconfig)
            .await?;
        Ok(Action::SwitchedContext)
    }

    async fn ensure_namespace(
        &self,
        env: &Environment,
        kubeconfig: Option<&Path>,
    ) -> Result<Action, FailureReason> {
        let ensurer = NamespaceEnsurer::new(self.collaborators.workloads.as_ref());
        match ensurer.ensure(&env.namespace, kubeconfig).await? {
            Ensured::Created => Ok(Action::CreatedNamespace),
            Ensured::AlreadyPresent => Ok(Action::ReusedNamespace),
        }
    }

    async fn install_or_upgrade(
        &self,
        env: &Environment,
        kubeconfig: Option<&Path>,
    ) -> Result<Action, FailureReason> {
        let probe = ReleaseProbe::new(self.collaborators.releases.as_ref());
        let state = probe.state(&env.release, &env.namespace, kubeconfig).await?;

        let request = ReleaseRequest {
            release: env.release.clone(),
            namespace: env.namespace.clone(),
            chart: self.chart.clone(),
            values: env.values.clone(),
            kubeconfig: env.kubeconfig.clone(),
            wait: true,
        };

        if state.exists {
            info!(
                release = %env.release,
                revision = ?state.revision,
                "Release exists, upgrading"
            );
            self.bounded(self.collaborators.releases.upgrade(&request))
                .await?;
            Ok(Action::Upgraded)
        } else {
            info!(release = %env.release, "Release absent, installing");
            self.bounded(self.collaborators.releases.install(&request))
                .await?;
            Ok(Action::Installed)
        }
    }

    async fn uninstall(
        &self,
        env: &Environment,
        kubeconfig: Option<&Path>,
    ) -> Result<Outcome, FailureReason> {
        let probe = ReleaseProbe::new(self.collaborators.releases.as_ref());
        let state = probe.state(&env.release, &env.namespace, kubeconfig).await?;

        // Absence is not an error for teardown
        if !state.exists {
            return Ok(Outcome::Skipped(SkipReason::ReleaseAbsent));
        }

        self.bounded(self.collaborators.releases.uninstall(
            &env.release,
            &env.namespace,
            kubeconfig,
        ))
        .await?;

        Ok(Outcome::Success(Action::Uninstalled))
    }

    /// Bound a blocking collaborator wait with the configured timeout
    async fn bounded<F>(&self, operation: F) -> Result<(), FailureReason>
    where
        F: std::future::Future<Output = Result<(), ProbeError>>,
    {
        match tokio::time::timeout(self.wait_timeout, operation).await {
            Ok(result) => result.map_err(FailureReason::Probe),
            Err(_) => Err(FailureReason::Timeout {
                limit: self.wait_timeout,
            }),
        }
    }

    fn cancelled(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Split the plan's steps into per-environment groups, preserving plan
/// order both across groups and within each group
fn group_by_environment(steps: &[Step]) -> Vec<Vec<Step>> {
    let mut groups: Vec<(String, Vec<Step>)> = Vec::new();

    for step in steps {
        match groups
            .iter_mut()
            .find(|(name, _)| *name == step.environment.name)
        {
            Some((_, group)) => group.push(step.clone()),
            None => groups.push((step.environment.name.clone(), vec![step.clone()])),
        }
    }

    groups.into_iter().map(|(_, group)| group).collect()
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
