//! Deployment planning
//!
//! `build_plan` is a pure function from the environment registry to an
//! ordered step sequence; no I/O happens until the executor consumes the
//! plan. Runtime facts (does the cluster exist, does the release exist)
//! are deliberately left for execution time.

use crate::config::Environment;
use std::fmt;
use uuid::Uuid;

/// What an invocation is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Install,
    Status,
    Uninstall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    EnsureCluster,
    SwitchContext,
    EnsureNamespace,
    InstallOrUpgrade,
    Uninstall,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::EnsureCluster => "ensure-cluster",
            StepKind::SwitchContext => "switch-context",
            StepKind::EnsureNamespace => "ensure-namespace",
            StepKind::InstallOrUpgrade => "install-or-upgrade",
            StepKind::Uninstall => "uninstall",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned action against one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub environment: Environment,
}

/// Immutable, ordered step sequence for one invocation
#[derive(Debug, Clone)]
pub struct Plan {
    pub mode: Mode,
    /// Carried in every execution log line
    pub run_id: Uuid,
    pub steps: Vec<Step>,
}

impl Plan {
    /// Environments in plan order, each once
    pub fn environments(&self) -> Vec<&Environment> {
        let mut seen = Vec::new();
        for step in &self.steps {
            if !seen
                .iter()
                .any(|e: &&Environment| e.name == step.environment.name)
            {
                seen.push(&step.environment);
            }
        }
        seen
    }
}

/// Build the step sequence for the given environments and mode
///
/// Within an environment the order is fixed and significant: the context
/// switch must follow cluster existence but precede any namespace or
/// release operation, because the CLI-level collaborators are implicitly
/// scoped to the current context. Across environments the order is the
/// caller's registry order, and steps of different environments carry no
/// ordering dependency.
pub fn build_plan(environments: &[Environment], mode: Mode) -> Plan {
    let mut steps = Vec::new();

    for env in environments {
        let kinds: &[StepKind] = match mode {
            Mode::Install => &[
                StepKind::EnsureCluster,
                StepKind::SwitchContext,
                StepKind::EnsureNamespace,
                StepKind::InstallOrUpgrade,
            ],
            // Cluster absence is a runtime fact, resolved by the executor
            Mode::Uninstall => &[StepKind::SwitchContext, StepKind::Uninstall],
            Mode::Status => &[StepKind::SwitchContext],
        };

        for kind in kinds {
            steps.push(Step {
                kind: *kind,
                environment: env.clone(),
            });
        }
    }

    Plan {
        mode,
        run_id: Uuid::new_v4(),
        steps,
    }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
