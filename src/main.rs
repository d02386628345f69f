use clap::{Parser, Subcommand};
use luotsi::config::{Environment, Registry};
use luotsi::executor::{Collaborators, Executor, StepResult};
use luotsi::external::{
    check_prerequisites, HelmReleaseManager, KindClusterManager, KubectlWorkloadManager,
};
use luotsi::plan::{build_plan, Mode};
use luotsi::status::{StatusReport, StatusReporter};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Full success
const EXIT_OK: u8 = 0;
/// At least one environment step failed
const EXIT_STEP_FAILED: u8 = 1;
/// Missing collaborator binary or unusable registry
const EXIT_PREREQ: u8 = 2;

#[derive(Parser)]
#[command(
    name = "luotsi",
    about = "Idempotent multi-environment deployment orchestration over kind, kubectl and helm",
    version
)]
struct Cli {
    /// Path to the environment registry
    #[arg(long, global = true, env = "LUOTSI_CONFIG", default_value = "luotsi.toml")]
    config: PathBuf,

    /// Abort steps not yet started after this many seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll out one environment, or all of them
    Deploy {
        /// Environment name, or "all"
        target: String,
    },

    /// Report cluster and release state across environments
    Status {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Tear down releases in one environment, or all
    Clean {
        /// Environment name, or "all"
        target: String,
    },
}

/// Resolve a deploy/clean target against the registry
fn select_environments(registry: &Registry, target: &str) -> anyhow::Result<Vec<Environment>> {
    if target == "all" {
        return Ok(registry.environments.clone());
    }

    match registry.environment(target) {
        Some(env) => Ok(vec![env.clone()]),
        None => {
            let declared: Vec<&str> = registry
                .environments
                .iter()
                .map(|e| e.name.as_str())
                .collect();
            anyhow::bail!(
                "unknown environment {:?} (declared: {})",
                target,
                declared.join(", ")
            )
        }
    }
}

/// Any failed step anywhere yields a non-zero exit
fn exit_code_for(results: &[StepResult]) -> u8 {
    if results.iter().any(|r| r.outcome.is_failed()) {
        EXIT_STEP_FAILED
    } else {
        EXIT_OK
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_status_table(report: &StatusReport) {
    println!(
        "{:<14} {:<10} {:<10} {:<8}",
        "ENVIRONMENT", "CLUSTER", "RELEASE", "REVISION"
    );
    for entry in &report.environments {
        if let Some(err) = &entry.error {
            println!("{:<14} error: {}", entry.environment, err);
            continue;
        }
        println!(
            "{:<14} {:<10} {:<10} {:<8}",
            entry.environment,
            if entry.cluster_exists { "present" } else { "absent" },
            if entry.release_exists { "deployed" } else { "absent" },
            entry
                .revision
                .map_or_else(|| "-".to_string(), |r| r.to_string()),
        );
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    check_prerequisites()?;

    let registry = Registry::load(&cli.config)?;
    info!(
        registry = %cli.config.display(),
        environments = registry.environments.len(),
        "Registry loaded"
    );

    let wait_timeout = Duration::from_secs(registry.settings.wait_timeout_secs);
    let collaborators = Collaborators {
        clusters: Arc::new(KindClusterManager),
        workloads: Arc::new(KubectlWorkloadManager),
        releases: Arc::new(HelmReleaseManager::new(wait_timeout)),
    };

    let deadline = cli
        .deadline_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    let executor = |collaborators: Collaborators| {
        let mut executor = Executor::new(collaborators, registry.chart.clone(), wait_timeout)
            .with_parallel(registry.settings.parallel);
        if let Some(deadline) = deadline {
            executor = executor.with_deadline(deadline);
        }
        executor
    };

    match cli.command {
        Commands::Deploy { target } => {
            let environments = select_environments(&registry, &target)?;
            let plan = build_plan(&environments, Mode::Install);
            let results = executor(collaborators).execute(&plan).await;
            Ok(exit_code_for(&results))
        }
        Commands::Status { json } => {
            let plan = build_plan(&registry.environments, Mode::Status);
            let report = StatusReporter::new(collaborators).report(&plan).await;
            if json {
                print_json(&report)?;
            } else {
                print_status_table(&report);
            }
            Ok(if report.any_error() {
                EXIT_STEP_FAILED
            } else {
                EXIT_OK
            })
        }
        Commands::Clean { target } => {
            let environments = select_environments(&registry, &target)?;
            let plan = build_plan(&environments, Mode::Uninstall);
            let results = executor(collaborators).execute(&plan).await;
            Ok(exit_code_for(&results))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "Aborting before execution");
            ExitCode::from(EXIT_PREREQ)
        }
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
