use super::*;
use luotsi::config::Settings;
use luotsi::executor::{Action, FailureReason, Outcome};
use luotsi::plan::{Step, StepKind};

fn registry() -> Registry {
    Registry {
        app: "nur".to_string(),
        chart: "deploy/chart".into(),
        settings: Settings::default(),
        environments: vec![
            Environment {
                name: "dev".to_string(),
                cluster: "nur-dev".to_string(),
                namespace: "dev".to_string(),
                values: "deploy/values-dev.yaml".into(),
                kubeconfig: None,
                release: "nur-dev".to_string(),
            },
            Environment {
                name: "prd".to_string(),
                cluster: "nur-prd".to_string(),
                namespace: "prd".to_string(),
                values: "deploy/values-prd.yaml".into(),
                kubeconfig: None,
                release: "nur-prd".to_string(),
            },
        ],
    }
}

fn result(outcome: Outcome) -> StepResult {
    StepResult {
        step: Step {
            kind: StepKind::EnsureCluster,
            environment: registry().environments[0].clone(),
        },
        outcome,
        elapsed: Duration::ZERO,
    }
}

#[test]
fn test_select_all_environments_in_registry_order() {
    let registry = registry();

    let selected = select_environments(&registry, "all").unwrap();

    let names: Vec<&str> = selected.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["dev", "prd"]);
}

#[test]
fn test_select_single_environment() {
    let registry = registry();

    let selected = select_environments(&registry, "prd").unwrap();

    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].name, "prd");
}

#[test]
fn test_select_unknown_environment_names_the_alternatives() {
    let registry = registry();

    let err = select_environments(&registry, "stg").unwrap_err();

    assert!(err.to_string().contains("stg"));
    assert!(err.to_string().contains("dev, prd"));
}

#[test]
fn test_exit_code_zero_on_full_success() {
    let results = vec![
        result(Outcome::Success(Action::CreatedCluster)),
        result(Outcome::Success(Action::Installed)),
    ];

    assert_eq!(exit_code_for(&results), EXIT_OK);
}

#[test]
fn test_exit_code_zero_when_steps_skipped_without_failure() {
    let results = vec![result(Outcome::Skipped(
        luotsi::executor::SkipReason::ReleaseAbsent,
    ))];

    assert_eq!(exit_code_for(&results), EXIT_OK);
}

#[test]
fn test_exit_code_one_on_any_failure() {
    let results = vec![
        result(Outcome::Success(Action::CreatedCluster)),
        result(Outcome::Failed(FailureReason::Timeout {
            limit: Duration::from_secs(300),
        })),
    ];

    assert_eq!(exit_code_for(&results), EXIT_STEP_FAILED);
}

#[test]
fn test_exit_code_zero_on_empty_results() {
    assert_eq!(exit_code_for(&[]), EXIT_OK);
}
