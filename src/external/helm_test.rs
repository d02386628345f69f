use super::*;
use crate::external::ReleaseInfo;

#[test]
fn test_parse_list_output() {
    let stdout = r#"[
        {"name":"nur-dev","namespace":"dev","revision":"3","status":"deployed","chart":"nur-0.1.0"},
        {"name":"other","namespace":"dev","revision":"1","status":"deployed","chart":"other-2.0.0"}
    ]"#;

    let releases = parse_list_output(stdout).expect("parse helm list");

    assert_eq!(
        releases,
        vec![
            ReleaseInfo {
                name: "nur-dev".to_string(),
                revision: 3,
            },
            ReleaseInfo {
                name: "other".to_string(),
                revision: 1,
            },
        ]
    );
}

#[test]
fn test_parse_empty_list() {
    let releases = parse_list_output("[]").expect("parse empty list");
    assert!(releases.is_empty());
}

#[test]
fn test_truncated_output_is_malformed() {
    let err = parse_list_output("[{\"name\":\"nur-dev\"").expect_err("must fail");
    assert!(matches!(err, ProbeError::Malformed { tool: "helm", .. }));
}

#[test]
fn test_non_numeric_revision_is_malformed() {
    let stdout = r#"[{"name":"nur-dev","revision":"latest"}]"#;

    let err = parse_list_output(stdout).expect_err("must fail");

    assert!(matches!(err, ProbeError::Malformed { .. }));
    assert!(err.to_string().contains("nur-dev"));
}

#[test]
fn test_apply_args_with_wait_and_kubeconfig() {
    let manager = HelmReleaseManager::new(Duration::from_secs(120));
    let request = ReleaseRequest {
        release: "nur-dev".to_string(),
        namespace: "dev".to_string(),
        chart: "deploy/chart".into(),
        values: "deploy/values-dev.yaml".into(),
        kubeconfig: Some(".kube/dev.config".into()),
        wait: true,
    };

    let args = manager.apply_args("install", &request);

    let rendered: Vec<String> = args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        rendered,
        vec![
            "install",
            "nur-dev",
            "deploy/chart",
            "--namespace",
            "dev",
            "--values",
            "deploy/values-dev.yaml",
            "--wait",
            "--timeout",
            "120s",
            "--kubeconfig",
            ".kube/dev.config",
        ]
    );
}

#[test]
fn test_apply_args_without_wait_omits_timeout() {
    let manager = HelmReleaseManager::new(Duration::from_secs(120));
    let request = ReleaseRequest {
        release: "nur-dev".to_string(),
        namespace: "dev".to_string(),
        chart: "deploy/chart".into(),
        values: "deploy/values-dev.yaml".into(),
        kubeconfig: None,
        wait: false,
    };

    let args = manager.apply_args("upgrade", &request);

    assert!(!args.iter().any(|a| a == "--wait"));
    assert!(!args.iter().any(|a| a == "--timeout"));
}
