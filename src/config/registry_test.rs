use super::registry::{Registry, RegistryError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_registry(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write registry");
    file
}

const MINIMAL: &str = r#"
app = "nur"
chart = "deploy/chart"

[[environments]]
name = "dev"
cluster = "nur-dev"
namespace = "dev"
values = "deploy/values-dev.yaml"

[[environments]]
name = "prd"
cluster = "nur-prd"
namespace = "prd"
values = "deploy/values-prd.yaml"
"#;

#[test]
fn test_load_minimal_registry() {
    let file = write_registry(MINIMAL);

    let registry = Registry::load(file.path()).expect("load registry");

    assert_eq!(registry.app, "nur");
    assert_eq!(registry.environments.len(), 2);
    assert_eq!(registry.environments[0].name, "dev");
    assert_eq!(registry.environments[0].cluster, "nur-dev");
    assert_eq!(registry.environments[1].namespace, "prd");
    // Defaults apply when [settings] is absent
    assert!(!registry.settings.parallel);
    assert_eq!(registry.settings.wait_timeout_secs, 300);
}

#[test]
fn test_release_names_derived_from_app() {
    let file = write_registry(MINIMAL);

    let registry = Registry::load(file.path()).expect("load registry");

    assert_eq!(registry.environments[0].release, "nur-dev");
    assert_eq!(registry.environments[1].release, "nur-prd");
}

#[test]
fn test_explicit_release_name_wins() {
    let file = write_registry(
        r#"
app = "nur"
chart = "deploy/chart"

[[environments]]
name = "dev"
cluster = "nur-dev"
namespace = "dev"
values = "deploy/values-dev.yaml"
release = "legacy-name"
"#,
    );

    let registry = Registry::load(file.path()).expect("load registry");

    assert_eq!(registry.environments[0].release, "legacy-name");
}

#[test]
fn test_context_name_follows_kind_convention() {
    let file = write_registry(MINIMAL);

    let registry = Registry::load(file.path()).expect("load registry");

    assert_eq!(registry.environments[0].context_name(), "kind-nur-dev");
}

#[test]
fn test_duplicate_environment_names_rejected() {
    let file = write_registry(
        r#"
app = "nur"
chart = "deploy/chart"

[[environments]]
name = "dev"
cluster = "nur-dev"
namespace = "dev"
values = "a.yaml"

[[environments]]
name = "dev"
cluster = "nur-dev-2"
namespace = "dev2"
values = "b.yaml"
"#,
    );

    let err = Registry::load(file.path()).expect_err("duplicate names must fail");
    assert!(matches!(err, RegistryError::Invalid(_)));
    assert!(err.to_string().contains("duplicate environment name"));
}

#[test]
fn test_empty_registry_rejected() {
    let file = write_registry(
        r#"
app = "nur"
chart = "deploy/chart"
"#,
    );

    let err = Registry::load(file.path()).expect_err("empty registry must fail");
    assert!(matches!(err, RegistryError::Invalid(_)));
}

#[test]
fn test_parallel_requires_kubeconfig_isolation() {
    let file = write_registry(
        r#"
app = "nur"
chart = "deploy/chart"

[settings]
parallel = true

[[environments]]
name = "dev"
cluster = "nur-dev"
namespace = "dev"
values = "a.yaml"
kubeconfig = ".kube/dev.config"

[[environments]]
name = "prd"
cluster = "nur-prd"
namespace = "prd"
values = "b.yaml"
"#,
    );

    let err = Registry::load(file.path()).expect_err("parallel without isolation must fail");
    assert!(err.to_string().contains("prd"));
}

#[test]
fn test_parallel_accepted_with_full_isolation() {
    let file = write_registry(
        r#"
app = "nur"
chart = "deploy/chart"

[settings]
parallel = true
wait_timeout_secs = 60

[[environments]]
name = "dev"
cluster = "nur-dev"
namespace = "dev"
values = "a.yaml"
kubeconfig = ".kube/dev.config"
"#,
    );

    let registry = Registry::load(file.path()).expect("load registry");
    assert!(registry.settings.parallel);
    assert_eq!(registry.settings.wait_timeout_secs, 60);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Registry::load(std::path::Path::new("/nonexistent/luotsi.toml"))
        .expect_err("missing file must fail");
    assert!(matches!(err, RegistryError::Io { .. }));
}

#[test]
fn test_environment_lookup() {
    let file = write_registry(MINIMAL);

    let registry = Registry::load(file.path()).expect("load registry");

    assert!(registry.environment("dev").is_some());
    assert!(registry.environment("stg").is_none());
}
