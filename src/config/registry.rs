use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid registry: {0}")]
    Invalid(String),
}

/// Process-wide tuning knobs
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Process environments concurrently
    ///
    /// Only accepted when every environment declares its own kubeconfig,
    /// because the kubectl context is otherwise a process-wide singleton.
    #[serde(default)]
    pub parallel: bool,

    /// Upper bound on install/upgrade/uninstall waits, in seconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
}

fn default_wait_timeout() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            parallel: false,
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

/// One deployment target: a named cluster plus the namespace and values
/// overlay the release lands with
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Environment {
    /// Short identifier, e.g. "dev"
    pub name: String,

    /// Name of the backing kind cluster
    pub cluster: String,

    /// Namespace the release is installed into
    pub namespace: String,

    /// Values overlay handed to the release manager, never parsed here
    pub values: PathBuf,

    /// Isolated kubeconfig for this environment
    ///
    /// Required on every environment before `settings.parallel` is accepted.
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Release name; derived as `<app>-<name>` at load time unless set
    #[serde(default)]
    pub release: String,
}

impl Environment {
    /// Context kind registers for this environment's cluster
    pub fn context_name(&self) -> String {
        format!("kind-{}", self.cluster)
    }
}

/// The full registry: app identity, chart reference, settings, and the
/// ordered list of environments
#[derive(Debug, Clone, Deserialize)]
pub struct Registry {
    /// Application name; release names derive from it
    pub app: String,

    /// Chart reference handed to the release manager
    pub chart: PathBuf,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub environments: Vec<Environment>,
}

impl Registry {
    /// Load and validate a registry from a TOML file
    pub fn load(path: &Path) -> Result<Registry, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut registry: Registry =
            toml::from_str(&content).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        registry.validate()?;
        registry.derive_release_names();

        Ok(registry)
    }

    /// Validate cross-field invariants serde cannot express
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.app.is_empty() {
            return Err(RegistryError::Invalid("app name is empty".to_string()));
        }

        if self.environments.is_empty() {
            return Err(RegistryError::Invalid(
                "no environments declared".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for env in &self.environments {
            if !seen.insert(env.name.as_str()) {
                return Err(RegistryError::Invalid(format!(
                    "duplicate environment name: {}",
                    env.name
                )));
            }
        }

        if self.settings.parallel {
            for env in &self.environments {
                if env.kubeconfig.is_none() {
                    return Err(RegistryError::Invalid(format!(
                        "parallel mode requires a kubeconfig on every environment, missing on: {}",
                        env.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn derive_release_names(&mut self) {
        let app = self.app.clone();
        for env in &mut self.environments {
            if env.release.is_empty() {
                env.release = format!("{}-{}", app, env.name);
            }
        }
    }

    /// Look up an environment by name
    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.name == name)
    }
}
