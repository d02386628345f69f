//! Startup check that the collaborator binaries exist
//!
//! All missing tools are reported at once rather than one per run.

use thiserror::Error;
use tracing::debug;

/// Binaries every command needs on PATH
pub const REQUIRED_TOOLS: [&str; 3] = ["kind", "kubectl", "helm"];

#[derive(Debug, Error)]
pub enum PrereqError {
    #[error("missing required tools: {}", .0.join(", "))]
    Missing(Vec<String>),
}

/// Verify every required collaborator binary resolves on PATH
pub fn check_prerequisites() -> Result<(), PrereqError> {
    let mut missing = Vec::new();

    for tool in REQUIRED_TOOLS {
        match which::which(tool) {
            Ok(path) => debug!(tool = %tool, path = %path.display(), "Found collaborator"),
            Err(_) => missing.push(tool.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PrereqError::Missing(missing))
    }
}
