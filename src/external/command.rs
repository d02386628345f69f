//! Single choke point for spawning collaborator processes

use super::ProbeError;
use std::ffi::OsStr;
use std::process::Output;
use tokio::process::Command;

/// Run a collaborator command and capture stdout for parsing
///
/// A non-zero exit is a `CommandFailed`; stdout that is not UTF-8 is
/// `Malformed`.
pub async fn capture<I, S>(tool: &'static str, args: I) -> Result<String, ProbeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = raw_output(tool, args).await?;

    if !output.status.success() {
        return Err(command_failed(tool, &output));
    }

    String::from_utf8(output.stdout).map_err(|e| ProbeError::Malformed {
        tool,
        detail: e.to_string(),
    })
}

/// Run a collaborator command and hand back the raw output
///
/// Only a failed spawn is an error here; callers that need to tell a
/// not-found answer apart from a real failure inspect the output
/// themselves.
pub async fn raw_output<I, S>(tool: &'static str, args: I) -> Result<Output, ProbeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(tool)
        .args(args)
        .output()
        .await
        .map_err(|source| ProbeError::Spawn { tool, source })
}

/// Run a collaborator command for its side effect, streaming its output
/// through to the terminal
pub async fn run<I, S>(tool: &'static str, args: I) -> Result<(), ProbeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let status = Command::new(tool)
        .args(args)
        .status()
        .await
        .map_err(|source| ProbeError::Spawn { tool, source })?;

    if !status.success() {
        return Err(ProbeError::CommandFailed {
            tool,
            status: status.to_string(),
            // stderr went straight to the terminal
            stderr: String::new(),
        });
    }

    Ok(())
}

/// Convert a captured non-zero exit into a `CommandFailed`
pub fn command_failed(tool: &'static str, output: &Output) -> ProbeError {
    ProbeError::CommandFailed {
        tool,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
