//! Synchronous execution of external tools with uniform error mapping.

use crate::{Error, Result};
use std::process::{Command, Output};

/// Run `cmd`, reporting it as `tool` in errors.
///
/// A missing binary becomes [`Error::ToolNotFound`]; a non-zero exit becomes
/// [`Error::ToolFailed`] carrying the trimmed stderr.
pub(crate) fn run_tool(tool: &str, cmd: &mut Command) -> Result<Output> {
    #[cfg(feature = "tracing")]
    tracing::debug!("Running {}: {:?}", tool, cmd);

    let output = cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::tool_not_found(tool)
        } else {
            Error::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed(
            tool,
            format!("exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    Ok(output)
}
