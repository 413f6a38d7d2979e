use std::path::PathBuf;
use std::process::{Command, Output};

use crate::error::CommandError;

/// Run `command` to completion, capturing output.
///
/// A non-zero exit is an error carrying the program's stderr.
pub fn checked_output(command: &mut Command) -> Result<Output, CommandError> {
    let program = PathBuf::from(command.get_program());
    tracing::debug!(command = ?command, "running");

    let output = command.output().map_err(|source| CommandError::Launch {
        program: program.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(CommandError::Exit {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}
