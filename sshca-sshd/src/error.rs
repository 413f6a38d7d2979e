//! sshd configuration errors.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// An external command could not be run or reported failure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CommandError {
    /// The program could not be started.
    #[error("failed to run {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("{} exited with {status}: {stderr}", program.display())]
    Exit {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

/// Why the edited configuration was rejected.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The validator itself failed or rejected the file.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The validator passed but printed a diagnostic known to mean a broken
    /// key or certificate reference.
    #[error("sshd reported: {0}")]
    Diagnostic(String),
}

/// Errors from committing edits or reading the effective configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Validation failed; the original contents were restored.
    #[error("edited {} failed validation and was restored: {source}", path.display())]
    Validation {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    /// Validation failed and the original could not be written back. The
    /// file is left in its edited, invalid state.
    #[error(
        "edited {} failed validation ({validation}) and restoring it failed ({restore}); the file must be fixed manually",
        path.display()
    )]
    RollbackFailed {
        path: PathBuf,
        validation: ValidationError,
        restore: io::Error,
    },

    /// `sshd -T` could not produce the effective configuration.
    #[error("failed to read effective configuration of {}: {source}", path.display())]
    Effective {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    /// A key or value could not be turned into a line pattern.
    #[error("invalid edit for {key}: {source}")]
    Pattern {
        key: String,
        #[source]
        source: regex::Error,
    },
}

impl ConfigError {
    /// True for the one state that needs a human to repair the file.
    #[must_use]
    pub fn needs_manual_fix(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}
