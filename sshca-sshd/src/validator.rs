use std::path::{Path, PathBuf};
use std::process::Command;

use crate::command::checked_output;
use crate::error::ValidationError;

/// Messages `sshd -t` prints for a key or certificate reference it can't use,
/// while still exiting successfully.
pub const BROKEN_KEY_DIAGNOSTICS: [&str; 2] = [
    "No matching private key for certificate",
    "Could not load host certificate",
];

/// Checks a configuration file after it has been written.
pub trait Validator: Send + Sync {
    fn validate(&self, path: &Path) -> Result<(), ValidationError>;
}

/// Validates with `sshd -t -f <path>`.
#[derive(Debug, Clone)]
pub struct SshdValidator {
    program: PathBuf,
}

impl SshdValidator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SshdValidator {
    fn default() -> Self {
        Self::new("sshd")
    }
}

impl Validator for SshdValidator {
    fn validate(&self, path: &Path) -> Result<(), ValidationError> {
        let output = checked_output(Command::new(&self.program).arg("-t").arg("-f").arg(path))?;
        check_diagnostics(&String::from_utf8_lossy(&output.stderr))
    }
}

/// Fail if `stderr` contains one of [`BROKEN_KEY_DIAGNOSTICS`]. The error
/// carries the offending line.
pub fn check_diagnostics(stderr: &str) -> Result<(), ValidationError> {
    for line in stderr.lines() {
        if BROKEN_KEY_DIAGNOSTICS.iter().any(|d| line.contains(d)) {
            return Err(ValidationError::Diagnostic(line.trim().to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_output_passes() {
        assert!(check_diagnostics("").is_ok());
        assert!(check_diagnostics("debug1: some harmless note\n").is_ok());
    }

    #[test]
    fn test_known_diagnostics_fail() {
        let err = check_diagnostics(
            "debug1: x\nCould not load host certificate \"/etc/ssh/ssh_host_ed25519_key-cert.pub\": No such file\n",
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::Diagnostic(line) if line.starts_with("Could not load host certificate")));

        assert!(check_diagnostics("No matching private key for certificate: /tmp/k-cert.pub").is_err());
    }

    #[test]
    fn test_missing_sshd_fails() {
        let validator = SshdValidator::new("/nonexistent/sshca-test/sshd");
        assert!(matches!(
            validator.validate(Path::new("sshd_config")),
            Err(ValidationError::Command(_))
        ));
    }
}
