//! Transactional edits of a line-oriented config file.

use std::fs;
use std::path::{Path, PathBuf};

use regex::bytes::{NoExpand, Regex};

use crate::error::{ConfigError, ValidationError};
use crate::validator::{SshdValidator, Validator};

/// One `key value` edit. Config files are handled as raw bytes, so lines
/// that aren't valid UTF-8 pass through untouched.
#[derive(Debug, Clone)]
pub struct Modification {
    key: String,
    value: String,
    pattern: Regex,
}

impl Modification {
    /// Ensure a `key value` line exists. Only a line (live or commented out)
    /// already starting with exactly `key value` is replaced; other lines for
    /// the same key are left alone.
    pub fn set(key: &str, value: &str) -> Result<Self, ConfigError> {
        let pattern = format!(
            r"(?m)^#?{} {}(?-u:.)*$",
            regex::escape(key),
            regex::escape(value)
        );
        Self::new(key, value, &pattern)
    }

    /// Make `key value` the line for `key`, replacing every line (live or
    /// commented out) for that key, in either `key value` or `key=value` form.
    pub fn set_unique(key: &str, value: &str) -> Result<Self, ConfigError> {
        let pattern = format!(r"(?m)^#?{}(?:[ \t=](?-u:.)*)?$", regex::escape(key));
        Self::new(key, value, &pattern)
    }

    fn new(key: &str, value: &str, pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
            key: key.to_string(),
            source,
        })?;
        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            pattern,
        })
    }

    /// The line this edit writes.
    pub fn line(&self) -> String {
        format!("{} {}", self.key, self.value)
    }

    /// Apply to `content`: replace matching lines, or append one line after
    /// trimming trailing newlines.
    pub fn apply(&self, content: &[u8]) -> Vec<u8> {
        let line = self.line();
        if self.pattern.is_match(content) {
            return self
                .pattern
                .replace_all(content, NoExpand(line.as_bytes()))
                .into_owned();
        }

        let end = content
            .iter()
            .rposition(|&b| b != b'\n')
            .map_or(0, |last| last + 1);
        let mut updated = Vec::with_capacity(end + line.len() + 2);
        if end > 0 {
            updated.extend_from_slice(&content[..end]);
            updated.push(b'\n');
        }
        updated.extend_from_slice(line.as_bytes());
        updated.push(b'\n');
        updated
    }
}

/// Result of a successful [`ConfigModifier::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The edits changed nothing; the file was neither written nor validated.
    Unchanged,
    /// The file was rewritten and passed validation.
    Applied,
}

/// Queues edits for one file and commits them all or none.
///
/// A commit moves through pending → validating → committed, or → rolled back
/// if validation fails. After a successful commit the queue is empty and the
/// modifier can be reused.
pub struct ConfigModifier {
    path: PathBuf,
    pending: Vec<Modification>,
    validator: Box<dyn Validator>,
}

impl ConfigModifier {
    pub fn new(path: impl Into<PathBuf>, validator: impl Validator + 'static) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
            validator: Box::new(validator),
        }
    }

    /// Modifier validating with `sshd_program -t -f <path>`.
    pub fn with_sshd(path: impl Into<PathBuf>, sshd_program: impl Into<PathBuf>) -> Self {
        Self::new(path, SshdValidator::new(sshd_program))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending(&self) -> &[Modification] {
        &self.pending
    }

    /// Queue [`Modification::set`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<&mut Self, ConfigError> {
        self.pending.push(Modification::set(key, value)?);
        Ok(self)
    }

    /// Queue [`Modification::set_unique`].
    pub fn set_unique(&mut self, key: &str, value: &str) -> Result<&mut Self, ConfigError> {
        self.pending.push(Modification::set_unique(key, value)?);
        Ok(self)
    }

    /// Apply queued edits in order, write, validate, and roll back on failure.
    ///
    /// # Errors
    ///
    /// `Read`/`Write` if the file can't be accessed (nothing was changed),
    /// `Validation` if the result was rejected and the original restored,
    /// `RollbackFailed` if the original could not be restored either.
    pub fn commit(&mut self) -> Result<CommitOutcome, ConfigError> {
        let original = fs::read(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let updated = self
            .pending
            .iter()
            .fold(original.clone(), |content, m| m.apply(&content));

        if updated == original {
            tracing::debug!(path = %self.path.display(), "config already up to date");
            self.pending.clear();
            return Ok(CommitOutcome::Unchanged);
        }

        fs::write(&self.path, &updated).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        match self.validator.validate(&self.path) {
            Ok(()) => {
                tracing::info!(
                    path = %self.path.display(),
                    edits = self.pending.len(),
                    "config updated"
                );
                self.pending.clear();
                Ok(CommitOutcome::Applied)
            }
            Err(validation) => Err(self.roll_back(&original, validation)),
        }
    }

    fn roll_back(&self, original: &[u8], validation: ValidationError) -> ConfigError {
        tracing::warn!(path = %self.path.display(), error = %validation, "validation failed, restoring config");
        match fs::write(&self.path, original) {
            Ok(()) => ConfigError::Validation {
                path: self.path.clone(),
                source: validation,
            },
            Err(restore) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %restore,
                    "failed to restore config; manual fix required"
                );
                ConfigError::RollbackFailed {
                    path: self.path.clone(),
                    validation,
                    restore,
                }
            }
        }
    }
}

impl std::fmt::Debug for ConfigModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigModifier")
            .field("path", &self.path)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
