//! Optional settings file.
//!
//! Every field has a default matching a stock OpenSSH install, so the file
//! only needs the values that differ.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// sshd configuration edited by `trust` and `sign-host`
    pub sshd_config: PathBuf,
    /// File of CA keys trusted for user authentication
    pub trusted_user_ca_keys: PathBuf,
    /// System-wide known hosts file
    pub known_hosts: PathBuf,
    pub keygen_program: PathBuf,
    pub sshd_program: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sshd_config: PathBuf::from("/etc/ssh/sshd_config"),
            trusted_user_ca_keys: PathBuf::from("/etc/ssh/trusted_cas"),
            known_hosts: PathBuf::from("/etc/ssh/ssh_known_hosts"),
            keygen_program: PathBuf::from("ssh-keygen"),
            sshd_program: PathBuf::from("sshd"),
        }
    }
}

impl Settings {
    /// Load from `explicit`, or from the default location if it exists.
    ///
    /// An explicitly named file must exist; a missing default file means
    /// defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings at {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sshca").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
