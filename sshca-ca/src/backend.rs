//! Certificate signing via `ssh-keygen`.
//!
//! Each request gets a private temporary directory. The submitted public key
//! is written there as `key.pub`; `ssh-keygen -s` writes `key-cert.pub` next
//! to it. The directory and everything in it is removed when the request
//! finishes, whatever the outcome.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use sshca_core::{SignRequest, SignResult};

use crate::console::ConsoleLock;
use crate::error::SigningError;
use crate::identity::CaIdentity;

/// Name of the staged public key inside the request directory.
pub const STAGED_KEY_NAME: &str = "key.pub";

/// Name `ssh-keygen` gives the certificate for [`STAGED_KEY_NAME`].
pub const CERTIFICATE_NAME: &str = "key-cert.pub";

/// Runs the signing tool.
#[async_trait]
pub trait KeygenRunner: Send + Sync {
    /// Run with `args`, attached to the service's terminal.
    async fn run(&self, args: &[OsString]) -> Result<(), SigningError>;
}

/// The real `ssh-keygen`.
#[derive(Debug, Clone)]
pub struct SshKeygen {
    program: PathBuf,
}

impl SshKeygen {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SshKeygen {
    fn default() -> Self {
        Self::new("ssh-keygen")
    }
}

#[async_trait]
impl KeygenRunner for SshKeygen {
    async fn run(&self, args: &[OsString]) -> Result<(), SigningError> {
        tracing::debug!(program = %self.program.display(), ?args, "running signing tool");

        let status = tokio::process::Command::new(&self.program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| SigningError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SigningError::Exit {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Arguments for certifying `key_path` with the CA key at `ca_private_key`.
///
/// `-I <identity> -n <p1,p2,...> [-h] -s <ca key> <staged key>`
pub fn keygen_args(request: &SignRequest, ca_private_key: &Path, key_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-I".into(),
        request.identity.clone().into(),
        "-n".into(),
        request.joined_principals().into(),
    ];
    args.extend(request.kind.keygen_args().iter().map(OsString::from));
    args.push("-s".into());
    args.push(ca_private_key.into());
    args.push(key_path.into());
    args
}

/// Produces certificates by staging keys and invoking a [`KeygenRunner`].
#[derive(Clone)]
pub struct SigningBackend {
    runner: Arc<dyn KeygenRunner>,
}

impl SigningBackend {
    pub fn new(runner: Arc<dyn KeygenRunner>) -> Self {
        Self { runner }
    }

    /// Certify the request's public key with the CA.
    ///
    /// The console lock is held only while the runner executes.
    pub async fn sign(
        &self,
        request: &SignRequest,
        ca: &CaIdentity,
        console: &ConsoleLock,
    ) -> Result<SignResult, SigningError> {
        let staging = tempfile::Builder::new()
            .prefix("sshca.")
            .tempdir()
            .map_err(SigningError::Stage)?;
        let key_path = staging.path().join(STAGED_KEY_NAME);
        tokio::fs::write(&key_path, request.public_key.as_bytes())
            .await
            .map_err(SigningError::Stage)?;

        let args = keygen_args(request, ca.private_key_path(), &key_path);
        {
            let _console = console.acquire().await;
            self.runner.run(&args).await?;
        }

        let certificate = tokio::fs::read(staging.path().join(CERTIFICATE_NAME))
            .await
            .map_err(SigningError::ReadCertificate)?;

        Ok(SignResult { certificate })
    }
}

impl std::fmt::Debug for SigningBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningBackend").finish_non_exhaustive()
    }
}
