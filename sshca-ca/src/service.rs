//! The CA request handler shared by every transport.

use std::path::PathBuf;
use std::sync::Arc;

use sshca_core::{PublicKey, SignRequest, SignResult};

use crate::backend::{KeygenRunner, SigningBackend, SshKeygen};
use crate::console::{ConsoleLock, Operator, TerminalOperator};
use crate::error::ServiceError;
use crate::identity::CaIdentity;

/// How to build a [`CaService`] from files on disk.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub private_key: PathBuf,
    /// Defaults to `<private_key>.pub`.
    pub public_key: Option<PathBuf>,
    /// Ask the operator before every signature.
    pub confirm: bool,
    pub keygen_program: PathBuf,
}

impl ServiceOptions {
    pub fn new(private_key: impl Into<PathBuf>) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: None,
            confirm: true,
            keygen_program: PathBuf::from("ssh-keygen"),
        }
    }
}

/// Signs public keys with one CA identity.
///
/// Calls may run concurrently; the terminal is serialized internally.
pub struct CaService {
    identity: CaIdentity,
    confirm: bool,
    backend: SigningBackend,
    operator: Arc<dyn Operator>,
    console: ConsoleLock,
}

impl CaService {
    /// Load the CA key and wire up `ssh-keygen` and the terminal operator.
    ///
    /// # Errors
    ///
    /// See [`CaIdentity::load`].
    pub fn open(options: ServiceOptions) -> Result<Self, ServiceError> {
        let identity = CaIdentity::load(&options.private_key, options.public_key.as_deref())?;
        Ok(Self::new(
            identity,
            options.confirm,
            Arc::new(SshKeygen::new(options.keygen_program)),
            Arc::new(TerminalOperator::stdin()),
        ))
    }

    pub fn new(
        identity: CaIdentity,
        confirm: bool,
        runner: Arc<dyn KeygenRunner>,
        operator: Arc<dyn Operator>,
    ) -> Self {
        Self {
            identity,
            confirm,
            backend: SigningBackend::new(runner),
            operator,
            console: ConsoleLock::new(),
        }
    }

    pub fn identity(&self) -> &CaIdentity {
        &self.identity
    }

    pub fn ca_public_key(&self) -> &PublicKey {
        self.identity.public_key()
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirm
    }

    /// Certify `request.public_key`.
    ///
    /// The summary is always shown. With confirmation on, nothing is signed
    /// until the operator enters a line.
    pub async fn sign_public_key(&self, request: &SignRequest) -> Result<SignResult, ServiceError> {
        tracing::info!(
            identity = %request.identity,
            kind = %request.kind,
            fingerprint = %request.public_key.fingerprint(),
            principals = %request.joined_principals(),
            "signing request"
        );

        self.operator.announce(&request.summary()).await;
        if self.confirm && !self.operator.confirm().await {
            tracing::warn!(identity = %request.identity, "signing request not confirmed");
            return Err(ServiceError::ConfirmationAborted);
        }

        let result = self
            .backend
            .sign(request, &self.identity, &self.console)
            .await
            .map_err(|e| {
                tracing::error!(identity = %request.identity, error = %e, "signing failed");
                ServiceError::SigningFailed(e)
            })?;

        tracing::info!(identity = %request.identity, "certificate issued");
        Ok(result)
    }
}

impl std::fmt::Debug for CaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaService")
            .field("identity", &self.identity)
            .field("confirm", &self.confirm)
            .finish_non_exhaustive()
    }
}
