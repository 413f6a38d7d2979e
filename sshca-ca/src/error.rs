//! Error types for the CA service, its signing backend and transports.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use sshca_core::KeyError;
use sshca_proto::{CodecError, ErrorCode, RpcError};

/// Message sent to peers when signing fails. The real cause stays in the
/// server log because the terminal may be shared with another session.
pub const SIGNING_FAILED_MESSAGE: &str = "failed to sign key (see server for details)";

/// Failures inside the signing backend. Logged in full on the server only.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SigningError {
    /// Could not create the temporary directory or write the key into it.
    #[error("failed to stage public key: {0}")]
    Stage(#[source] io::Error),

    /// The signing tool could not be started at all.
    #[error("failed to launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The signing tool ran and reported failure.
    #[error("{} exited with {status}", program.display())]
    Exit { program: PathBuf, status: ExitStatus },

    /// The tool succeeded but left no readable certificate.
    #[error("failed to read certificate: {0}")]
    ReadCertificate(#[source] io::Error),
}

/// Errors from constructing or calling a [`crate::CaService`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// The CA private key is absent or not a regular file, or its public
    /// half can't be read.
    #[error("missing CA key at {}: {reason}", path.display())]
    MissingKey { path: PathBuf, reason: String },

    /// A key (the CA's or the request's) doesn't parse.
    #[error(transparent)]
    InvalidKeyFormat(#[from] KeyError),

    /// `ssh-keygen` could not produce a certificate.
    #[error("signing failed: {0}")]
    SigningFailed(#[source] SigningError),

    /// The operator closed input instead of confirming.
    #[error("signing request was not confirmed by the CA operator")]
    ConfirmationAborted,
}

impl ServiceError {
    /// Convert into what the remote caller is allowed to see.
    #[must_use]
    pub fn to_rpc(&self) -> RpcError {
        match self {
            Self::InvalidKeyFormat(e) => RpcError::new(ErrorCode::InvalidKeyFormat, e.to_string()),
            Self::SigningFailed(_) => RpcError::new(ErrorCode::SigningFailed, SIGNING_FAILED_MESSAGE),
            Self::ConfirmationAborted => {
                RpcError::new(ErrorCode::ConfirmationAborted, self.to_string())
            }
            Self::MissingKey { .. } => RpcError::new(ErrorCode::Internal, "CA key unavailable"),
        }
    }
}

/// Errors choosing or opening a transport.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Invalid combination of local/remote options. Nothing was attempted.
    #[error("invalid CA transport options: {0}")]
    Configuration(&'static str),

    /// The remote CA could not be reached.
    #[error("failed to connect to CA at {addr}: {source}")]
    DialFailed {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The in-process CA could not be built.
    #[error("failed to start local CA: {0}")]
    LocalService(#[source] ServiceError),
}

/// Errors returned to callers of [`crate::Client`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The connection ended before a reply arrived.
    #[error("connection to CA closed")]
    ConnectionClosed,

    /// The request could not be written.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The CA could not parse the submitted key.
    #[error("CA rejected the public key: {0}")]
    InvalidKeyFormat(String),

    /// The CA failed to sign. The message is deliberately generic.
    #[error("{0}")]
    SigningFailed(String),

    /// The CA operator did not confirm the request.
    #[error("{0}")]
    ConfirmationAborted(String),

    /// Any other error reported by the CA.
    #[error("CA returned an error: {0}")]
    Remote(RpcError),

    /// The CA answered with a reply for a different method.
    #[error("unexpected reply to {method}")]
    UnexpectedReply { method: &'static str },
}

impl From<RpcError> for ClientError {
    fn from(error: RpcError) -> Self {
        match error.code {
            ErrorCode::InvalidKeyFormat => Self::InvalidKeyFormat(error.message),
            ErrorCode::SigningFailed => Self::SigningFailed(error.message),
            ErrorCode::ConfirmationAborted => Self::ConfirmationAborted(error.message),
            ErrorCode::BadRequest | ErrorCode::Internal => Self::Remote(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_detail_stays_local() {
        let err = ServiceError::SigningFailed(SigningError::Launch {
            program: PathBuf::from("/secret/path/ssh-keygen"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        });

        assert!(err.to_string().contains("/secret/path/ssh-keygen"));

        let rpc = err.to_rpc();
        assert_eq!(rpc.code, ErrorCode::SigningFailed);
        assert_eq!(rpc.message, SIGNING_FAILED_MESSAGE);
    }

    #[test]
    fn test_rpc_codes_map_back_to_client_errors() {
        let aborted = ClientError::from(ServiceError::ConfirmationAborted.to_rpc());
        assert!(matches!(aborted, ClientError::ConfirmationAborted(_)));

        let invalid = ClientError::from(
            ServiceError::InvalidKeyFormat(KeyError::InvalidKeyFormat("bad".into())).to_rpc(),
        );
        assert!(matches!(invalid, ClientError::InvalidKeyFormat(m) if m.contains("bad")));

        let other = ClientError::from(RpcError::new(ErrorCode::BadRequest, "?"));
        assert!(matches!(other, ClientError::Remote(_)));
    }
}
