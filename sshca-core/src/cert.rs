//! Certificate signing requests and results.

use serde::{Deserialize, Serialize};

use crate::identity::PublicKey;

/// The two kinds of SSH certificate a CA can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateKind {
    /// Certifies a host key; `ssh-keygen` gets `-h`.
    Host,
    /// Certifies a user key; no extra flag.
    User,
}

impl CertificateKind {
    /// Extra `ssh-keygen` arguments selecting this kind.
    #[must_use]
    pub fn keygen_args(self) -> &'static [&'static str] {
        match self {
            Self::Host => &["-h"],
            Self::User => &[],
        }
    }
}

impl std::fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A request to certify one public key.
///
/// Principals keep the caller's order; duplicates are the caller's problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    /// Certificate key ID (`ssh-keygen -I`).
    pub identity: String,
    /// Host or user certificate.
    pub kind: CertificateKind,
    /// Names the certificate is valid for (`ssh-keygen -n`).
    pub principals: Vec<String>,
    /// The key being certified.
    pub public_key: PublicKey,
}

impl SignRequest {
    /// Build a request.
    pub fn new(
        identity: impl Into<String>,
        kind: CertificateKind,
        principals: Vec<String>,
        public_key: PublicKey,
    ) -> Self {
        Self {
            identity: identity.into(),
            kind,
            principals,
            public_key,
        }
    }

    /// Principals joined with commas, as `ssh-keygen -n` expects.
    #[must_use]
    pub fn joined_principals(&self) -> String {
        self.principals.join(",")
    }

    /// One-line description shown to the operator before signing.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "make {} certificate for {} key (fingerprint {}) for {}",
            self.kind,
            self.public_key.algorithm(),
            self.public_key.fingerprint(),
            self.joined_principals(),
        )
    }
}

/// A signed certificate, exactly as written by `ssh-keygen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignResult {
    pub certificate: Vec<u8>,
}
