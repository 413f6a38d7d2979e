//! Authorized-key parsing backed by the `ssh-key` crate.

use ssh_key::{Fingerprint, HashAlg};

/// Errors that can occur while parsing a public key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    /// The bytes are not a single well-formed authorized-key line.
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
}

impl KeyError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidKeyFormat(reason.into())
    }
}

/// An SSH public key in `authorized_keys` format.
///
/// The raw bytes and the parsed key are produced together by [`PublicKey::parse`]
/// and never change afterwards, so accessors can't observe an unparsed key.
#[derive(Clone)]
pub struct PublicKey {
    raw: Vec<u8>,
    algorithm: String,
    fingerprint: Fingerprint,
    comment: String,
}

impl PublicKey {
    /// Parse a single authorized-key line, e.g. the contents of `id_ed25519.pub`.
    ///
    /// One trailing line terminator is allowed. Anything else that isn't
    /// exactly one `<algorithm> <base64> [comment]` line is rejected.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidKeyFormat` if the bytes are not valid UTF-8,
    /// are empty, span several lines, or don't decode as an SSH public key.
    pub fn parse(bytes: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let raw = bytes.into();
        let parsed = parse_line(&raw)?;

        Ok(Self {
            algorithm: parsed.algorithm().as_str().to_string(),
            fingerprint: parsed.fingerprint(HashAlg::Sha256),
            comment: parsed.comment().to_string(),
            raw,
        })
    }

    /// The exact bytes this key was parsed from.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consume the key, returning the exact bytes it was parsed from.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }

    /// Key algorithm name, e.g. `ssh-ed25519`.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// SHA-256 fingerprint in OpenSSH format (`SHA256:{base64_no_padding}`).
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Trailing comment of the key line (may be empty).
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

fn parse_line(raw: &[u8]) -> Result<ssh_key::PublicKey, KeyError> {
    let text = std::str::from_utf8(raw).map_err(|_| KeyError::invalid("not valid UTF-8"))?;

    let line = match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => text,
    };

    if line.trim().is_empty() {
        return Err(KeyError::invalid("empty key"));
    }
    if line.contains(|c| c == '\n' || c == '\r') {
        return Err(KeyError::invalid("expected a single line"));
    }

    ssh_key::PublicKey::from_openssh(line).map_err(|e| KeyError::invalid(e.to_string()))
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PublicKey {}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // parse() only accepts UTF-8
        f.write_str(&String::from_utf8_lossy(&self.raw))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({} {})", self.algorithm, self.fingerprint)
    }
}
