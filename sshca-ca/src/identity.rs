//! The CA key pair as the service sees it.
//!
//! The private key never leaves disk: only its path is kept, and `ssh-keygen`
//! reads it (prompting for a passphrase if needed). The public half is parsed
//! once at startup and served to clients.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use sshca_core::PublicKey;

use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct CaIdentity {
    private_key_path: PathBuf,
    public_key: PublicKey,
}

impl CaIdentity {
    pub fn new(private_key_path: impl Into<PathBuf>, public_key: PublicKey) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            public_key,
        }
    }

    /// Load the CA identity from disk.
    ///
    /// The private key must exist and must not be a directory. The public key
    /// defaults to the private key path with `.pub` appended.
    ///
    /// # Errors
    ///
    /// `MissingKey` if either file is unusable, `InvalidKeyFormat` if the
    /// public key doesn't parse.
    pub fn load(private_key: &Path, public_key: Option<&Path>) -> Result<Self, ServiceError> {
        let metadata = std::fs::metadata(private_key).map_err(|e| ServiceError::MissingKey {
            path: private_key.to_path_buf(),
            reason: e.to_string(),
        })?;
        if metadata.is_dir() {
            return Err(ServiceError::MissingKey {
                path: private_key.to_path_buf(),
                reason: "is a directory".to_string(),
            });
        }

        let public_path = public_key
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_public_key_path(private_key));
        let bytes = std::fs::read(&public_path).map_err(|e| ServiceError::MissingKey {
            path: public_path.clone(),
            reason: e.to_string(),
        })?;
        let public_key = PublicKey::parse(bytes)?;

        tracing::debug!(
            private_key = %private_key.display(),
            fingerprint = %public_key.fingerprint(),
            "loaded CA identity"
        );

        Ok(Self::new(private_key, public_key))
    }

    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// `<private>.pub`
pub fn default_public_key_path(private_key: &Path) -> PathBuf {
    let mut path = OsString::from(private_key.as_os_str());
    path.push(".pub");
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CA_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIHwXYROIrAfv9RS4LyCPdsPGy6EqM+vncrrZXzVJbNuV ca@example\n";

    #[test]
    fn test_default_public_key_path() {
        assert_eq!(
            default_public_key_path(Path::new("/etc/ssh/ca")),
            PathBuf::from("/etc/ssh/ca.pub")
        );
        assert_eq!(
            default_public_key_path(Path::new("ca_key")),
            PathBuf::from("ca_key.pub")
        );
    }

    #[test]
    fn test_load_uses_sibling_public_key() {
        let dir = tempfile::tempdir().unwrap();
        let private = dir.path().join("ca");
        std::fs::write(&private, "private").unwrap();
        std::fs::write(dir.path().join("ca.pub"), CA_KEY).unwrap();

        let identity = CaIdentity::load(&private, None).unwrap();
        assert_eq!(identity.private_key_path(), private);
        assert_eq!(identity.public_key().as_bytes(), CA_KEY.as_bytes());
    }

    #[test]
    fn test_load_explicit_public_key() {
        let dir = tempfile::tempdir().unwrap();
        let private = dir.path().join("ca");
        let public = dir.path().join("elsewhere.pub");
        std::fs::write(&private, "private").unwrap();
        std::fs::write(&public, CA_KEY).unwrap();

        let identity = CaIdentity::load(&private, Some(&public)).unwrap();
        assert_eq!(identity.public_key().comment(), "ca@example");
    }

    #[test]
    fn test_missing_private_key() {
        let dir = tempfile::tempdir().unwrap();
        let err = CaIdentity::load(&dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, ServiceError::MissingKey { .. }));
    }

    #[test]
    fn test_private_key_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = CaIdentity::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, ServiceError::MissingKey { reason, .. } if reason == "is a directory"));
    }

    #[test]
    fn test_unparseable_public_key() {
        let dir = tempfile::tempdir().unwrap();
        let private = dir.path().join("ca");
        std::fs::write(&private, "private").unwrap();
        std::fs::write(dir.path().join("ca.pub"), "not a key\n").unwrap();

        let err = CaIdentity::load(&private, None).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidKeyFormat(_)));
    }
}
