//! Names that end up inside certificates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Identity owner used in host certificate identities.
pub const HOST_OWNER: &str = "host";

/// Short key identifier derived from a public key's file name.
///
/// `ssh_host_<type>_key.pub` and `id_<type>.pub` give `<type>`; anything else
/// gives the file name without `.pub`.
pub fn key_id_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let standard = name
        .strip_prefix("ssh_host_")
        .and_then(|rest| rest.strip_suffix("_key.pub"))
        .or_else(|| name.strip_prefix("id_").and_then(|rest| rest.strip_suffix(".pub")));
    if let Some(kind) = standard.filter(|k| !k.is_empty() && !k.contains('_')) {
        return kind.to_string();
    }

    name.strip_suffix(".pub").unwrap_or(&name).to_string()
}

/// `<hostname>_<owner>_<key id>`, where owner is the user name or
/// [`HOST_OWNER`].
pub fn certificate_identity(hostname: &str, owner: &str, key_path: &Path) -> String {
    format!("{hostname}_{owner}_{}", key_id_from_path(key_path))
}

/// Where `ssh` looks for the certificate of `key_path`: `.pub` replaced by
/// `-cert.pub`.
pub fn certificate_path(key_path: &Path) -> PathBuf {
    let name = key_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".pub").unwrap_or(&name);
    key_path.with_file_name(format!("{stem}-cert.pub"))
}

/// Host certificate principals: the hostname, its first label, then `extra`,
/// without duplicates and in that order.
pub fn host_principals(hostname: &str, extra: &[String]) -> Vec<String> {
    let short = hostname.split('.').next().unwrap_or(hostname);
    let mut principals: Vec<String> = Vec::with_capacity(2 + extra.len());
    for candidate in [hostname, short].into_iter().chain(extra.iter().map(String::as_str)) {
        if !candidate.is_empty() && !principals.iter().any(|p| p == candidate) {
            principals.push(candidate.to_string());
        }
    }
    principals
}

/// Source of the local machine's names.
pub trait SystemNames {
    fn hostname(&self) -> Result<String>;
    fn username(&self) -> Result<String>;
}

/// Names of the machine and user running this process.
pub struct LocalSystem;

impl SystemNames for LocalSystem {
    fn hostname(&self) -> Result<String> {
        let name = hostname::get().context("Failed to get system hostname")?;
        name.into_string()
            .map_err(|raw| anyhow::anyhow!("hostname {raw:?} is not valid UTF-8"))
    }

    #[cfg(unix)]
    fn username(&self) -> Result<String> {
        use nix::unistd::{Uid, User};

        let uid = Uid::current();
        match User::from_uid(uid).context("Failed to look up current user")? {
            Some(user) => Ok(user.name),
            // No passwd entry, as in some containers.
            None => std::env::var("USER")
                .with_context(|| format!("No user entry for uid {uid} and USER is unset")),
        }
    }

    #[cfg(not(unix))]
    fn username(&self) -> Result<String> {
        std::env::var("USERNAME").context("Failed to get name of current user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_for_standard_names() {
        assert_eq!(key_id_from_path(Path::new("/etc/ssh/ssh_host_ed25519_key.pub")), "ed25519");
        assert_eq!(key_id_from_path(Path::new("/etc/ssh/ssh_host_rsa_key.pub")), "rsa");
        assert_eq!(key_id_from_path(Path::new("/home/a/.ssh/id_ecdsa.pub")), "ecdsa");
    }

    #[test]
    fn test_key_id_falls_back_to_file_name() {
        assert_eq!(key_id_from_path(Path::new("work_laptop.pub")), "work_laptop");
        assert_eq!(key_id_from_path(Path::new("id_ed25519_sk_extra.pub")), "id_ed25519_sk_extra");
        assert_eq!(key_id_from_path(Path::new("ssh_host_key.pub")), "ssh_host_key");
        assert_eq!(key_id_from_path(Path::new("plainkey")), "plainkey");
    }

    #[test]
    fn test_certificate_identity() {
        assert_eq!(
            certificate_identity("web1.example.com", HOST_OWNER, Path::new("/etc/ssh/ssh_host_ed25519_key.pub")),
            "web1.example.com_host_ed25519"
        );
        assert_eq!(
            certificate_identity("laptop", "alice", Path::new("id_rsa.pub")),
            "laptop_alice_rsa"
        );
    }

    #[test]
    fn test_certificate_path() {
        assert_eq!(
            certificate_path(Path::new("/etc/ssh/ssh_host_ed25519_key.pub")),
            PathBuf::from("/etc/ssh/ssh_host_ed25519_key-cert.pub")
        );
        assert_eq!(certificate_path(Path::new("key")), PathBuf::from("key-cert.pub"));
    }

    #[test]
    fn test_host_principals_dedupe_in_order() {
        assert_eq!(
            host_principals("web1.example.com", &["web".into(), "web1".into(), "web".into()]),
            vec!["web1.example.com", "web1", "web"]
        );
        assert_eq!(host_principals("web1", &[]), vec!["web1"]);
    }

    #[test]
    fn test_local_hostname() {
        assert!(!LocalSystem.hostname().unwrap().is_empty());
    }
}
