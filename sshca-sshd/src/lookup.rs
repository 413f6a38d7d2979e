use std::path::Path;
use std::process::Command;

use crate::command::checked_output;
use crate::error::ConfigError;

/// Every value sshd would use for `key` given the config at `config_path`,
/// in the order `sshd -T` prints them. An unset key gives an empty list.
///
/// # Errors
///
/// `Effective` if `sshd -T` can't run or rejects the file.
pub fn lookup(
    sshd_program: &Path,
    config_path: &Path,
    key: &str,
) -> Result<Vec<String>, ConfigError> {
    let output = checked_output(
        Command::new(sshd_program)
            .arg("-T")
            .arg("-f")
            .arg(config_path),
    )
    .map_err(|source| ConfigError::Effective {
        path: config_path.to_path_buf(),
        source,
    })?;

    let values = values_for(&String::from_utf8_lossy(&output.stdout), key);
    tracing::debug!(config = %config_path.display(), key, count = values.len(), "effective config lookup");
    Ok(values)
}

/// Extract `key`'s values from `sshd -T` output. Keys are matched
/// case-insensitively; sshd prints them in lower case.
pub fn values_for(dump: &str, key: &str) -> Vec<String> {
    let key = key.to_lowercase();
    dump.lines()
        .filter_map(|line| line.strip_prefix(key.as_str())?.strip_prefix(' '))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "port 22\nusepam yes\nhostkey /etc/ssh/ssh_host_rsa_key\nhostkey /etc/ssh/ssh_host_ed25519_key\nportforwarding no\n";

    #[test]
    fn test_single_value() {
        assert_eq!(values_for(DUMP, "port"), vec!["22"]);
        assert_eq!(values_for(DUMP, "usepam"), vec!["yes"]);
    }

    #[test]
    fn test_key_case_is_ignored() {
        assert_eq!(values_for(DUMP, "UsePAM"), vec!["yes"]);
    }

    #[test]
    fn test_multiple_values_in_order() {
        assert_eq!(
            values_for(DUMP, "HostKey"),
            vec![
                "/etc/ssh/ssh_host_rsa_key",
                "/etc/ssh/ssh_host_ed25519_key"
            ]
        );
    }

    #[test]
    fn test_absent_key_is_empty() {
        assert!(values_for(DUMP, "TrustedUserCAKeys").is_empty());
    }

    #[test]
    fn test_missing_sshd() {
        let err = lookup(
            Path::new("/nonexistent/sshca-test/sshd"),
            Path::new("sshd_config"),
            "port",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Effective { .. }));
    }
}
