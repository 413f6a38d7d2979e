use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Append `entry` as a line of `path` unless the file already contains it.
/// Creates the file (mode 0644) if needed. Returns whether anything was
/// written.
pub fn append_if_absent(path: &Path, entry: &[u8]) -> Result<bool> {
    let entry = entry.strip_suffix(b"\n").unwrap_or(entry);
    let existing = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    if contains(&existing, entry) {
        return Ok(false);
    }

    let mut line = Vec::with_capacity(entry.len() + 2);
    if !existing.is_empty() && !existing.ends_with(b"\n") {
        line.push(b'\n');
    }
    line.extend_from_slice(entry);
    line.push(b'\n');

    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("Unable to open {} for appending", path.display()))?;
    file.write_all(&line)
        .with_context(|| format!("Failed to append to {}", path.display()))?;

    Ok(true)
}

/// Write `contents` to `path`, readable only by the owner.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trusted_cas");

        assert!(append_if_absent(&path, b"ssh-ed25519 AAAA ca\n").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"ssh-ed25519 AAAA ca\n");
    }

    #[test]
    fn test_second_append_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");

        assert!(append_if_absent(&path, b"@cert-authority * ssh-ed25519 AAAA ca").unwrap());
        assert!(!append_if_absent(&path, b"@cert-authority * ssh-ed25519 AAAA ca").unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "@cert-authority * ssh-ed25519 AAAA ca\n"
        );
    }

    #[test]
    fn test_appends_after_unterminated_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(&path, "host1 ssh-rsa AAAA").unwrap();

        append_if_absent(&path, b"@cert-authority * ssh-ed25519 BBBB ca").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "host1 ssh-rsa AAAA\n@cert-authority * ssh-ed25519 BBBB ca\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_private_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id_ed25519-cert.pub");
        write_private(&path, b"cert").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read(&path).unwrap(), b"cert");
    }
}
