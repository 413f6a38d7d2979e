//! Integration tests for the sshca binary.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const CA_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIHwXYROIrAfv9RS4LyCPdsPGy6EqM+vncrrZXzVJbNuV ca@example\n";

/// A scratch /etc/ssh with a settings file pointing into it. `true` stands
/// in for sshd so every config passes validation.
struct Sandbox {
    dir: tempfile::TempDir,
    settings: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("sshd_config"), "Port 22\n#TrustedUserCAKeys none\n").unwrap();

        let settings = root.join("config.toml");
        fs::write(
            &settings,
            format!(
                "sshd_config = {:?}\ntrusted_user_ca_keys = {:?}\nknown_hosts = {:?}\nsshd_program = \"true\"\n",
                root.join("sshd_config"),
                root.join("trusted_cas"),
                root.join("ssh_known_hosts"),
            ),
        )
        .unwrap();

        Self { dir, settings }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn sshca(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_sshca"))
            .args(args)
            .arg("--config")
            .arg(&self.settings)
            .env("RUST_LOG", "warn")
            .output()
            .unwrap()
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_transport_flags_are_validated() {
    let sandbox = Sandbox::new();

    let output = sandbox.sshca(&["trust"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("one of --local or --remote is required"));

    let output = sandbox.sshca(&["trust", "--local", "--remote", "127.0.0.1:1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("mutually exclusive"));

    let output = sandbox.sshca(&["trust", "--local"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--local requires --ca-private"));
}

#[test]
fn test_unreachable_remote() {
    let sandbox = Sandbox::new();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let output = sandbox.sshca(&["trust", "--remote", &addr]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to connect to CA"));
}

#[test]
fn test_trust_local_ca() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("ca"), "not read by trust").unwrap();
    fs::write(sandbox.path("ca.pub"), CA_KEY).unwrap();
    let ca = sandbox.path("ca");

    for _ in 0..2 {
        let output = sandbox.sshca(&["trust", "--local", "--ca-private", ca.to_str().unwrap()]);
        assert!(output.status.success(), "{}", stderr(&output));
    }

    assert_eq!(
        fs::read_to_string(sandbox.path("ssh_known_hosts")).unwrap(),
        format!("@cert-authority * {CA_KEY}")
    );
    assert_eq!(fs::read_to_string(sandbox.path("trusted_cas")).unwrap(), CA_KEY);
    assert_eq!(
        fs::read_to_string(sandbox.path("sshd_config")).unwrap(),
        format!(
            "Port 22\nTrustedUserCAKeys {}\n",
            sandbox.path("trusted_cas").display()
        )
    );
}

fn ssh_keygen(dir: &Path, name: &str) -> Option<PathBuf> {
    let path = dir.join(name);
    let status = Command::new("ssh-keygen")
        .args(["-q", "-t", "ed25519", "-N", "", "-C", name, "-f"])
        .arg(&path)
        .status();
    match status {
        Ok(status) if status.success() => Some(path),
        Ok(status) => panic!("ssh-keygen failed: {status}"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => panic!("failed to run ssh-keygen: {e}"),
    }
}

#[test]
fn test_sign_user_local() {
    let sandbox = Sandbox::new();
    let Some(ca) = ssh_keygen(sandbox.dir.path(), "ca") else {
        eprintln!("ssh-keygen not installed, skipping");
        return;
    };
    ssh_keygen(sandbox.dir.path(), "id_ed25519").unwrap();
    let public_key = sandbox.path("id_ed25519.pub");

    let output = sandbox.sshca(&[
        "sign-user",
        "--local",
        "--ca-private",
        ca.to_str().unwrap(),
        "-n",
        "alice",
        public_key.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let cert_path = sandbox.path("id_ed25519-cert.pub");
    let cert = fs::read_to_string(&cert_path).unwrap();
    assert!(cert.starts_with("ssh-ed25519-cert-v01@openssh.com "));
    assert_eq!(
        fs::metadata(&cert_path).unwrap().permissions().mode() & 0o777,
        0o600
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("make user certificate for ssh-ed25519 key"));
    assert!(stdout.contains("writing certificate to"));
}
