//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sshca_ca::TransportOptions;

/// CLI tool for easily using SSH certificate authorities.
#[derive(Parser, Debug)]
#[command(name = "sshca", version, about)]
pub struct Cli {
    /// Settings file (default: config.toml in the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run as the SSH CA server
    Server(ServerArgs),

    /// Trust the CA for user and host authentication
    Trust(RpcFlags),

    /// Generate a user certificate for a public key
    SignUser(SignUserArgs),

    /// Generate and configure certificates for all the host keys
    SignHost(SignHostArgs),
}

/// How to reach the CA. Shared by every client command.
#[derive(Args, Debug, Clone, Default)]
pub struct RpcFlags {
    /// Run SSH CA operations in this process (exclusive with --remote)
    #[arg(short, long)]
    pub local: bool,

    /// SSH CA private key path (required with --local)
    #[arg(short = 's', long = "ca-private", value_name = "PRIVATE_KEY_PATH")]
    pub ca_private: Option<PathBuf>,

    /// SSH CA public key path (--local only; defaults to <PRIVATE_KEY_PATH>.pub)
    #[arg(short = 'p', long = "ca-public", value_name = "PUBLIC_KEY_PATH")]
    pub ca_public: Option<PathBuf>,

    /// Remote SSH CA server (exclusive with --local)
    #[arg(short, long, value_name = "HOST:PORT")]
    pub remote: Option<String>,
}

impl RpcFlags {
    pub fn transport_options(&self, keygen_program: PathBuf) -> TransportOptions {
        TransportOptions {
            local: self.local,
            ca_private_key: self.ca_private.clone(),
            ca_public_key: self.ca_public.clone(),
            remote: self.remote.clone(),
            keygen_program,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// TCP address to listen on
    pub addr: String,

    /// SSH CA private key path
    #[arg(short = 's', long = "private", value_name = "PRIVATE_KEY_PATH")]
    pub private_key: PathBuf,

    /// SSH CA public key path (defaults to <PRIVATE_KEY_PATH>.pub)
    #[arg(short = 'p', long = "public", value_name = "PUBLIC_KEY_PATH")]
    pub public_key: Option<PathBuf>,

    /// Sign requests without waiting for confirmation
    #[arg(short = 'q', long)]
    pub skip_confirmation: bool,
}

#[derive(Args, Debug)]
pub struct SignUserArgs {
    #[command(flatten)]
    pub rpc: RpcFlags,

    /// Principals to authorise the key for (comma-separated)
    #[arg(short = 'n', long, required = true, value_delimiter = ',')]
    pub principals: Vec<String>,

    /// Path to the SSH public key
    pub public_key: PathBuf,
}

#[derive(Args, Debug)]
pub struct SignHostArgs {
    #[command(flatten)]
    pub rpc: RpcFlags,

    /// Extra principals for the host keys (comma-separated)
    #[arg(short = 'n', long, value_delimiter = ',')]
    pub principals: Vec<String>,

    /// sshd_config to read host keys from and register certificates in
    #[arg(long, value_name = "PATH")]
    pub sshd_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshca_ca::Mode;

    fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn test_server_args() {
        let cli = parse_args(&["sshca", "server", "0.0.0.0:2222", "-s", "/etc/ssh/ca", "-q"]).unwrap();
        let Command::Server(args) = cli.command else {
            panic!("expected server");
        };
        assert_eq!(args.addr, "0.0.0.0:2222");
        assert_eq!(args.private_key, PathBuf::from("/etc/ssh/ca"));
        assert!(args.public_key.is_none());
        assert!(args.skip_confirmation);
    }

    #[test]
    fn test_server_requires_private_key() {
        assert!(parse_args(&["sshca", "server", "0.0.0.0:2222"]).is_err());
    }

    #[test]
    fn test_sign_user_local() {
        let cli = parse_args(&[
            "sshca",
            "sign-user",
            "--local",
            "--ca-private",
            "ca",
            "-n",
            "alice,root",
            "/home/alice/.ssh/id_ed25519.pub",
        ])
        .unwrap();
        let Command::SignUser(args) = cli.command else {
            panic!("expected sign-user");
        };
        assert_eq!(args.principals, vec!["alice", "root"]);
        assert_eq!(
            args.rpc.transport_options(PathBuf::from("ssh-keygen")).mode().unwrap(),
            Mode::Local {
                private_key: PathBuf::from("ca"),
                public_key: None,
            }
        );
    }

    #[test]
    fn test_sign_user_requires_principals() {
        assert!(parse_args(&["sshca", "sign-user", "-r", "ca:2222", "key.pub"]).is_err());
    }

    #[test]
    fn test_sign_host_extras_are_optional() {
        let cli = parse_args(&["sshca", "sign-host", "-r", "ca.example:2222"]).unwrap();
        let Command::SignHost(args) = cli.command else {
            panic!("expected sign-host");
        };
        assert!(args.principals.is_empty());
        assert_eq!(args.rpc.remote.as_deref(), Some("ca.example:2222"));
    }

    #[test]
    fn test_trust_flags_are_not_validated_by_the_parser() {
        // Mode errors come from the transport, before any I/O.
        let cli = parse_args(&["sshca", "trust", "--local", "-r", "x:1"]).unwrap();
        let Command::Trust(rpc) = cli.command else {
            panic!("expected trust");
        };
        assert!(rpc.transport_options(PathBuf::from("ssh-keygen")).mode().is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse_args(&["sshca", "trust", "-r", "x:1", "--config", "/tmp/s.toml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }
}
