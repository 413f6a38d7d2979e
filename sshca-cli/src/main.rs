//! sshca - run an SSH certificate authority and use it from hosts and users.
//!
//! - `server` serves a CA key over TCP, asking the operator to confirm each request
//! - `trust` makes this machine trust the CA for host and user authentication
//! - `sign-user` certifies a user public key
//! - `sign-host` certifies every host key and registers the certificates with sshd
//!
//! Client commands reach the CA over `--remote`, or run it in-process with
//! `--local`.

mod args;
mod commands;
mod config;
mod files;
mod identity;

use args::{Cli, Command};
use clap::Parser;
use config::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Server(args) => commands::server::run(args, &settings).await,
        Command::Trust(rpc) => commands::trust::run(&rpc, &settings).await,
        Command::SignUser(args) => commands::sign::run_user(args, &settings).await,
        Command::SignHost(args) => commands::sign::run_host(args, &settings).await,
    }
}
