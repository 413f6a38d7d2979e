//! CLI commands.

pub mod server;
pub mod sign;
pub mod trust;

use anyhow::{Context, Result};
use sshca_ca::Client;

use crate::args::RpcFlags;
use crate::config::Settings;

/// Open the transport selected by `rpc`.
pub async fn connect(rpc: &RpcFlags, settings: &Settings) -> Result<Client> {
    rpc.transport_options(settings.keygen_program.clone())
        .connect()
        .await
        .context("Failed to reach SSH CA")
}
