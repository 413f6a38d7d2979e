//! `sshca server`

use std::sync::Arc;

use anyhow::{Context, Result};
use sshca_ca::{serve, CaService, ServiceOptions};
use tokio::net::TcpListener;

use crate::args::ServerArgs;
use crate::config::Settings;

pub async fn run(args: ServerArgs, settings: &Settings) -> Result<()> {
    let service = CaService::open(ServiceOptions {
        private_key: args.private_key,
        public_key: args.public_key,
        confirm: !args.skip_confirmation,
        keygen_program: settings.keygen_program.clone(),
    })
    .context("Failed to initialize SSH CA server")?;

    let listener = TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to listen on {}", args.addr))?;
    let addr = listener.local_addr().context("Failed to read listening address")?;

    tracing::info!(
        %addr,
        fingerprint = %service.ca_public_key().fingerprint(),
        confirm = service.requires_confirmation(),
        "SSH CA server listening"
    );
    println!(
        "serving CA {} on {}",
        service.ca_public_key().fingerprint(),
        addr
    );

    tokio::select! {
        _ = serve(listener, Arc::new(service)) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to wait for Ctrl-C")?;
            tracing::info!("shutting down");
        }
    }
    Ok(())
}
