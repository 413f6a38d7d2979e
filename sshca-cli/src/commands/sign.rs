//! `sshca sign-user` and `sshca sign-host`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sshca_ca::identity::default_public_key_path;
use sshca_ca::Client;
use sshca_core::{CertificateKind, PublicKey, SignRequest};
use sshca_sshd::{lookup, ConfigModifier};

use crate::args::{SignHostArgs, SignUserArgs};
use crate::commands::connect;
use crate::config::Settings;
use crate::files::write_private;
use crate::identity::{
    certificate_identity, certificate_path, host_principals, LocalSystem, SystemNames, HOST_OWNER,
};

pub async fn run_user(args: SignUserArgs, settings: &Settings) -> Result<()> {
    let client = connect(&args.rpc, settings).await?;
    let names = LocalSystem;
    let identity = certificate_identity(&names.hostname()?, &names.username()?, &args.public_key);

    generate_certificate(
        &client,
        &args.public_key,
        identity,
        CertificateKind::User,
        args.principals,
        !args.rpc.local,
    )
    .await?;
    Ok(())
}

pub async fn run_host(args: SignHostArgs, settings: &Settings) -> Result<()> {
    let client = connect(&args.rpc, settings).await?;
    let hostname = LocalSystem.hostname()?;
    let principals = host_principals(&hostname, &args.principals);
    let sshd_config = args.sshd_config.unwrap_or_else(|| settings.sshd_config.clone());

    let host_keys = lookup(&settings.sshd_program, &sshd_config, "HostKey")
        .context("Failed to find host keys")?;
    tracing::debug!(count = host_keys.len(), "found host keys");

    let mut modifier = ConfigModifier::with_sshd(&sshd_config, &settings.sshd_program);
    let mut failures = Vec::new();

    for private_key in &host_keys {
        let public_key = default_public_key_path(Path::new(private_key));
        let identity = certificate_identity(&hostname, HOST_OWNER, &public_key);
        let signed = generate_certificate(
            &client,
            &public_key,
            identity,
            CertificateKind::Host,
            principals.clone(),
            !args.rpc.local,
        )
        .await
        .and_then(|cert| register_host_certificate(&mut modifier, &cert));

        if let Err(e) = signed {
            eprintln!("{e:#}");
            failures.push(e);
        }
    }

    if !modifier.pending().is_empty() {
        if let Err(e) = modifier.commit() {
            failures.push(anyhow::Error::new(e).context("Failed to register host certificates"));
        }
    }

    combine_failures(failures)
}

/// Sign the key at `key_path` and write the certificate beside it.
///
/// An in-process CA already prints the request summary, so `announce` is
/// only set for remote CAs.
async fn generate_certificate(
    client: &Client,
    key_path: &Path,
    identity: String,
    kind: CertificateKind,
    principals: Vec<String>,
    announce: bool,
) -> Result<PathBuf> {
    let raw = std::fs::read(key_path)
        .with_context(|| format!("Failed to read public key at {}", key_path.display()))?;
    let public_key = PublicKey::parse(raw)
        .with_context(|| format!("Invalid public key at {}", key_path.display()))?;

    let request = SignRequest::new(identity, kind, principals, public_key);
    if announce {
        println!("{}", request.summary());
    }

    let signed = client
        .sign_public_key(&request)
        .await
        .with_context(|| format!("Failed to generate certificate for {}", key_path.display()))?;

    let cert_path = certificate_path(key_path);
    println!("writing certificate to {}", cert_path.display());
    write_private(&cert_path, &signed.certificate)?;

    Ok(cert_path)
}

fn register_host_certificate(modifier: &mut ConfigModifier, cert: &Path) -> Result<()> {
    let value = cert
        .to_str()
        .with_context(|| format!("Path {} is not valid UTF-8", cert.display()))?;
    modifier.set("HostCertificate", value)?;
    Ok(())
}

/// One error listing every failure, or `Ok` if there were none.
fn combine_failures(mut failures: Vec<anyhow::Error>) -> Result<()> {
    if failures.len() > 1 {
        let mut message = format!("{} errors occurred:", failures.len());
        for failure in &failures {
            let _ = write!(message, "\n  * {failure:#}");
        }
        return Err(anyhow::anyhow!(message));
    }
    match failures.pop() {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}
