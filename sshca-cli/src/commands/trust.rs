//! `sshca trust`: trust the CA for host and user authentication.

use anyhow::{Context, Result};
use sshca_core::PublicKey;
use sshca_sshd::ConfigModifier;

use crate::args::RpcFlags;
use crate::commands::connect;
use crate::config::Settings;
use crate::files::append_if_absent;

pub async fn run(rpc: &RpcFlags, settings: &Settings) -> Result<()> {
    let client = connect(rpc, settings).await?;
    let raw = client
        .get_ca_public_key()
        .await
        .context("Failed to fetch public key from CA")?;
    let ca_key = PublicKey::parse(raw).context("CA sent an invalid public key")?;

    trust_as_host_ca(&ca_key, settings)?;
    trust_as_user_ca(&ca_key, settings)
}

/// The `known_hosts` line accepting any host certificate signed by `key`.
pub fn known_hosts_entry(key: &PublicKey) -> String {
    format!("@cert-authority * {}", key.to_string().trim_end())
}

fn trust_as_host_ca(key: &PublicKey, settings: &Settings) -> Result<()> {
    append_if_absent(&settings.known_hosts, known_hosts_entry(key).as_bytes())
        .context("Failed to add CA to known hosts")?;
    println!(
        "trusted public key (fingerprint {}) as authority for host authentication",
        key.fingerprint()
    );
    Ok(())
}

fn trust_as_user_ca(key: &PublicKey, settings: &Settings) -> Result<()> {
    append_if_absent(&settings.trusted_user_ca_keys, key.as_bytes())
        .context("Failed to add CA to trusted user CA keys")?;

    let trusted = settings
        .trusted_user_ca_keys
        .to_str()
        .with_context(|| {
            format!(
                "Path {} is not valid UTF-8",
                settings.trusted_user_ca_keys.display()
            )
        })?;
    let mut sshd_config = ConfigModifier::with_sshd(&settings.sshd_config, &settings.sshd_program);
    sshd_config.set_unique("TrustedUserCAKeys", trusted)?;
    sshd_config
        .commit()
        .context("Unable to set TrustedUserCAKeys")?;

    println!(
        "trusted public key (fingerprint {}) as authority for user authentication",
        key.fingerprint()
    );
    Ok(())
}
