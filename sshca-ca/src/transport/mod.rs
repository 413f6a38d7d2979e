//! Client/server transports for the CA.
//!
//! A [`Client`] talks to a CA either in-process (an in-memory duplex stream to
//! a [`CaService`] running on a spawned task) or over TCP. Both speak the same
//! framed protocol, so the mode is picked once at connect time and callers
//! never see the difference.

mod client;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpStream;

pub use client::{Channel, Client};
pub use server::{serve, serve_connection};

use crate::error::TransportError;
use crate::service::{CaService, ServiceOptions};

/// Buffer size of the in-process duplex stream.
const LOCAL_CHANNEL_CAPACITY: usize = 64 * 1024;

/// How a command reaches its CA. Usually built from command-line flags.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Run the CA in this process.
    pub local: bool,
    /// CA private key (local mode only).
    pub ca_private_key: Option<PathBuf>,
    /// CA public key (local mode only). Defaults to `<private>.pub`.
    pub ca_public_key: Option<PathBuf>,
    /// `host:port` of a running CA server.
    pub remote: Option<String>,
    /// Signing tool used in local mode.
    pub keygen_program: PathBuf,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            local: false,
            ca_private_key: None,
            ca_public_key: None,
            remote: None,
            keygen_program: PathBuf::from("ssh-keygen"),
        }
    }
}

/// A validated transport choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Local {
        private_key: PathBuf,
        public_key: Option<PathBuf>,
    },
    Remote {
        addr: String,
    },
}

impl TransportOptions {
    /// Check the option combination without touching the network or disk.
    ///
    /// # Errors
    ///
    /// `Configuration` if both or neither of local/remote are chosen, or local
    /// mode has no private key or an empty one.
    pub fn mode(&self) -> Result<Mode, TransportError> {
        match (self.local, &self.remote) {
            (true, Some(_)) => Err(TransportError::Configuration(
                "--local and --remote are mutually exclusive",
            )),
            (false, None) => Err(TransportError::Configuration(
                "one of --local or --remote is required",
            )),
            (true, None) => match &self.ca_private_key {
                Some(private_key) if !private_key.as_os_str().is_empty() => Ok(Mode::Local {
                    private_key: private_key.clone(),
                    public_key: self.ca_public_key.clone(),
                }),
                _ => Err(TransportError::Configuration(
                    "--local requires --ca-private",
                )),
            },
            (false, Some(addr)) => Ok(Mode::Remote { addr: addr.clone() }),
        }
    }

    /// Service options for local mode. The caller is the operator, so
    /// confirmation is always off.
    pub fn local_service_options(&self) -> Result<ServiceOptions, TransportError> {
        match self.mode()? {
            Mode::Local {
                private_key,
                public_key,
            } => Ok(ServiceOptions {
                private_key,
                public_key,
                confirm: false,
                keygen_program: self.keygen_program.clone(),
            }),
            Mode::Remote { .. } => Err(TransportError::Configuration(
                "local service requested in remote mode",
            )),
        }
    }

    /// Validate and open the chosen transport.
    pub async fn connect(&self) -> Result<Client, TransportError> {
        match self.mode()? {
            Mode::Local { .. } => {
                let service = CaService::open(self.local_service_options()?)
                    .map_err(TransportError::LocalService)?;
                tracing::debug!("using in-process CA");
                Ok(connect_local(service))
            }
            Mode::Remote { addr } => {
                let stream = TcpStream::connect(&addr)
                    .await
                    .map_err(|source| TransportError::DialFailed {
                        addr: addr.clone(),
                        source,
                    })?;
                tracing::debug!(%addr, "connected to CA");
                Ok(Client::new(stream))
            }
        }
    }
}

/// Run `service` on a background task and return a client wired to it.
/// Must be called inside a tokio runtime.
pub fn connect_local(service: CaService) -> Client {
    let (server_end, client_end) = tokio::io::duplex(LOCAL_CHANNEL_CAPACITY);
    tokio::spawn(serve_connection(server_end, Arc::new(service)));
    Client::new(client_end)
}
