//! SSH certificate authority service.
//!
//! - [`identity`] - the CA key pair as seen by the service (private key path + public key)
//! - [`backend`] - shells out to `ssh-keygen` to produce certificates
//! - [`console`] - exclusive access to the service's terminal
//! - [`service`] - [`CaService`], the request handler behind every transport
//! - [`transport`] - client and server over an in-process duplex or TCP
//!
//! `ssh-keygen` may prompt for the CA passphrase, so it runs attached to the
//! service's own stdin/stdout/stderr. Only one invocation holds the terminal at
//! a time.

pub mod backend;
pub mod console;
pub mod error;
pub mod identity;
pub mod service;
pub mod transport;

pub use backend::{KeygenRunner, SigningBackend, SshKeygen};
pub use console::{ConsoleGuard, ConsoleLock, LineOperator, Operator, TerminalOperator};
pub use error::{ClientError, ServiceError, SigningError, TransportError};
pub use identity::CaIdentity;
pub use service::{CaService, ServiceOptions};
pub use transport::{connect_local, serve, serve_connection, Client, Mode, TransportOptions};
