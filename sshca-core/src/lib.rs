//! Domain types shared by the sshca service, its transports and the CLI.
//!
//! This crate is intentionally IO-free:
//! - No filesystem operations
//! - No network calls
//! - No subprocesses
//! - No logging
//!
//! Reading key files, talking to `ssh-keygen` and serving requests live in
//! `sshca-ca`; editing `sshd_config` lives in `sshca-sshd`.
//!
//! # Example
//!
//! ```
//! use sshca_core::{CertificateKind, PublicKey, SignRequest};
//!
//! let key = PublicKey::parse(
//!     "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIHwXYROIrAfv9RS4LyCPdsPGy6EqM+vncrrZXzVJbNuV john@doe\n",
//! )
//! .unwrap();
//! let request = SignRequest::new("laptop_john_ed25519", CertificateKind::User, vec!["john".into()], key);
//! println!("{}", request.summary());
//! ```

pub mod cert;
pub mod identity;

pub use cert::{CertificateKind, SignRequest, SignResult};
pub use identity::{KeyError, PublicKey};
