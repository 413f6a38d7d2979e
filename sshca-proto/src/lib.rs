//! Remote-call protocol between sshca clients and the CA service.
//!
//! Two methods are exposed:
//!
//! - `GetCAPublicKey()` → `{CAPublicKey}`
//! - `SignPublicKey({Identity, CertificateKind, Principals, PublicKey})` → `{Certificate}`
//!
//! Every message is a JSON document carried in a length-delimited frame
//! (see [`framing`]). Byte fields travel as standard base64. Requests carry a
//! sequence number that the matching response echoes, so several calls can be
//! in flight on one connection.

pub mod framing;
pub mod messages;

pub use framing::{read_frame, read_message, write_frame, write_message, CodecError};
pub use messages::{Call, ErrorCode, Reply, Request, Response, RpcError, SignArgs};
