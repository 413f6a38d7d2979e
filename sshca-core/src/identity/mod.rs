//! SSH public keys in authorized-key format.
//!
//! - [`PublicKey`] - raw `authorized_keys` line plus its eagerly parsed form
//! - [`KeyError`] - the single way parsing can fail
//!
//! The raw bytes are the canonical value. They are what gets written to disk,
//! sent over the wire and compared, so a key always serializes back to exactly
//! the bytes it was parsed from.

mod keys;

pub use keys::{KeyError, PublicKey};
