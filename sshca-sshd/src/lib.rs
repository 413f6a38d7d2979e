//! Editing and inspecting `sshd_config`.
//!
//! [`ConfigModifier`] queues edits and commits them as one transaction: the
//! file is rewritten, checked with `sshd -t`, and restored byte for byte if the
//! check fails. [`lookup`] asks `sshd -T` what the daemon would actually use.
//!
//! Nothing here locks the file. One writer per path is assumed.

mod command;
mod error;
mod lookup;
mod modifier;
mod validator;

pub use command::checked_output;
pub use error::{CommandError, ConfigError, ValidationError};
pub use lookup::{lookup, values_for};
pub use modifier::{CommitOutcome, ConfigModifier, Modification};
pub use validator::{check_diagnostics, SshdValidator, Validator, BROKEN_KEY_DIAGNOSTICS};
