//! Named error kinds for bank/database construction and script execution.

use thiserror::Error;

/// Errors that can be raised by the public API of this crate.
///
/// Plug-in execution failures are not part of this enum: a plug-in's
/// `anyhow::Error` is wrapped as-is so its full cause chain survives.
#[derive(Debug, Error)]
pub enum ReachError {
    /// The bank or an address derived from it doesn't fit the 16-bit space:
    /// an empty body, an out-of-range origin, or a vector outside the bank.
    #[error("{0}")]
    InputShape(String),

    /// A directive in an annotation script had an invalid argument.
    #[error("line {line}: {message}")]
    Script { line: usize, message: String },

    /// A plug-in raised while updating the database, opcode validity, or
    /// permissions.
    #[error("plugin error: {0}")]
    Plugin(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReachError>;
