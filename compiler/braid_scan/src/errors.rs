//! Errors produced while reading or scanning template source.

use thiserror::Error;

/// Failure while assembling or scanning template text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScanError {
    /// An opening delimiter was never closed before end of text.
    #[error("unterminated control zone starting at byte {offset}")]
    UnterminatedZone {
        /// Byte offset of the opening delimiter.
        offset: usize,
    },

    /// A [`Syntax`](crate::Syntax) was built with an unusable delimiter.
    #[error("invalid template syntax: {reason}")]
    InvalidSyntax { reason: String },

    /// Template input bytes are not UTF-8.
    #[error("template source is not valid UTF-8 (first invalid byte at {offset})")]
    InvalidUtf8 { offset: usize },
}
