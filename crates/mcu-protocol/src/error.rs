//! Error types for frame encoding and decoding

use thiserror::Error;

/// Errors that can occur while building or validating frames
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload does not fit behind the 10-byte frame prefix
    #[error("payload of {len} bytes exceeds the {max}-byte frame capacity")]
    PayloadTooLong { len: usize, max: usize },

    /// Frame failed header or discriminator validation
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
