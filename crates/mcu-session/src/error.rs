//! Error types for the connection session

use thiserror::Error;

/// Errors reported by a platform collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Interface could not be opened
    #[error("failed to open {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    /// Interface enumeration failed
    #[error("enumeration failed: {0}")]
    Enumeration(String),

    /// Read or write error on an open handle
    #[error("I/O error: {0}")]
    Io(String),

    /// The device went away
    #[error("device disconnected")]
    Disconnected,
}

/// Errors that can occur while talking to the controller
///
/// [`PlatformError`]s never surface here: the session maps a failed open to
/// [`SessionError::NotFound`] and a failed read to
/// [`SessionError::ReadTimeout`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// No candidate passed the probe
    #[error("no controller found")]
    NotFound,

    /// Writing a frame failed
    #[error("write failed")]
    WriteFailed,

    /// No complete frame arrived in time
    #[error("no reply after {attempts} attempt(s)")]
    ReadTimeout { attempts: u32 },

    /// Frames arrived but none was the expected reply
    #[error("unexpected reply after {attempts} attempt(s)")]
    MalformedFrame { attempts: u32 },

    /// No open session
    #[error("not connected")]
    NotConnected,

    /// Background worker died
    #[error("worker failed: {0}")]
    Worker(String),
}
