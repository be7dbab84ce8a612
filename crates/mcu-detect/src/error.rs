//! Error types for controller detection

use thiserror::Error;

/// Errors that can occur during detection
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to enumerate HID interfaces
    #[error("failed to enumerate HID interfaces: {0}")]
    EnumerationFailed(String),

    /// HID library error
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
}
