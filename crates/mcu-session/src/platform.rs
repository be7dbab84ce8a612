//! Platform collaborator traits
//!
//! A [`Platform`] enumerates HID interfaces and opens them; a
//! [`DeviceHandle`] moves frames in and out of one open interface. Closing a
//! handle is dropping it.

use std::time::Duration;

use mcu_detect::CandidateInterface;
use mcu_protocol::Frame;

use crate::error::PlatformError;

/// Host side of the HID transport
pub trait Platform: Send {
    type Handle: DeviceHandle;

    /// List the HID interfaces currently attached; may be empty
    fn enumerate_interfaces(&mut self) -> Result<Vec<CandidateInterface>, PlatformError>;

    /// Open one interface by path
    fn open(&mut self, path: &str) -> Result<Self::Handle, PlatformError>;
}

/// One open interface
pub trait DeviceHandle: Send {
    /// Write a frame, returning whether the OS accepted it
    fn write(&mut self, frame: &Frame) -> bool;

    /// Read up to `buf.len()` bytes, blocking at most `timeout`
    ///
    /// `Ok(0)` means nothing arrived in time.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, PlatformError>;
}

/// Write and read handles opened on the same interface
pub struct HandlePair<H> {
    pub path: String,
    pub writer: H,
    pub reader: H,
}

impl<H: DeviceHandle> HandlePair<H> {
    /// Open both handles, dropping the first if the second fails
    pub fn open<P>(platform: &mut P, path: &str) -> Result<Self, PlatformError>
    where
        P: Platform<Handle = H>,
    {
        let writer = platform.open(path)?;
        let reader = platform.open(path)?;
        Ok(Self {
            path: path.to_string(),
            writer,
            reader,
        })
    }
}
