//! hidapi platform backend

use std::ffi::CString;
use std::time::Duration;

use hidapi::HidDevice;
use mcu_detect::{CandidateInterface, HidScanner};
use mcu_protocol::Frame;
use tracing::{trace, warn};

use crate::error::PlatformError;
use crate::platform::{DeviceHandle, Platform};

/// Platform backed by the system HID stack
pub struct HidPlatform {
    scanner: HidScanner,
}

impl HidPlatform {
    pub fn new() -> Result<Self, PlatformError> {
        let scanner = HidScanner::new().map_err(|e| PlatformError::Enumeration(e.to_string()))?;
        Ok(Self { scanner })
    }
}

impl Platform for HidPlatform {
    type Handle = HidHandle;

    fn enumerate_interfaces(&mut self) -> Result<Vec<CandidateInterface>, PlatformError> {
        self.scanner
            .enumerate_interfaces()
            .map_err(|e| PlatformError::Enumeration(e.to_string()))
    }

    fn open(&mut self, path: &str) -> Result<HidHandle, PlatformError> {
        let open_failed = |reason: String| PlatformError::OpenFailed {
            path: path.to_string(),
            reason,
        };
        let c_path = CString::new(path).map_err(|e| open_failed(e.to_string()))?;
        let device = self
            .scanner
            .api()
            .open_path(&c_path)
            .map_err(|e| open_failed(e.to_string()))?;
        Ok(HidHandle {
            device,
            path: path.to_string(),
        })
    }
}

/// One open HID interface
pub struct HidHandle {
    device: HidDevice,
    path: String,
}

impl DeviceHandle for HidHandle {
    fn write(&mut self, frame: &Frame) -> bool {
        // The first header byte doubles as the report id
        match self.device.write(frame.as_bytes()) {
            Ok(n) => {
                trace!("{} <- {} bytes", self.path, n);
                true
            }
            Err(e) => {
                warn!("Write to {} failed: {}", self.path, e);
                false
            }
        }
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, PlatformError> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let n = self
            .device
            .read_timeout(buf, timeout_ms)
            .map_err(|e| PlatformError::Io(e.to_string()))?;
        if n > 0 {
            trace!("{} -> {:02X?}", self.path, &buf[..n]);
        }
        Ok(n)
    }
}
