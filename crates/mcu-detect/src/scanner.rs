//! HID interface scanner
//!
//! Enumerates HID interfaces through hidapi and reports them as
//! [`CandidateInterface`]s for the matcher.

use hidapi::{DeviceInfo, HidApi};
use tracing::{debug, info};

use crate::error::DetectError;
use crate::identity::CandidateInterface;

/// Marker preceding the revision in Windows hardware id strings
const REVISION_MARKER: &str = "REV_";

/// Extract the revision from a hardware id such as `HID\VID_1FF7&PID_0F33&REV_0450`
///
/// Returns 0 when the marker is missing or not followed by 4 hex digits.
pub fn revision_from_hardware_id(hardware_id: &str) -> u16 {
    let upper = hardware_id.to_ascii_uppercase();
    let Some(start) = upper.find(REVISION_MARKER) else {
        return 0;
    };
    upper
        .get(start + REVISION_MARKER.len()..start + REVISION_MARKER.len() + 4)
        .and_then(|hex| u16::from_str_radix(hex, 16).ok())
        .unwrap_or(0)
}

/// Build a candidate from hidapi's view of an interface
pub fn candidate_from_device_info(info: &DeviceInfo) -> CandidateInterface {
    CandidateInterface::new(info.path().to_string_lossy().into_owned(), info.release_number())
        .with_usb_info(info.vendor_id(), info.product_id(), info.interface_number())
}

/// HID interface scanner
pub struct HidScanner {
    api: HidApi,
}

impl HidScanner {
    /// Initialize the HID library
    pub fn new() -> Result<Self, DetectError> {
        let api = HidApi::new()?;
        Ok(Self { api })
    }

    /// Shared hidapi context, used to open the interfaces it reported
    pub fn api(&self) -> &HidApi {
        &self.api
    }

    /// Enumerate all HID interfaces currently attached
    pub fn enumerate_interfaces(&mut self) -> Result<Vec<CandidateInterface>, DetectError> {
        debug!("Enumerating HID interfaces...");
        self.api
            .refresh_devices()
            .map_err(|e| DetectError::EnumerationFailed(e.to_string()))?;

        let result: Vec<_> = self.api.device_list().map(candidate_from_device_info).collect();

        if result.is_empty() {
            info!("No HID interfaces found");
        } else {
            debug!("Found {} HID interface(s)", result.len());
            for candidate in &result {
                debug!("  {}", candidate);
            }
        }

        Ok(result)
    }
}
