//! Device identity records
//!
//! - [`CandidateInterface`]: one HID interface reported by the host
//! - [`ParsedIdentity`]: vendor / product / key fragment extracted from it
//! - [`DeviceIdentity`]: a pattern that recognizes a controller variant
//! - [`DetectedDevice`]: the interface a session is bound to

use std::fmt;

use serde::{Deserialize, Serialize};

/// One HID interface discovered on the host, not yet confirmed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateInterface {
    /// OS device path
    pub path: String,
    /// Hardware revision (bcdDevice), 0 if unknown
    pub hardware_revision: u16,
    /// USB ids reported by the platform, used when the path carries none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usb: Option<UsbInfo>,
}

/// Descriptor fields some platforms report next to the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsbInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    /// USB interface number, -1 if not applicable
    pub interface_number: i32,
}

impl CandidateInterface {
    pub fn new(path: impl Into<String>, hardware_revision: u16) -> Self {
        Self {
            path: path.into(),
            hardware_revision,
            usb: None,
        }
    }

    pub fn with_usb_info(mut self, vendor_id: u16, product_id: u16, interface_number: i32) -> Self {
        self.usb = Some(UsbInfo {
            vendor_id,
            product_id,
            interface_number,
        });
        self
    }

    /// Case-insensitive path comparison
    pub fn same_path(&self, other: &CandidateInterface) -> bool {
        self.path.eq_ignore_ascii_case(&other.path)
    }
}

impl fmt::Display for CandidateInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if self.hardware_revision != 0 {
            write!(f, " (rev {:04X})", self.hardware_revision)?;
        }
        Ok(())
    }
}

/// Identity fields extracted from a candidate
///
/// Windows-style paths look like
/// `\\?\hid#vid_1ff7&pid_0f15&mi_00&col02#6&xyz#{guid}`: four `#` segments,
/// the second holding `vid_XXXX&pid_XXXX` followed by the key fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Lowercased remainder of the id segment, e.g. `mi_00&col02`
    pub key_fragment: String,
    pub revision: u16,
}

impl ParsedIdentity {
    /// Parse a candidate's identity
    ///
    /// Falls back to platform-reported USB ids when the path has no id segment.
    pub fn parse(candidate: &CandidateInterface) -> Option<Self> {
        if let Some((vendor_id, product_id, key_fragment)) = parse_path(&candidate.path) {
            return Some(Self {
                vendor_id,
                product_id,
                key_fragment,
                revision: candidate.hardware_revision,
            });
        }

        let usb = candidate.usb?;
        let key_fragment = if usb.interface_number >= 0 {
            format!("mi_{:02x}", usb.interface_number)
        } else {
            String::new()
        };
        Some(Self {
            vendor_id: usb.vendor_id,
            product_id: usb.product_id,
            key_fragment,
            revision: candidate.hardware_revision,
        })
    }
}

/// Split a `#`-delimited path into vendor id, product id and key fragment
pub fn parse_path(path: &str) -> Option<(u16, u16, String)> {
    let segments: Vec<&str> = path.split('#').collect();
    if segments.len() != 4 {
        return None;
    }

    let fields: Vec<&str> = segments[1].splitn(3, '&').collect();
    if fields.len() < 2 {
        return None;
    }
    let vendor_id = parse_id_field(fields[0])?;
    let product_id = parse_id_field(fields[1])?;
    let key_fragment = fields.get(2).copied().unwrap_or_default().to_ascii_lowercase();

    Some((vendor_id, product_id, key_fragment))
}

/// Parse `vid_1ff7` style fields
fn parse_id_field(field: &str) -> Option<u16> {
    let mut parts = field.split('_');
    let (_, hex) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    u16::from_str_radix(hex, 16).ok()
}

/// Pattern describing a known controller variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Case-insensitive substring of the key or path, empty matches anything
    pub name_fragment: &'static str,
    /// Required hardware revision, 0 matches anything
    pub revision: u16,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u16, product_id: u16, name_fragment: &'static str) -> Self {
        Self {
            vendor_id,
            product_id,
            name_fragment,
            revision: 0,
        }
    }

    pub const fn with_revision(mut self, revision: u16) -> Self {
        self.revision = revision;
        self
    }

    /// Check a parsed candidate against this pattern
    pub fn matches(&self, candidate: &ParsedIdentity, path: &str) -> bool {
        self.vendor_id == candidate.vendor_id
            && self.product_id == candidate.product_id
            && (self.revision == 0 || candidate.revision == 0 || self.revision == candidate.revision)
            && (self.name_fragment.is_empty()
                || contains_ignore_case(&candidate.key_fragment, self.name_fragment)
                || contains_ignore_case(path, self.name_fragment))
    }

    /// Check a raw path for the textual form of this pattern
    ///
    /// Used when the path cannot be parsed into fields.
    pub fn matches_text(&self, path: &str) -> bool {
        let ids = format!("vid_{:04x}&pid_{:04x}", self.vendor_id, self.product_id);
        contains_ignore_case(path, &ids)
            && (self.name_fragment.is_empty() || contains_ignore_case(path, self.name_fragment))
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vid_{:04x}&pid_{:04x}", self.vendor_id, self.product_id)?;
        if !self.name_fragment.is_empty() {
            write!(f, "&{}", self.name_fragment)?;
        }
        if self.revision != 0 {
            write!(f, " rev {:04X}", self.revision)?;
        }
        Ok(())
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// The interface a session is bound to
///
/// Once bound it only changes through [`DetectedDevice::replace`], used for
/// explicit connects and verified discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedDevice {
    device: Option<CandidateInterface>,
}

impl DetectedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&CandidateInterface> {
        self.device.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.device.is_some()
    }

    /// Bind `candidate` unless a device is already bound
    ///
    /// Returns whether the binding changed.
    pub fn bind_if_unset(&mut self, candidate: &CandidateInterface) -> bool {
        if self.device.is_some() {
            return false;
        }
        self.device = Some(candidate.clone());
        true
    }

    pub fn replace(&mut self, candidate: CandidateInterface) {
        self.device = Some(candidate);
    }

    /// Whether `candidate` is the bound interface
    pub fn is(&self, candidate: &CandidateInterface) -> bool {
        self.device
            .as_ref()
            .map(|d| d.same_path(candidate))
            .unwrap_or(false)
    }
}
