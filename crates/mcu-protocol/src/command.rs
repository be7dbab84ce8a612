//! Controller command table
//!
//! Every request the host sends, with the bytes that go on the wire.

use crate::frame::Frame;

/// Main command code of the capability probe
pub const PROBE_MAIN: u8 = 0x33;
/// Main command code shared by volume up and down
pub const VOLUME_MAIN: u8 = 0x08;

/// Requests understood by the controller unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum McuCommand {
    /// Capability check sent to a freshly opened candidate
    Probe,
    /// Read the board model name
    BoardName,
    /// Read the board IP address
    IpAddress,
    /// Read the 12-byte unique id
    Uid,
    /// Read firmware version and touch panel size
    FirmwareInfo,
    VolumeUp,
    VolumeDown,
    /// Switch the display input to HDMI 1
    SwitchHdmi1,
    /// Enable or disable the stylus
    Pen { enabled: bool },
}

impl McuCommand {
    pub fn main_code(&self) -> u8 {
        match self {
            Self::Probe => PROBE_MAIN,
            Self::BoardName | Self::IpAddress => 0x34,
            Self::Uid => 0x40,
            Self::FirmwareInfo => 0x16,
            Self::VolumeUp | Self::VolumeDown => VOLUME_MAIN,
            Self::SwitchHdmi1 => 0x07,
            Self::Pen { .. } => 0x2A,
        }
    }

    pub fn sub_code(&self) -> u8 {
        match self {
            Self::Probe | Self::Uid | Self::Pen { .. } => 0x00,
            Self::BoardName => 0x0C,
            Self::IpAddress => 0x10,
            Self::FirmwareInfo => 0x02,
            Self::VolumeUp => 0x02,
            Self::VolumeDown => 0x01,
            Self::SwitchHdmi1 => 0x09,
        }
    }

    /// Request payload bytes
    pub fn payload(&self) -> &'static [u8] {
        match self {
            Self::Probe => &[0x00],
            Self::Pen { enabled: true } => &[0x01],
            Self::Pen { enabled: false } => &[0x00],
            _ => &[],
        }
    }

    /// Whether the controller answers with a data frame
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            Self::BoardName | Self::IpAddress | Self::Uid | Self::FirmwareInfo
        )
    }

    /// Encoded request frame
    pub fn frame(&self) -> Frame {
        Frame::build(self.main_code(), self.sub_code(), self.payload())
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::BoardName => "board-name",
            Self::IpAddress => "ip",
            Self::Uid => "uid",
            Self::FirmwareInfo => "firmware-info",
            Self::VolumeUp => "volume-up",
            Self::VolumeDown => "volume-down",
            Self::SwitchHdmi1 => "hdmi1",
            Self::Pen { enabled: true } => "pen-on",
            Self::Pen { enabled: false } => "pen-off",
        }
    }
}
