//! Virtual controller simulation
//!
//! Provides a simulated controller unit that answers requests with
//! protocol-accurate reply frames.

use std::collections::VecDeque;

use mcu_protocol::{decode, encode, Frame, McuCommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Direction byte the controller writes into reply headers
pub const REPLY_DIRECTION: u8 = 0x06;

/// Bytes between the payload start and the version text in firmware replies
const VERSION_PADDING: usize = 6;

/// Display input selected on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Android,
    Hdmi1,
}

/// Configuration for creating a virtual controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualControllerConfig {
    /// Board model name
    pub board_name: String,
    /// Board IP address
    pub ip: String,
    /// 12-byte unique id
    pub uid: [u8; 12],
    /// Firmware version text; its first digit run is the touch size
    pub firmware: String,
    /// Initial volume (0-100)
    pub volume: u8,
    /// Acknowledge write-only commands
    pub acks: bool,
}

impl Default for VirtualControllerConfig {
    fn default() -> Self {
        Self {
            board_name: "SEEWO-BOARD".to_string(),
            ip: "192.168.1.20".to_string(),
            uid: [
                0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB,
            ],
            firmware: "CV86_T2.1.0".to_string(),
            volume: 30,
            acks: false,
        }
    }
}

/// A simulated controller unit
#[derive(Debug)]
pub struct VirtualController {
    config: VirtualControllerConfig,
    volume: u8,
    input: InputSource,
    pen_enabled: bool,
    probes: u32,
    /// Requests received, in order
    received: Vec<Frame>,
    /// Reply frames not yet read by the host
    pending_output: VecDeque<Frame>,
}

impl VirtualController {
    pub fn new() -> Self {
        Self::from_config(VirtualControllerConfig::default())
    }

    pub fn from_config(config: VirtualControllerConfig) -> Self {
        Self {
            volume: config.volume,
            config,
            input: InputSource::Android,
            pen_enabled: true,
            probes: 0,
            received: Vec::new(),
            pending_output: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &VirtualControllerConfig {
        &self.config
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn input(&self) -> InputSource {
        self.input
    }

    pub fn pen_enabled(&self) -> bool {
        self.pen_enabled
    }

    /// Number of capability probes received
    pub fn probes(&self) -> u32 {
        self.probes
    }

    pub fn received(&self) -> &[Frame] {
        &self.received
    }

    /// Handle one request frame from the host
    ///
    /// Returns false if the frame is not a request this controller knows.
    pub fn process_frame(&mut self, frame: &Frame) -> bool {
        trace!("Controller received {:?}", frame);
        self.received.push(*frame);

        let Some(command) = Self::identify(frame) else {
            debug!(
                "Unknown request 0x{:02X}/0x{:02X}",
                frame.main_command(),
                frame.sub_command()
            );
            return false;
        };

        match command {
            McuCommand::Probe => self.probes += 1,
            McuCommand::BoardName => {
                let name = self.config.board_name.clone();
                self.reply(0x34, 0x0D, name.as_bytes());
            }
            McuCommand::IpAddress => {
                let ip = self.config.ip.clone();
                self.reply(0x34, 0x11, ip.as_bytes());
            }
            McuCommand::Uid => {
                let uid = self.config.uid;
                self.reply(decode::UID_REPLY_MAIN, 0x00, &uid);
            }
            McuCommand::FirmwareInfo => {
                let mut body = vec![0u8; VERSION_PADDING];
                body.extend_from_slice(self.config.firmware.as_bytes());
                self.reply(decode::VERSION_REPLY.0, decode::VERSION_REPLY.1, &body);
            }
            McuCommand::VolumeUp => self.volume = self.volume.saturating_add(1).min(100),
            McuCommand::VolumeDown => self.volume = self.volume.saturating_sub(1),
            McuCommand::SwitchHdmi1 => self.input = InputSource::Hdmi1,
            McuCommand::Pen { enabled } => self.pen_enabled = enabled,
        }

        if self.config.acks && !command.expects_response() && command != McuCommand::Probe {
            self.reply(command.main_code(), command.sub_code(), &[]);
        }
        true
    }

    /// Take the next reply frame
    pub fn take_output(&mut self) -> Option<Frame> {
        self.pending_output.pop_front()
    }

    pub fn has_output(&self) -> bool {
        !self.pending_output.is_empty()
    }

    pub fn clear_output(&mut self) {
        self.pending_output.clear();
    }

    /// Match a request frame against the command table
    fn identify(frame: &Frame) -> Option<McuCommand> {
        if !frame.has_sync_header() {
            return None;
        }
        let commands = [
            McuCommand::Probe,
            McuCommand::BoardName,
            McuCommand::IpAddress,
            McuCommand::Uid,
            McuCommand::FirmwareInfo,
            McuCommand::VolumeUp,
            McuCommand::VolumeDown,
            McuCommand::SwitchHdmi1,
            McuCommand::Pen { enabled: true },
            McuCommand::Pen { enabled: false },
        ];
        commands.into_iter().find(|c| c.frame() == *frame)
    }

    fn reply(&mut self, main: u8, sub: u8, body: &[u8]) {
        let Ok(frame) = encode(main, sub, body) else {
            debug!("Reply body of {} bytes does not fit a frame", body.len());
            return;
        };
        let mut bytes = *frame.as_bytes();
        bytes[2] = REPLY_DIRECTION;
        self.pending_output.push_back(Frame::from_bytes(bytes));
    }
}

impl Default for VirtualController {
    fn default() -> Self {
        Self::new()
    }
}
