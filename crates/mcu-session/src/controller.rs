//! Command facade
//!
//! [`McuController`] maps each controller operation to a request frame, a
//! reply decoder and an attempt budget, and turns every failure into a plain
//! "unavailable" value: `""` for text, `-1` for numbers, `false` for actions.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mcu_detect::catalog::variant_name;
use mcu_detect::{CandidateInterface, ParsedIdentity};
use mcu_protocol::decode::{
    decode_ack, decode_board_text, decode_ip, decode_uid, decode_version_size, decode_version_text,
};
use mcu_protocol::{Frame, McuCommand};
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::events::{SessionEvent, SessionState};
use crate::platform::Platform;
use crate::session::ConnectionSession;

/// Default pause between single volume steps
pub const DEFAULT_VOLUME_STEP_DELAY: Duration = Duration::from_millis(100);

/// What is known about the bound device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub path: String,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub revision: u16,
    /// Catalog name of the variant, if it is a known one
    pub variant: Option<&'static str>,
}

/// Result of a multi-step volume change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeOutcome {
    pub requested: u32,
    pub succeeded: u32,
}

impl VolumeOutcome {
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.requested
    }
}

/// Shared handle to one controller session
pub struct McuController<P: Platform> {
    session: Arc<Mutex<ConnectionSession<P>>>,
    volume_step_delay: Duration,
}

impl<P: Platform> Clone for McuController<P> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            volume_step_delay: self.volume_step_delay,
        }
    }
}

impl<P: Platform> McuController<P> {
    pub fn new(session: ConnectionSession<P>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            volume_step_delay: DEFAULT_VOLUME_STEP_DELAY,
        }
    }

    pub fn with_volume_step_delay(mut self, delay: Duration) -> Self {
        self.volume_step_delay = delay;
        self
    }

    /// Exclusive access to the session
    pub fn session(&self) -> MutexGuard<'_, ConnectionSession<P>> {
        self.session.lock()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.lock().subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.session.lock().state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Discover the controller and open a verified connection
    pub fn connect(&self) -> bool {
        match self.session.lock().discover_and_connect() {
            Ok(_) => true,
            Err(e) => {
                info!("Connect failed: {}", e);
                false
            }
        }
    }

    /// Connect to a known interface path
    pub fn connect_to(&self, candidate: CandidateInterface) -> bool {
        match self.session.lock().connect_to(candidate) {
            Ok(()) => true,
            Err(e) => {
                warn!("Connect failed: {}", e);
                false
            }
        }
    }

    pub fn disconnect(&self) {
        self.session.lock().disconnect();
    }

    /// Ranked controller candidates on the host, without connecting
    pub fn list_candidates(&self) -> Vec<CandidateInterface> {
        self.session.lock().list_candidates()
    }

    /// Summary of the bound device, `None` if nothing is bound
    pub fn device_info(&self) -> Option<DeviceSummary> {
        let session = self.session.lock();
        let device = session.detected().get()?;
        let parsed = ParsedIdentity::parse(device);
        Some(DeviceSummary {
            path: device.path.clone(),
            vendor_id: parsed.as_ref().map(|p| p.vendor_id),
            product_id: parsed.as_ref().map(|p| p.product_id),
            revision: device.hardware_revision,
            variant: variant_name(session.matcher().catalog(), device),
        })
    }

    /// Board model name, `""` if unavailable
    pub fn board_name(&self) -> String {
        self.query(McuCommand::BoardName, decode_board_text)
            .unwrap_or_default()
    }

    /// Board IP address, `""` if unavailable
    pub fn ip(&self) -> String {
        self.query(McuCommand::IpAddress, decode_ip).unwrap_or_default()
    }

    /// Unique id as space-separated hex pairs, `""` if unavailable
    pub fn uid(&self) -> String {
        self.query(McuCommand::Uid, decode_uid).unwrap_or_default()
    }

    /// Touch panel size in inches, `-1` if unavailable
    pub fn touch_size(&self) -> i32 {
        self.query(McuCommand::FirmwareInfo, decode_version_size)
            .and_then(|size| i32::try_from(size).ok())
            .unwrap_or(-1)
    }

    /// Firmware version string, `""` if unavailable
    pub fn firmware_version(&self) -> String {
        self.query(McuCommand::FirmwareInfo, decode_version_text)
            .unwrap_or_default()
    }

    pub fn volume_up(&self) -> bool {
        self.command(McuCommand::VolumeUp)
    }

    pub fn volume_down(&self) -> bool {
        self.command(McuCommand::VolumeDown)
    }

    /// Change the volume by `steps` single steps; negative lowers it
    ///
    /// Stops at the first step that fails.
    pub fn volume(&self, steps: i32) -> VolumeOutcome {
        let command = if steps >= 0 {
            McuCommand::VolumeUp
        } else {
            McuCommand::VolumeDown
        };
        let mut outcome = VolumeOutcome {
            requested: steps.unsigned_abs(),
            succeeded: 0,
        };

        for step in 0..outcome.requested {
            if step > 0 {
                thread::sleep(self.volume_step_delay);
            }
            if !self.command(command) {
                break;
            }
            outcome.succeeded += 1;
        }
        debug!("Volume {:+}: {}/{} steps", steps, outcome.succeeded, outcome.requested);
        outcome
    }

    /// Switch the display input to HDMI 1
    pub fn switch_hdmi1(&self) -> bool {
        self.command(McuCommand::SwitchHdmi1)
    }

    pub fn set_pen(&self, enabled: bool) -> bool {
        self.command(McuCommand::Pen { enabled })
    }

    /// Send a request that expects a data reply
    fn query<T>(&self, command: McuCommand, decoder: fn(&Frame) -> Option<T>) -> Option<T> {
        let mut session = self.session.lock();
        let attempts = session.config().attempts;
        match session.execute(&command.frame(), decoder, attempts) {
            Ok(value) => Some(value),
            Err(e) => {
                report(command, &e);
                None
            }
        }
    }

    /// Send a write-only request
    fn command(&self, command: McuCommand) -> bool {
        let mut session = self.session.lock();
        let frame = command.frame();
        let result = if session.config().confirm_acks {
            let main = command.main_code();
            let attempts = session.config().attempts;
            session.execute(&frame, |f| decode_ack(f, main).then_some(()), attempts)
        } else {
            session.send(&frame)
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                report(command, &e);
                false
            }
        }
    }
}

impl<P: Platform + 'static> McuController<P> {
    /// Run an operation on the blocking worker pool
    ///
    /// The handle resolves once with the operation's result. A platform read
    /// in progress cannot be interrupted, so neither can the operation.
    pub fn spawn<T, F>(&self, op: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&McuController<P>) -> T + Send + 'static,
    {
        let controller = self.clone();
        tokio::task::spawn_blocking(move || op(&controller))
    }

    /// Like [`spawn`](Self::spawn), awaiting the result
    pub async fn run<T, F>(&self, op: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&McuController<P>) -> T + Send + 'static,
    {
        self.spawn(op)
            .await
            .map_err(|e| SessionError::Worker(e.to_string()))
    }
}

fn report(command: McuCommand, error: &SessionError) {
    match error {
        SessionError::NotConnected => info!("{}: not connected", command.name()),
        _ => warn!("{} failed: {}", command.name(), error),
    }
}
