//! Simulated HID platform
//!
//! [`SimPlatform`] implements the session's [`Platform`] over a set of
//! virtual interfaces. Each interface can host a [`VirtualController`] and
//! carries a [`SimBehavior`] that injects the failures real hardware shows:
//! interfaces that refuse to open, dead write handles, silent devices,
//! garbage ahead of replies, short reads and unplugging.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mcu_detect::CandidateInterface;
use mcu_protocol::Frame;
use mcu_session::{DeviceHandle, Platform, PlatformError};
use parking_lot::Mutex;
use tracing::trace;

use crate::controller::VirtualController;

/// Failure injection for one simulated interface
#[derive(Debug, Clone)]
pub struct SimBehavior {
    /// `open` always fails
    pub open_fails: bool,
    /// Every write returns false
    pub write_fails: bool,
    /// Writes succeed but nothing is ever answered
    pub silent: bool,
    /// Bytes delivered ahead of every reply
    pub garbage_prefix: Vec<u8>,
    /// Largest number of bytes returned by one read
    pub chunk_size: usize,
    /// Replies to swallow before answering normally
    pub drop_replies: u32,
    /// Reads to fail before reading normally
    pub read_errors: u32,
}

impl Default for SimBehavior {
    fn default() -> Self {
        Self {
            open_fails: false,
            write_fails: false,
            silent: false,
            garbage_prefix: Vec::new(),
            chunk_size: 64,
            drop_replies: 0,
            read_errors: 0,
        }
    }
}

/// I/O counters shared by every handle of a platform
#[derive(Debug, Default)]
pub struct SimStats {
    opens: AtomicUsize,
    writes: AtomicUsize,
    reads: AtomicUsize,
}

impl SimStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct DeviceState {
    candidate: CandidateInterface,
    controller: Option<VirtualController>,
    behavior: SimBehavior,
    present: bool,
    /// Bytes waiting to be read by the host
    outbox: VecDeque<u8>,
}

/// Test-side handle to one simulated interface
#[derive(Debug, Clone)]
pub struct SimDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimDevice {
    pub fn candidate(&self) -> CandidateInterface {
        self.state.lock().candidate.clone()
    }

    /// Change the failure injection
    pub fn set_behavior(&self, behavior: SimBehavior) {
        self.state.lock().behavior = behavior;
    }

    pub fn update_behavior(&self, update: impl FnOnce(&mut SimBehavior)) {
        update(&mut self.state.lock().behavior);
    }

    /// Remove the interface from the host
    pub fn unplug(&self) {
        let mut state = self.state.lock();
        state.present = false;
        state.outbox.clear();
    }

    pub fn replug(&self) {
        self.state.lock().present = true;
    }

    /// Inspect the hosted controller
    pub fn with_controller<T>(&self, f: impl FnOnce(&VirtualController) -> T) -> Option<T> {
        self.state.lock().controller.as_ref().map(f)
    }

    /// Queue raw bytes for the host to read
    pub fn inject(&self, bytes: &[u8]) {
        self.state.lock().outbox.extend(bytes.iter().copied());
    }
}

/// A platform made of simulated interfaces
#[derive(Debug, Default)]
pub struct SimPlatform {
    devices: Vec<SimDevice>,
    stats: Arc<SimStats>,
    enumeration_fails: bool,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interface hosting a controller
    pub fn add_controller(
        &mut self,
        candidate: CandidateInterface,
        controller: VirtualController,
        behavior: SimBehavior,
    ) -> SimDevice {
        self.add(candidate, Some(controller), behavior)
    }

    /// Add an interface that is not a controller: writes succeed, nothing answers
    pub fn add_bystander(&mut self, candidate: CandidateInterface) -> SimDevice {
        self.add(candidate, None, SimBehavior::default())
    }

    fn add(
        &mut self,
        candidate: CandidateInterface,
        controller: Option<VirtualController>,
        behavior: SimBehavior,
    ) -> SimDevice {
        let device = SimDevice {
            state: Arc::new(Mutex::new(DeviceState {
                candidate,
                controller,
                behavior,
                present: true,
                outbox: VecDeque::new(),
            })),
        };
        self.devices.push(device.clone());
        device
    }

    /// Make every enumeration fail
    pub fn set_enumeration_fails(&mut self, fails: bool) {
        self.enumeration_fails = fails;
    }

    pub fn stats(&self) -> Arc<SimStats> {
        Arc::clone(&self.stats)
    }
}

impl Platform for SimPlatform {
    type Handle = SimHandle;

    fn enumerate_interfaces(&mut self) -> Result<Vec<CandidateInterface>, PlatformError> {
        if self.enumeration_fails {
            return Err(PlatformError::Enumeration("simulated failure".to_string()));
        }
        Ok(self
            .devices
            .iter()
            .map(|d| d.state.lock())
            .filter(|s| s.present)
            .map(|s| s.candidate.clone())
            .collect())
    }

    fn open(&mut self, path: &str) -> Result<SimHandle, PlatformError> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let device = self
            .devices
            .iter()
            .find(|d| {
                let s = d.state.lock();
                s.present && s.candidate.path.eq_ignore_ascii_case(path)
            })
            .ok_or_else(|| PlatformError::OpenFailed {
                path: path.to_string(),
                reason: "no such device".to_string(),
            })?;

        if device.state.lock().behavior.open_fails {
            return Err(PlatformError::OpenFailed {
                path: path.to_string(),
                reason: "access denied".to_string(),
            });
        }

        Ok(SimHandle {
            device: device.clone(),
            stats: Arc::clone(&self.stats),
        })
    }
}

/// An open simulated interface
pub struct SimHandle {
    device: SimDevice,
    stats: Arc<SimStats>,
}

impl DeviceHandle for SimHandle {
    fn write(&mut self, frame: &Frame) -> bool {
        self.stats.writes.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.device.state.lock();
        let state = &mut *guard;
        if !state.present || state.behavior.write_fails {
            return false;
        }

        let Some(controller) = state.controller.as_mut() else {
            return true;
        };
        controller.process_frame(frame);
        while let Some(reply) = controller.take_output() {
            if state.behavior.silent {
                continue;
            }
            if state.behavior.drop_replies > 0 {
                state.behavior.drop_replies -= 1;
                trace!("Dropping reply {:?}", reply);
                continue;
            }
            state.outbox.extend(state.behavior.garbage_prefix.iter().copied());
            state.outbox.extend(reply.as_bytes().iter().copied());
        }
        true
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, PlatformError> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.device.state.lock();
            if !state.present {
                return Err(PlatformError::Disconnected);
            }
            if state.behavior.read_errors > 0 {
                state.behavior.read_errors -= 1;
                return Err(PlatformError::Io("simulated read error".to_string()));
            }

            let n = buf.len().min(state.behavior.chunk_size.max(1)).min(state.outbox.len());
            if n > 0 {
                for (slot, byte) in buf.iter_mut().zip(state.outbox.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
        }

        // Nothing pending: block like a real read would
        thread::sleep(timeout);
        Ok(0)
    }
}
