//! Connection session
//!
//! A [`ConnectionSession`] owns the one open handle pair to the controller
//! and drives everything that happens on it:
//!
//! - discovery: rank candidates, open and probe each until one responds
//! - explicit connect to a known path
//! - request execution with per-attempt deadlines, retries and a single
//!   reconnect cycle after an I/O failure
//! - teardown
//!
//! ```text
//! Disconnected --open--> Connected --probe--> Verified
//!       ^                    |                   |
//!       +----disconnect / unrecoverable I/O------+
//! ```

use std::thread;
use std::time::{Duration, Instant};

use mcu_detect::{CandidateInterface, DetectedDevice, DeviceMatcher};
use mcu_protocol::{Frame, FrameAssembler, McuCommand, FRAME_LEN};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{PlatformError, SessionError};
use crate::events::{AttemptOutcome, SessionEvent, SessionState};
use crate::platform::{DeviceHandle, HandlePair, Platform};

/// Capacity of the event channel
const EVENT_CAPACITY: usize = 64;

/// Result of a single read attempt
enum Attempt<T> {
    Decoded(T),
    Mismatch,
    Timeout,
    ReadError(PlatformError),
}

/// The single live connection to a controller
pub struct ConnectionSession<P: Platform> {
    platform: P,
    matcher: DeviceMatcher,
    config: SessionConfig,
    state: SessionState,
    detected: DetectedDevice,
    handles: Option<HandlePair<P::Handle>>,
    assembler: FrameAssembler,
    events: broadcast::Sender<SessionEvent>,
}

impl<P: Platform> ConnectionSession<P> {
    /// Create a disconnected session with default configuration
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, SessionConfig::default())
    }

    pub fn with_config(platform: P, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            platform,
            matcher: DeviceMatcher::new(),
            config,
            state: SessionState::Disconnected,
            detected: DetectedDevice::new(),
            handles: None,
            assembler: FrameAssembler::new(),
            events,
        }
    }

    /// Replace the device matcher
    pub fn with_matcher(mut self, matcher: DeviceMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn matcher(&self) -> &DeviceMatcher {
        &self.matcher
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The bound device, if any
    pub fn detected(&self) -> &DetectedDevice {
        &self.detected
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Enumerate and rank controller candidates without connecting
    ///
    /// Enumeration failures count as zero candidates.
    pub fn list_candidates(&mut self) -> Vec<CandidateInterface> {
        let candidates = match self.platform.enumerate_interfaces() {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Interface enumeration failed: {}", e);
                Vec::new()
            }
        };
        self.matcher.find_all(candidates, &mut self.detected)
    }

    /// Find the controller and open a verified connection to it
    ///
    /// Candidates are opened and probed in rank order, starting with the
    /// bound device if there is one. The first candidate that accepts the
    /// probe becomes the bound device.
    pub fn discover_and_connect(&mut self) -> Result<CandidateInterface, SessionError> {
        self.disconnect();

        let previous = self.detected.get().cloned();
        let mut ranked = self.list_candidates();
        if let Some(bound) = &previous {
            if let Some(pos) = ranked.iter().position(|c| c.same_path(bound)) {
                let candidate = ranked.remove(pos);
                ranked.insert(0, candidate);
            }
        }
        info!("Probing {} candidate(s)", ranked.len());

        for candidate in ranked {
            let mut pair = match HandlePair::open(&mut self.platform, &candidate.path) {
                Ok(pair) => pair,
                Err(e) => {
                    debug!("Skipping {}: {}", candidate, e);
                    self.emit(SessionEvent::ProbeResult {
                        path: candidate.path.clone(),
                        success: false,
                    });
                    continue;
                }
            };

            let success = pair.writer.write(&McuCommand::Probe.frame());
            debug!("Probe {} -> {}", candidate, if success { "ok" } else { "failed" });
            self.emit(SessionEvent::ProbeResult {
                path: candidate.path.clone(),
                success,
            });
            if !success {
                continue;
            }

            if let Some(bound) = &previous {
                if !bound.same_path(&candidate) {
                    info!("Bound device {} did not answer, switching to {}", bound, candidate);
                }
            }
            self.detected.replace(candidate.clone());
            self.handles = Some(pair);
            self.set_state(SessionState::Connected);
            self.set_state(SessionState::Verified);
            info!("Connected to {}", candidate);
            return Ok(candidate);
        }

        warn!("No controller answered the probe");
        Err(SessionError::NotFound)
    }

    /// Open exactly `candidate`, skipping discovery and the probe
    ///
    /// An interface that cannot be opened is reported as
    /// [`SessionError::NotFound`].
    pub fn connect_to(&mut self, candidate: CandidateInterface) -> Result<(), SessionError> {
        self.disconnect();
        let pair = HandlePair::open(&mut self.platform, &candidate.path).map_err(|e| {
            warn!("Cannot open {}: {}", candidate, e);
            SessionError::NotFound
        })?;
        info!("Connected to {}", candidate);
        self.detected.replace(candidate);
        self.handles = Some(pair);
        self.set_state(SessionState::Connected);
        Ok(())
    }

    /// Close both handles; idempotent
    pub fn disconnect(&mut self) {
        if let Some(pair) = self.handles.take() {
            debug!("Closing {}", pair.path);
        }
        self.assembler.clear();
        self.set_state(SessionState::Disconnected);
    }

    /// Write a frame without waiting for a reply
    ///
    /// A failed write triggers one reconnect cycle before reporting failure.
    pub fn send(&mut self, frame: &Frame) -> Result<(), SessionError> {
        if self.handles.is_none() {
            return Err(SessionError::NotConnected);
        }
        if !self.write_frame(frame) {
            self.recover();
            return Err(SessionError::WriteFailed);
        }
        Ok(())
    }

    /// Send a request and wait for a reply accepted by `decoder`
    ///
    /// Uses the configured read timeout for every attempt; see
    /// [`execute_with_timeout`](Self::execute_with_timeout).
    pub fn execute<T, D>(&mut self, frame: &Frame, decoder: D, attempts: u32) -> Result<T, SessionError>
    where
        D: Fn(&Frame) -> Option<T>,
    {
        let timeout = self.config.read_timeout();
        self.execute_with_timeout(frame, decoder, attempts, timeout)
    }

    /// Send a request and wait up to `per_attempt_timeout` per attempt
    ///
    /// Later attempts re-send the request first. A failed write is never
    /// retried. The first read failure triggers one reconnect cycle; after a
    /// successful reconnect the interrupted attempt is run again on the new
    /// connection without counting against `attempts`. A second read failure
    /// ends the request as a timeout.
    pub fn execute_with_timeout<T, D>(
        &mut self,
        frame: &Frame,
        decoder: D,
        attempts: u32,
        per_attempt_timeout: Duration,
    ) -> Result<T, SessionError>
    where
        D: Fn(&Frame) -> Option<T>,
    {
        if self.handles.is_none() {
            return Err(SessionError::NotConnected);
        }
        let attempts = attempts.max(1);
        let command = frame.main_command();
        self.assembler.clear();

        let mut reconnected = false;
        let mut mismatched = false;
        let mut attempt = 1;
        while attempt <= attempts {
            if !self.write_frame(frame) {
                if !reconnected {
                    self.recover();
                }
                return Err(SessionError::WriteFailed);
            }

            let outcome = self.read_attempt(&decoder, per_attempt_timeout);
            let (result, report) = match outcome {
                Attempt::Decoded(value) => (Some(value), AttemptOutcome::Decoded),
                Attempt::Mismatch => {
                    mismatched = true;
                    (None, AttemptOutcome::Mismatch)
                }
                Attempt::Timeout => (None, AttemptOutcome::Timeout),
                Attempt::ReadError(e) => {
                    warn!("Read failed on attempt {}: {}", attempt, e);
                    self.emit_attempt(command, attempt, AttemptOutcome::ReadError(e.to_string()));
                    if reconnected || !self.recover() {
                        return Err(SessionError::ReadTimeout { attempts });
                    }
                    reconnected = true;
                    // Same attempt again on the new connection
                    continue;
                }
            };

            debug!("Command 0x{:02X} attempt {}/{}: {:?}", command, attempt, attempts, report);
            self.emit_attempt(command, attempt, report);
            if let Some(value) = result {
                return Ok(value);
            }
            attempt += 1;
        }

        if mismatched {
            Err(SessionError::MalformedFrame { attempts })
        } else {
            Err(SessionError::ReadTimeout { attempts })
        }
    }

    /// Write on the open handle, pausing afterwards on success
    fn write_frame(&mut self, frame: &Frame) -> bool {
        let Some(pair) = self.handles.as_mut() else {
            return false;
        };
        trace!("Write {:?}", frame);
        if pair.writer.write(frame) {
            thread::sleep(self.config.post_write_delay());
            true
        } else {
            warn!("Write to {} failed", pair.path);
            self.emit(SessionEvent::WriteFailed {
                command: frame.main_command(),
            });
            false
        }
    }

    fn read_attempt<T, D>(&mut self, decoder: &D, timeout: Duration) -> Attempt<T>
    where
        D: Fn(&Frame) -> Option<T>,
    {
        let Some(pair) = self.handles.as_mut() else {
            return Attempt::ReadError(PlatformError::Disconnected);
        };
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; FRAME_LEN];
        let mut mismatched = false;

        loop {
            while let Some(frame) = self.assembler.next_frame() {
                match decoder(&frame) {
                    Some(value) => return Attempt::Decoded(value),
                    None => {
                        trace!("Ignoring {:?}", frame);
                        mismatched = true;
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return if mismatched {
                    Attempt::Mismatch
                } else {
                    Attempt::Timeout
                };
            }

            match pair.reader.read(&mut buf, deadline - now) {
                Ok(0) => {}
                Ok(n) => self.assembler.push_bytes(&buf[..n]),
                Err(e) => return Attempt::ReadError(e),
            }
        }
    }

    /// Drop the connection and run one discovery cycle
    fn recover(&mut self) -> bool {
        info!("Reconnecting");
        self.emit(SessionEvent::ReconnectStarted);
        self.disconnect();
        let success = self.discover_and_connect().is_ok();
        self.emit(SessionEvent::ReconnectFinished { success });
        success
    }

    fn set_state(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug!("Session {:?} -> {:?}", from, to);
        self.state = to;
        self.emit(SessionEvent::StateChanged { from, to });
    }

    fn emit_attempt(&self, command: u8, attempt: u32, outcome: AttemptOutcome) {
        self.emit(SessionEvent::Attempt {
            command,
            attempt,
            outcome,
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}
