//! Session event stream
//!
//! Everything a session does that an observer might want to show or log is
//! published on a broadcast channel. Publishing never blocks and has no
//! effect on the session itself.

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No handles open
    Disconnected,
    /// Handles open, not probed
    Connected,
    /// Handles open and the device accepted a probe
    Verified,
}

impl SessionState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

/// Result of one read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Deadline passed without a complete frame
    Timeout,
    /// Frames arrived but the decoder rejected them
    Mismatch,
    /// The decoder accepted a frame
    Decoded,
    /// The platform read failed
    ReadError(String),
}

/// Events published by a [`ConnectionSession`](crate::ConnectionSession)
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session changed state
    StateChanged {
        from: SessionState,
        to: SessionState,
    },

    /// A discovery candidate was opened and probed
    ProbeResult {
        /// Interface path
        path: String,
        /// Whether the probe write went through
        success: bool,
    },

    /// A read attempt finished
    Attempt {
        /// Main command of the request
        command: u8,
        /// 1-based attempt number
        attempt: u32,
        outcome: AttemptOutcome,
    },

    /// Writing a frame failed
    WriteFailed {
        /// Main command of the request
        command: u8,
    },

    /// A reconnect cycle started after an I/O failure
    ReconnectStarted,

    /// A reconnect cycle finished
    ReconnectFinished {
        success: bool,
    },
}
