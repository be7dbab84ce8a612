//! Streaming frame assembler
//!
//! Raw reads from the controller do not respect frame boundaries: a read may
//! start in the middle of a frame, stop halfway through one, or carry the
//! tail of a stale reply ahead of the expected one. [`FrameAssembler`]
//! consumes bytes as they arrive and yields complete frames in order.
//!
//! ```text
//! SeekingHeader --(6 header bytes)--> HaveHeader --(length field)--> HaveLength
//!       ^                                  |                              |
//!       +------(length > 54: drop 1 byte)--+                              |
//!       +-----------------------(10 + length bytes: emit frame)-----------+
//! ```

use std::collections::VecDeque;

use tracing::trace;

use crate::frame::{
    is_sync_header, Frame, FRAME_LEN, HEADER_LEN, LENGTH_OFFSET, PAYLOAD_OFFSET,
};

/// Completed frames kept before the oldest is dropped
///
/// Enough for every frame a single full-size read can carry, plus one.
const MAX_READY_FRAMES: usize = FRAME_LEN / PAYLOAD_OFFSET + 1;

/// Parser position within the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Scanning for the next sync header
    SeekingHeader,
    /// Buffer starts with a sync header, waiting for the length field
    HaveHeader,
    /// Length field read, waiting for `frame_len` bytes in total
    HaveLength { frame_len: usize },
}

/// Incremental frame parser
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    state: AssemblerState,
    ready: VecDeque<Frame>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(FRAME_LEN),
            state: AssemblerState::SeekingHeader,
            ready: VecDeque::new(),
        }
    }

    /// Push raw bytes read from the device
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        self.advance();
    }

    /// Take the oldest complete frame, if any
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.ready.pop_front()
    }

    /// Drop all buffered bytes and pending frames
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.ready.clear();
        self.state = AssemblerState::SeekingHeader;
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Number of bytes held while waiting for more input
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn advance(&mut self) {
        loop {
            match self.state {
                AssemblerState::SeekingHeader => {
                    let found = self
                        .buffer
                        .windows(HEADER_LEN)
                        .position(is_sync_header);
                    match found {
                        Some(start) => {
                            if start > 0 {
                                trace!("Discarding {} bytes ahead of sync header", start);
                                self.buffer.drain(..start);
                            }
                            self.state = AssemblerState::HaveHeader;
                        }
                        None => {
                            // Keep a possible partial header at the tail
                            let keep = HEADER_LEN - 1;
                            if self.buffer.len() > keep {
                                let excess = self.buffer.len() - keep;
                                self.buffer.drain(..excess);
                            }
                            return;
                        }
                    }
                }
                AssemblerState::HaveHeader => {
                    if self.buffer.len() < PAYLOAD_OFFSET {
                        return;
                    }
                    let len = u16::from_le_bytes([
                        self.buffer[LENGTH_OFFSET],
                        self.buffer[LENGTH_OFFSET + 1],
                    ]);
                    let frame_len = PAYLOAD_OFFSET + usize::from(len);
                    if frame_len > FRAME_LEN {
                        trace!("Length field {} overruns frame, resyncing", len);
                        self.buffer.drain(..1);
                        self.state = AssemblerState::SeekingHeader;
                    } else {
                        self.state = AssemblerState::HaveLength { frame_len };
                    }
                }
                AssemblerState::HaveLength { frame_len } => {
                    if self.buffer.len() < frame_len {
                        return;
                    }
                    let frame = Frame::from_slice(&self.buffer[..frame_len]);
                    self.buffer.drain(..frame_len);
                    trace!("Assembled {:?}", frame);

                    if self.ready.len() == MAX_READY_FRAMES {
                        self.ready.pop_front();
                    }
                    self.ready.push_back(frame);
                    self.state = AssemblerState::SeekingHeader;
                }
            }
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
