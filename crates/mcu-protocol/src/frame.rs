//! Fixed-size frame representation
//!
//! # Frame Format
//! ```text
//! FC A5 [dir] 3B 00 FB [main] [sub] [len_lo] [len_hi] [payload...] 00 00 ...
//! ```
//!
//! - `FC A5 dir 3B 00 FB`: sync header; `dir` is 0x05 on host requests and
//!   is rewritten by the controller on replies
//! - `main` / `sub`: command codes
//! - `len`: little-endian payload length
//! - `payload`: up to 54 bytes, the rest of the 64-byte frame is zero

use std::fmt;

use crate::error::ProtocolError;

/// Total size of every frame on the wire
pub const FRAME_LEN: usize = 64;
/// Size of the sync header
pub const HEADER_LEN: usize = 6;
/// Offset of the main command byte
pub const MAIN_OFFSET: usize = 6;
/// Offset of the sub command byte
pub const SUB_OFFSET: usize = 7;
/// Offset of the little-endian payload length
pub const LENGTH_OFFSET: usize = 8;
/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: usize = 10;
/// Largest payload that fits in a frame
pub const MAX_PAYLOAD_LEN: usize = FRAME_LEN - PAYLOAD_OFFSET;

/// Sync header as sent by the host
pub const SYNC_HEADER: [u8; HEADER_LEN] = [0xFC, 0xA5, 0x05, 0x3B, 0x00, 0xFB];
/// Header byte carrying the transfer direction, ignored when matching
pub const DIRECTION_INDEX: usize = 2;

/// Check whether `bytes` starts with a sync header
///
/// The direction byte is not compared since replies carry a different value.
pub fn is_sync_header(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN
        && SYNC_HEADER
            .iter()
            .zip(bytes)
            .enumerate()
            .all(|(i, (expected, actual))| i == DIRECTION_INDEX || expected == actual)
}

/// One 64-byte protocol message
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Encode a request frame
    ///
    /// The length field is set to the payload length. Payloads longer than
    /// [`MAX_PAYLOAD_LEN`] are rejected.
    pub fn encode(main: u8, sub: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLong {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        Ok(Self::build(main, sub, payload))
    }

    /// Build a frame whose payload is known to fit
    pub(crate) fn build(main: u8, sub: u8, payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_PAYLOAD_LEN);
        let mut bytes = [0u8; FRAME_LEN];
        bytes[..HEADER_LEN].copy_from_slice(&SYNC_HEADER);
        bytes[MAIN_OFFSET] = main;
        bytes[SUB_OFFSET] = sub;
        bytes[LENGTH_OFFSET..PAYLOAD_OFFSET].copy_from_slice(&(len as u16).to_le_bytes());
        bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + len].copy_from_slice(&payload[..len]);
        Self(bytes)
    }

    /// Wrap raw frame bytes without validation
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy up to 64 bytes from `data`, zero-padding the rest
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        let n = data.len().min(FRAME_LEN);
        bytes[..n].copy_from_slice(&data[..n]);
        Self(bytes)
    }

    /// Validate a complete request or reply taken off the wire
    ///
    /// Requires exactly [`FRAME_LEN`] bytes, a sync header, and a length
    /// field that stays inside the frame.
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: [u8; FRAME_LEN] = data.try_into().map_err(|_| {
            ProtocolError::InvalidFrame(format!("expected {} bytes, got {}", FRAME_LEN, data.len()))
        })?;
        let frame = Self(bytes);
        if !frame.has_sync_header() {
            return Err(ProtocolError::InvalidFrame(format!(
                "bad sync header {:02X?}",
                &bytes[..HEADER_LEN]
            )));
        }
        if frame.payload().is_none() {
            return Err(ProtocolError::InvalidFrame(format!(
                "length {} overruns frame",
                frame.payload_len()
            )));
        }
        Ok(frame)
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Whether the frame starts with a sync header
    pub fn has_sync_header(&self) -> bool {
        is_sync_header(&self.0)
    }

    pub fn main_command(&self) -> u8 {
        self.0[MAIN_OFFSET]
    }

    pub fn sub_command(&self) -> u8 {
        self.0[SUB_OFFSET]
    }

    /// Value of the little-endian length field
    pub fn payload_len(&self) -> u16 {
        u16::from_le_bytes([self.0[LENGTH_OFFSET], self.0[LENGTH_OFFSET + 1]])
    }

    /// Length-prefixed payload, or `None` if the length field runs past the frame
    pub fn payload(&self) -> Option<&[u8]> {
        let end = PAYLOAD_OFFSET + usize::from(self.payload_len());
        self.0.get(PAYLOAD_OFFSET..end)
    }

    /// Bytes from `offset` to the end of the frame
    pub fn tail(&self, offset: usize) -> &[u8] {
        self.0.get(offset..).unwrap_or(&[])
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self([0u8; FRAME_LEN])
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = match self.payload() {
            Some(p) => PAYLOAD_OFFSET + p.len(),
            None => FRAME_LEN,
        };
        write!(f, "Frame({:02X?}", &self.0[..used])?;
        if used < FRAME_LEN {
            write!(f, " +{} zero", FRAME_LEN - used)?;
        }
        write!(f, ")")
    }
}

/// Encode a request frame, see [`Frame::encode`]
pub fn encode(main: u8, sub: u8, payload: &[u8]) -> Result<Frame, ProtocolError> {
    Frame::encode(main, sub, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = encode(0x2A, 0x00, &[0x01]).unwrap();
        let bytes = frame.as_bytes();
        assert_eq!(&bytes[..6], &SYNC_HEADER);
        assert_eq!(bytes[6], 0x2A);
        assert_eq!(bytes[7], 0x00);
        assert_eq!(bytes[8], 0x01);
        assert_eq!(bytes[9], 0x00);
        assert_eq!(bytes[10], 0x01);
        assert!(bytes[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_empty_payload_leaves_length_zero() {
        let frame = encode(0x34, 0x0C, &[]).unwrap();
        assert_eq!(frame.payload_len(), 0);
        assert_eq!(frame.payload(), Some(&[][..]));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = [0x41u8; MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            encode(0x34, 0x0D, &payload),
            Err(ProtocolError::PayloadTooLong { len: 55, max: 54 })
        );
        assert!(encode(0x34, 0x0D, &payload[..MAX_PAYLOAD_LEN]).is_ok());
    }

    #[test]
    fn test_sync_header_ignores_direction_byte() {
        assert!(is_sync_header(&SYNC_HEADER));
        assert!(is_sync_header(&[0xFC, 0xA5, 0x06, 0x3B, 0x00, 0xFB]));
        assert!(!is_sync_header(&[0xFC, 0xA5, 0x05, 0x3B, 0x01, 0xFB]));
        assert!(!is_sync_header(&[0xFC, 0xA5, 0x05, 0x3B, 0x00]));
    }

    #[test]
    fn test_parse() {
        let frame = encode(0x34, 0x0C, &[]).unwrap();
        assert_eq!(Frame::parse(frame.as_bytes()), Ok(frame));
        assert!(matches!(
            Frame::parse(&frame.as_bytes()[..63]),
            Err(ProtocolError::InvalidFrame(_))
        ));
        assert!(Frame::parse(&[0u8; FRAME_LEN]).is_err());
    }

    #[test]
    fn test_payload_out_of_bounds() {
        let mut bytes = *encode(0x34, 0x0D, b"abc").unwrap().as_bytes();
        bytes[8] = 200;
        assert_eq!(Frame::from_bytes(bytes).payload(), None);
    }
}
