//! Response decoders
//!
//! Each decoder validates the sync header and the command discriminator of a
//! reply frame before interpreting its body. A decoder returning `None` means
//! the frame is not the reply it is looking for.

use crate::frame::{Frame, PAYLOAD_OFFSET};

/// Board name reply discriminator
pub const BOARD_NAME_REPLY: (u8, u8) = (0x34, 0x0D);
/// IP address reply discriminator
pub const IP_REPLY: (u8, u8) = (0x34, 0x11);
/// UID reply main command
pub const UID_REPLY_MAIN: u8 = 0xC1;
/// Firmware / touch info reply discriminator
pub const VERSION_REPLY: (u8, u8) = (0xC6, 0x02);

/// Number of raw UID bytes following the frame prefix
pub const UID_LEN: usize = 12;
/// Offset of the ASCII version block in a firmware reply
pub const VERSION_TEXT_OFFSET: usize = 16;

fn has_discriminator(frame: &Frame, (main, sub): (u8, u8)) -> bool {
    frame.has_sync_header() && frame.main_command() == main && frame.sub_command() == sub
}

/// Length-prefixed UTF-8 body; invalid sequences are replaced
fn decode_text(frame: &Frame) -> Option<String> {
    frame
        .payload()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

/// Decode a board name reply (`0x34 / 0x0D`)
pub fn decode_board_text(frame: &Frame) -> Option<String> {
    if !has_discriminator(frame, BOARD_NAME_REPLY) {
        return None;
    }
    decode_text(frame)
}

/// Decode an IP address reply (`0x34 / 0x11`)
pub fn decode_ip(frame: &Frame) -> Option<String> {
    if !has_discriminator(frame, IP_REPLY) {
        return None;
    }
    decode_text(frame)
}

/// Decode a UID reply (`0xC1`) as space-separated lowercase hex pairs
pub fn decode_uid(frame: &Frame) -> Option<String> {
    if !frame.has_sync_header() || frame.main_command() != UID_REPLY_MAIN {
        return None;
    }
    let raw = frame.as_bytes().get(PAYLOAD_OFFSET..PAYLOAD_OFFSET + UID_LEN)?;
    let pairs: Vec<String> = raw.iter().map(|b| format!("{:02x}", b)).collect();
    Some(pairs.join(" "))
}

/// Decode the touch panel size from a firmware reply (`0xC6 / 0x02`)
///
/// Scans from offset 16 for the first run of ASCII digits. Non-digits before
/// the run are skipped. A run that reaches the end of the frame without a
/// terminating non-digit is not accepted.
pub fn decode_version_size(frame: &Frame) -> Option<u32> {
    if !has_discriminator(frame, VERSION_REPLY) {
        return None;
    }

    let mut value: Option<u32> = None;
    for &byte in frame.tail(VERSION_TEXT_OFFSET) {
        if byte.is_ascii_digit() {
            let digit = u32::from(byte - b'0');
            value = Some(value.unwrap_or(0).checked_mul(10)?.checked_add(digit)?);
        } else if value.is_some() {
            return value;
        }
    }
    None
}

/// Decode the printable firmware version string from a firmware reply
pub fn decode_version_text(frame: &Frame) -> Option<String> {
    if !has_discriminator(frame, VERSION_REPLY) {
        return None;
    }
    let text: String = frame
        .tail(VERSION_TEXT_OFFSET)
        .iter()
        .take_while(|&&b| (0x20..=0x7E).contains(&b))
        .map(|&b| char::from(b))
        .collect();
    Some(text)
}

/// Check that a frame acknowledges `expected_main`
pub fn decode_ack(frame: &Frame, expected_main: u8) -> bool {
    frame.has_sync_header() && frame.main_command() == expected_main
}
