//! Controller Unit Protocol Library
//!
//! This crate provides encoding and decoding for the 64-byte request/response
//! frames spoken by the controller unit of Seewo interactive boards.
//!
//! # Architecture
//!
//! - [`frame`]: the fixed frame layout and [`encode`]
//! - [`command`]: the request table ([`McuCommand`])
//! - [`decode`]: validators/decoders for each reply type
//! - [`stream`]: a streaming parser that recovers frames from raw reads
//!
//! # Example
//!
//! ```rust
//! use mcu_protocol::{decode, encode, FrameAssembler};
//!
//! let reply = encode(0x34, 0x0D, b"Seewo").unwrap();
//!
//! let mut assembler = FrameAssembler::new();
//! assembler.push_bytes(&[0x00, 0x42]);
//! assembler.push_bytes(reply.as_bytes());
//!
//! let frame = assembler.next_frame().unwrap();
//! assert_eq!(decode::decode_board_text(&frame).as_deref(), Some("Seewo"));
//! ```

pub mod command;
pub mod decode;
pub mod error;
pub mod frame;
pub mod stream;

pub use command::McuCommand;
pub use error::ProtocolError;
pub use frame::{encode, Frame, FRAME_LEN, MAX_PAYLOAD_LEN, SYNC_HEADER};
pub use stream::{AssemblerState, FrameAssembler};
