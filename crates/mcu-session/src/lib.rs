//! Controller Unit Session Library
//!
//! This crate owns the live connection to a Seewo board controller:
//!
//! - [`ConnectionSession`]: discovery, probing, request execution with
//!   retries and reconnect, teardown
//! - [`McuController`]: the typed command facade over a shared session
//! - [`Platform`] / [`DeviceHandle`]: the HID transport seam, with the
//!   hidapi implementation in [`hid`]
//!
//! # Example
//!
//! ```rust,no_run
//! use mcu_session::{ConnectionSession, HidPlatform, McuController};
//!
//! let platform = HidPlatform::new().unwrap();
//! let controller = McuController::new(ConnectionSession::new(platform));
//!
//! if controller.connect() {
//!     println!("Board: {}", controller.board_name());
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod hid;
pub mod platform;
pub mod session;

pub use config::SessionConfig;
pub use controller::{DeviceSummary, McuController, VolumeOutcome};
pub use error::{PlatformError, SessionError};
pub use events::{AttemptOutcome, SessionEvent, SessionState};
pub use hid::HidPlatform;
pub use platform::{DeviceHandle, HandlePair, Platform};
pub use session::ConnectionSession;
