//! Controller Unit Detection Library
//!
//! This crate finds the HID interface of a Seewo board controller among
//! everything the host exposes: a catalog of known variants, a coarse rule
//! for unknown ones, and a ranking that decides which interface to try first.
//!
//! # Example
//!
//! ```rust
//! use mcu_detect::{CandidateInterface, DetectedDevice, DeviceMatcher};
//!
//! let matcher = DeviceMatcher::new();
//! let mut detected = DetectedDevice::new();
//!
//! let found = matcher.find_all(
//!     vec![
//!         CandidateInterface::new(r"\\?\hid#vid_046d&pid_c31c&mi_00#1#{g}", 0),
//!         CandidateInterface::new(r"\\?\hid#vid_1ff7&pid_0f15&mi_00&col02#6&xyz#{g}", 0),
//!     ],
//!     &mut detected,
//! );
//!
//! assert_eq!(found.len(), 1);
//! assert!(detected.is(&found[0]));
//! ```

pub mod catalog;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod scanner;

pub use catalog::{IdentityCatalog, Rank};
pub use error::DetectError;
pub use identity::{CandidateInterface, DetectedDevice, DeviceIdentity, ParsedIdentity, UsbInfo};
pub use matcher::DeviceMatcher;
pub use scanner::{revision_from_hardware_id, HidScanner};
