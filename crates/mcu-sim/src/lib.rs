//! Controller Unit Simulation Library
//!
//! This crate provides a simulation layer for exercising the controller
//! session without a physical board. It includes:
//!
//! - **VirtualController**: answers requests with protocol-accurate reply frames
//! - **SimPlatform**: a HID platform of virtual interfaces with failure injection
//!
//! # Example
//!
//! ```rust
//! use mcu_detect::CandidateInterface;
//! use mcu_session::{ConnectionSession, McuController};
//! use mcu_sim::{SimBehavior, SimPlatform, VirtualController};
//!
//! let mut platform = SimPlatform::new();
//! platform.add_controller(
//!     CandidateInterface::new(r"\\?\hid#vid_1ff7&pid_0f21&mi_00&col02#7&1a2b&0&0001#{4d1e55b2-f16f-11cf-88cb-001111000030}", 0x0400),
//!     VirtualController::new(),
//!     SimBehavior::default(),
//! );
//!
//! let controller = McuController::new(ConnectionSession::new(platform));
//! assert!(controller.connect());
//! assert_eq!(controller.board_name(), "SEEWO-BOARD");
//! ```

pub mod controller;
pub mod platform;

pub use controller::{InputSource, VirtualController, VirtualControllerConfig};
pub use platform::{SimBehavior, SimDevice, SimHandle, SimPlatform, SimStats};
