//! Simulated host for `--simulate`

use mcu_detect::CandidateInterface;
use mcu_sim::{SimBehavior, SimPlatform, VirtualController};

/// Interface path of the simulated controller
pub const SIM_CONTROLLER_PATH: &str =
    r"\\?\hid#vid_1ff7&pid_0f21&mi_00&col02#7&2f9c1a&0&0001#{4d1e55b2-f16f-11cf-88cb-001111000030}";

/// A host with one controller and one unrelated keyboard
pub fn host() -> SimPlatform {
    let mut platform = SimPlatform::new();
    platform.add_bystander(CandidateInterface::new(
        r"\\?\hid#vid_046d&pid_c31c&mi_00#7&11a4&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}",
        0x6400,
    ));
    platform.add_controller(
        CandidateInterface::new(SIM_CONTROLLER_PATH, 0x0400),
        VirtualController::new(),
        SimBehavior::default(),
    );
    platform
}
