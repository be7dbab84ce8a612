//! Integration tests for the controller session
//!
//! These tests drive the session and the command facade against a simulated
//! HID platform:
//! - Discovery order, probing and device binding
//! - Request execution with retries, timeouts and mismatched replies
//! - Reconnect after read and write failures
//! - Stream resynchronization over garbage and short reads
//! - Facade sentinels and the event stream

use std::time::{Duration, Instant};

use mcu_detect::CandidateInterface;
use mcu_protocol::decode::{decode_board_text, decode_uid};
use mcu_protocol::McuCommand;
use mcu_session::{
    AttemptOutcome, ConnectionSession, McuController, SessionConfig, SessionError, SessionEvent,
    SessionState,
};
use mcu_sim::{InputSource, SimBehavior, SimDevice, SimPlatform, VirtualController, VirtualControllerConfig};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;
    use tokio::sync::broadcast;

    /// Short timings so failing attempts stay fast
    pub fn fast_config() -> SessionConfig {
        SessionConfig {
            read_timeout_ms: 20,
            attempts: 3,
            post_write_delay_ms: 0,
            confirm_acks: false,
        }
    }

    /// Windows-style interface path for a CVTE product id
    pub fn path(product_id: u16, instance: u32) -> String {
        format!(
            r"\\?\hid#vid_1ff7&pid_{:04x}&mi_00&col02#7&{:x}&0&0001#{{4d1e55b2-f16f-11cf-88cb-001111000030}}",
            product_id, instance
        )
    }

    /// A 551 B2 controller interface
    pub fn candidate(instance: u32) -> CandidateInterface {
        CandidateInterface::new(path(0x0F21, instance), 0x0400)
    }

    /// Platform with a single healthy controller
    pub fn single(behavior: SimBehavior) -> (SimPlatform, SimDevice) {
        let mut platform = SimPlatform::new();
        let device = platform.add_controller(candidate(1), VirtualController::new(), behavior);
        (platform, device)
    }

    pub fn session(platform: SimPlatform) -> ConnectionSession<SimPlatform> {
        ConnectionSession::with_config(platform, fast_config())
    }

    pub fn controller(platform: SimPlatform) -> McuController<SimPlatform> {
        McuController::new(session(platform)).with_volume_step_delay(Duration::ZERO)
    }

    pub fn connected(behavior: SimBehavior) -> (McuController<SimPlatform>, SimDevice) {
        let (platform, device) = single(behavior);
        let controller = controller(platform);
        assert!(controller.connect());
        (controller, device)
    }

    pub fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn attempts(events: &[SessionEvent]) -> Vec<(u32, AttemptOutcome)> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Attempt { attempt, outcome, .. } => Some((*attempt, outcome.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn has_reconnect(events: &[SessionEvent], success: bool) -> bool {
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::ReconnectFinished { success: s } if *s == success))
    }
}

// ============================================================================
// Discovery Tests
// ============================================================================

mod discovery_tests {
    use super::*;

    #[test]
    fn first_responsive_candidate_is_bound() {
        let mut platform = SimPlatform::new();
        platform.add_controller(
            helpers::candidate(1),
            VirtualController::new(),
            SimBehavior {
                open_fails: true,
                ..Default::default()
            },
        );
        platform.add_controller(
            helpers::candidate(2),
            VirtualController::new(),
            SimBehavior {
                write_fails: true,
                ..Default::default()
            },
        );
        let third = platform.add_controller(helpers::candidate(3), VirtualController::new(), SimBehavior::default());

        let mut session = helpers::session(platform);
        let bound = session.discover_and_connect().unwrap();

        assert_eq!(bound, helpers::candidate(3));
        assert_eq!(session.detected().get(), Some(&helpers::candidate(3)));
        assert_eq!(session.state(), SessionState::Verified);
        assert_eq!(third.with_controller(|c| c.probes()), Some(1));
    }

    #[test]
    fn no_responsive_candidate() {
        let mut platform = SimPlatform::new();
        for instance in 1..=2 {
            platform.add_controller(
                helpers::candidate(instance),
                VirtualController::new(),
                SimBehavior {
                    write_fails: true,
                    ..Default::default()
                },
            );
        }
        let mut session = helpers::session(platform);

        assert!(matches!(session.discover_and_connect(), Err(SessionError::NotFound)));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn empty_host_reports_not_found() {
        let mut session = helpers::session(SimPlatform::new());
        assert!(matches!(session.discover_and_connect(), Err(SessionError::NotFound)));
    }

    #[test]
    fn enumeration_failure_counts_as_no_candidates() {
        let (mut platform, _device) = helpers::single(SimBehavior::default());
        platform.set_enumeration_fails(true);
        let mut session = helpers::session(platform);

        assert!(session.list_candidates().is_empty());
        assert!(matches!(session.discover_and_connect(), Err(SessionError::NotFound)));
    }

    #[test]
    fn candidates_are_filtered_and_ranked() {
        let mut platform = SimPlatform::new();
        platform.add_bystander(CandidateInterface::new(
            r"\\?\hid#vid_046d&pid_c52b&mi_00#7&2&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}",
            0,
        ));
        platform.add_controller(helpers::candidate(1), VirtualController::new(), SimBehavior::default());
        let common = CandidateInterface::new(helpers::path(0x0F15, 9), 0);
        platform.add_controller(common.clone(), VirtualController::new(), SimBehavior::default());

        let mut session = helpers::session(platform);
        let ranked = session.list_candidates();

        assert_eq!(ranked, vec![common.clone(), helpers::candidate(1)]);
        // Listing binds a default without opening anything
        assert_eq!(session.detected().get(), Some(&common));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn bound_device_is_probed_first() {
        let mut platform = SimPlatform::new();
        let common = CandidateInterface::new(helpers::path(0x0F15, 9), 0);
        platform.add_controller(common, VirtualController::new(), SimBehavior::default());
        platform.add_controller(helpers::candidate(1), VirtualController::new(), SimBehavior::default());

        let mut session = helpers::session(platform);
        session.connect_to(helpers::candidate(1)).unwrap();

        assert_eq!(session.discover_and_connect().unwrap(), helpers::candidate(1));
    }

    #[test]
    fn connect_to_skips_probe() {
        let (platform, device) = helpers::single(SimBehavior::default());
        let controller = helpers::controller(platform);

        assert!(controller.connect_to(helpers::candidate(1)));
        assert_eq!(controller.state(), SessionState::Connected);
        assert_eq!(device.with_controller(|c| c.probes()), Some(0));
        assert_eq!(controller.board_name(), "SEEWO-BOARD");
    }

    #[test]
    fn connect_to_missing_path_fails() {
        let (platform, _device) = helpers::single(SimBehavior::default());
        let controller = helpers::controller(platform);

        assert!(!controller.connect_to(helpers::candidate(7)));
        assert_eq!(controller.state(), SessionState::Disconnected);
    }

    #[test]
    fn connect_to_unopenable_path_is_not_found() {
        let (platform, _device) = helpers::single(SimBehavior {
            open_fails: true,
            ..Default::default()
        });
        let mut session = helpers::session(platform);

        assert!(matches!(
            session.connect_to(helpers::candidate(1)),
            Err(SessionError::NotFound)
        ));
        assert!(matches!(
            session.connect_to(helpers::candidate(7)),
            Err(SessionError::NotFound)
        ));
        assert!(!session.detected().is_set());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (controller, _device) = helpers::connected(SimBehavior::default());
        let mut rx = controller.subscribe();

        controller.disconnect();
        controller.disconnect();

        let events = helpers::drain(&mut rx);
        let closes = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::StateChanged { to: SessionState::Disconnected, .. }))
            .count();
        assert_eq!(closes, 1);
        assert!(!controller.is_connected());
    }

    #[test]
    fn connect_emits_probe_and_state_events() {
        let (platform, _device) = helpers::single(SimBehavior::default());
        let controller = helpers::controller(platform);
        let mut rx = controller.subscribe();

        assert!(controller.connect());

        let events = helpers::drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::ProbeResult { success: true, .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::StateChanged {
                from: SessionState::Connected,
                to: SessionState::Verified
            }
        )));
    }
}

// ============================================================================
// Request Execution Tests
// ============================================================================

mod execution_tests {
    use super::*;

    #[test]
    fn queries_decode_replies() {
        let (controller, _device) = helpers::connected(SimBehavior::default());

        assert_eq!(controller.board_name(), "SEEWO-BOARD");
        assert_eq!(controller.ip(), "192.168.1.20");
        assert_eq!(controller.uid(), "00 11 22 33 44 55 66 77 88 99 aa bb");
        assert_eq!(controller.touch_size(), 86);
        assert_eq!(controller.firmware_version(), "CV86_T2.1.0");
    }

    #[test]
    fn dropped_reply_is_retried() {
        let (controller, _device) = helpers::connected(SimBehavior {
            drop_replies: 1,
            ..Default::default()
        });
        let mut rx = controller.subscribe();

        assert_eq!(controller.board_name(), "SEEWO-BOARD");

        let attempts = helpers::attempts(&helpers::drain(&mut rx));
        assert_eq!(
            attempts,
            vec![(1, AttemptOutcome::Timeout), (2, AttemptOutcome::Decoded)]
        );
    }

    #[test]
    fn silent_device_times_out() {
        let (platform, _device) = helpers::single(SimBehavior {
            silent: true,
            ..Default::default()
        });
        let stats = platform.stats();
        let mut session = helpers::session(platform);
        session.discover_and_connect().unwrap();
        let writes_before = stats.writes();

        let result = session.execute(&McuCommand::BoardName.frame(), decode_board_text, 3);

        assert!(matches!(result, Err(SessionError::ReadTimeout { attempts: 3 })));
        assert_eq!(stats.writes() - writes_before, 3);
        // Timeouts keep the connection
        assert_eq!(session.state(), SessionState::Verified);
    }

    #[test]
    fn per_call_timeout_overrides_config() {
        let (platform, _device) = helpers::single(SimBehavior {
            silent: true,
            ..Default::default()
        });
        let mut session = ConnectionSession::with_config(
            platform,
            SessionConfig {
                read_timeout_ms: 5_000,
                ..helpers::fast_config()
            },
        );
        session.discover_and_connect().unwrap();

        let started = Instant::now();
        let result = session.execute_with_timeout(
            &McuCommand::BoardName.frame(),
            decode_board_text,
            2,
            Duration::from_millis(10),
        );

        assert!(matches!(result, Err(SessionError::ReadTimeout { attempts: 2 })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn unexpected_replies_are_malformed() {
        let (platform, _device) = helpers::single(SimBehavior::default());
        let mut session = helpers::session(platform);
        session.discover_and_connect().unwrap();

        let result = session.execute(&McuCommand::Uid.frame(), decode_board_text, 2);

        assert!(matches!(result, Err(SessionError::MalformedFrame { attempts: 2 })));
    }

    #[test]
    fn execute_requires_connection() {
        let (platform, _device) = helpers::single(SimBehavior::default());
        let mut session = helpers::session(platform);

        let result = session.execute(&McuCommand::Uid.frame(), decode_uid, 3);
        assert!(matches!(result, Err(SessionError::NotConnected)));
        assert!(matches!(
            session.send(&McuCommand::VolumeUp.frame()),
            Err(SessionError::NotConnected)
        ));
    }

    #[test]
    fn garbage_and_short_reads_are_tolerated() {
        let (controller, _device) = helpers::connected(SimBehavior {
            garbage_prefix: vec![0x00, 0xFC, 0xA5, 0x13, 0xFC],
            chunk_size: 5,
            ..Default::default()
        });

        assert_eq!(controller.uid(), "00 11 22 33 44 55 66 77 88 99 aa bb");
        assert_eq!(controller.board_name(), "SEEWO-BOARD");
    }

    #[test]
    fn stray_frame_before_reply_is_skipped() {
        let (controller, device) = helpers::connected(SimBehavior::default());
        let stray = mcu_protocol::encode(0x34, 0x11, b"10.0.0.1").unwrap();
        device.inject(stray.as_bytes());

        assert_eq!(controller.board_name(), "SEEWO-BOARD");
    }
}

// ============================================================================
// Reconnect Tests
// ============================================================================

mod reconnect_tests {
    use super::*;

    #[test]
    fn write_failure_is_not_retried() {
        let (platform, device) = helpers::single(SimBehavior::default());
        let stats = platform.stats();
        let mut session = helpers::session(platform);
        session.discover_and_connect().unwrap();
        let mut rx = session.subscribe();

        device.update_behavior(|b| b.write_fails = true);
        let result = session.execute(&McuCommand::BoardName.frame(), decode_board_text, 3);

        assert!(matches!(result, Err(SessionError::WriteFailed)));
        assert_eq!(stats.reads(), 0);
        assert!(helpers::has_reconnect(&helpers::drain(&mut rx), false));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn read_error_triggers_one_reconnect() {
        let (controller, _device) = helpers::connected(SimBehavior {
            read_errors: 1,
            ..Default::default()
        });
        let mut rx = controller.subscribe();

        assert_eq!(controller.board_name(), "SEEWO-BOARD");

        let events = helpers::drain(&mut rx);
        assert!(helpers::has_reconnect(&events, true));
        assert_eq!(controller.state(), SessionState::Verified);
    }

    #[test]
    fn read_error_on_last_attempt_is_retried_after_reconnect() {
        let (platform, _device) = helpers::single(SimBehavior {
            read_errors: 1,
            ..Default::default()
        });
        let mut session = helpers::session(platform);
        session.discover_and_connect().unwrap();
        let mut rx = session.subscribe();

        let result = session.execute(&McuCommand::BoardName.frame(), decode_board_text, 1);

        assert_eq!(result.unwrap(), "SEEWO-BOARD");
        let events = helpers::drain(&mut rx);
        assert!(helpers::has_reconnect(&events, true));
        let outcomes = helpers::attempts(&events);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], (1, AttemptOutcome::ReadError(_))));
        assert_eq!(outcomes[1], (1, AttemptOutcome::Decoded));
    }

    #[test]
    fn second_read_error_gives_up() {
        let (platform, _device) = helpers::single(SimBehavior {
            read_errors: 2,
            ..Default::default()
        });
        let mut session = helpers::session(platform);
        session.discover_and_connect().unwrap();
        let mut rx = session.subscribe();

        let result = session.execute(&McuCommand::BoardName.frame(), decode_board_text, 3);

        assert!(matches!(result, Err(SessionError::ReadTimeout { attempts: 3 })));
        let reconnects = helpers::drain(&mut rx)
            .iter()
            .filter(|e| matches!(e, SessionEvent::ReconnectStarted))
            .count();
        assert_eq!(reconnects, 1);
    }

    #[test]
    fn unplug_and_replug() {
        let (controller, device) = helpers::connected(SimBehavior::default());

        device.unplug();
        assert_eq!(controller.board_name(), "");
        assert!(!controller.is_connected());

        device.replug();
        assert!(controller.connect());
        assert_eq!(controller.board_name(), "SEEWO-BOARD");
    }
}

// ============================================================================
// Facade Tests
// ============================================================================

mod facade_tests {
    use super::*;

    #[test]
    fn sentinels_when_not_connected() {
        let (platform, _device) = helpers::single(SimBehavior::default());
        let stats = platform.stats();
        let controller = helpers::controller(platform);

        assert_eq!(controller.board_name(), "");
        assert_eq!(controller.ip(), "");
        assert_eq!(controller.uid(), "");
        assert_eq!(controller.touch_size(), -1);
        assert_eq!(controller.firmware_version(), "");
        assert!(!controller.volume_up());
        assert!(!controller.switch_hdmi1());
        assert!(!controller.set_pen(true));
        assert!(controller.device_info().is_none());
        assert_eq!(stats.writes(), 0);
    }

    #[test]
    fn write_only_commands_reach_the_board() {
        let (controller, device) = helpers::connected(SimBehavior::default());

        assert!(controller.switch_hdmi1());
        assert!(controller.set_pen(false));
        assert!(controller.volume_down());

        assert_eq!(device.with_controller(|c| c.input()), Some(InputSource::Hdmi1));
        assert_eq!(device.with_controller(|c| c.pen_enabled()), Some(false));
        assert_eq!(device.with_controller(|c| c.volume()), Some(29));
    }

    #[test]
    fn volume_steps() {
        let (controller, device) = helpers::connected(SimBehavior::default());

        let up = controller.volume(3);
        assert!(up.is_complete());
        assert_eq!(up.succeeded, 3);
        assert_eq!(device.with_controller(|c| c.volume()), Some(33));

        let down = controller.volume(-2);
        assert_eq!(down.requested, 2);
        assert_eq!(device.with_controller(|c| c.volume()), Some(31));

        assert!(controller.volume(0).is_complete());
    }

    #[test]
    fn volume_stops_at_first_failure() {
        let (controller, device) = helpers::connected(SimBehavior::default());
        device.update_behavior(|b| b.write_fails = true);

        let outcome = controller.volume(4);

        assert_eq!(outcome.requested, 4);
        assert_eq!(outcome.succeeded, 0);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn confirmed_commands_wait_for_ack() {
        let mut platform = SimPlatform::new();
        let acking = VirtualController::from_config(VirtualControllerConfig {
            acks: true,
            ..Default::default()
        });
        platform.add_controller(helpers::candidate(1), acking, SimBehavior::default());
        let config = SessionConfig {
            confirm_acks: true,
            ..helpers::fast_config()
        };
        let controller = McuController::new(ConnectionSession::with_config(platform, config));

        assert!(controller.connect());
        assert!(controller.volume_up());
    }

    #[test]
    fn missing_ack_fails_command() {
        let (platform, _device) = helpers::single(SimBehavior::default());
        let config = SessionConfig {
            confirm_acks: true,
            attempts: 1,
            ..helpers::fast_config()
        };
        let controller = McuController::new(ConnectionSession::with_config(platform, config));

        assert!(controller.connect());
        assert!(!controller.volume_up());
        // The write itself went through
        assert!(controller.is_connected());
    }

    #[test]
    fn device_info_names_the_variant() {
        let (controller, _device) = helpers::connected(SimBehavior::default());
        let info = controller.device_info().unwrap();

        assert_eq!(info.path, helpers::path(0x0F21, 1));
        assert_eq!(info.vendor_id, Some(0x1FF7));
        assert_eq!(info.product_id, Some(0x0F21));
        assert_eq!(info.revision, 0x0400);
        assert_eq!(info.variant, Some("551 B2"));
    }

    #[tokio::test]
    async fn operations_run_off_the_async_thread() {
        let (controller, _device) = helpers::connected(SimBehavior::default());

        let name = controller.run(|c| c.board_name()).await.unwrap();
        assert_eq!(name, "SEEWO-BOARD");

        let handle = controller.spawn(|c| c.touch_size());
        assert_eq!(handle.await.unwrap(), 86);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn reply_survives_any_chunking(
            chunk_size in 1usize..=64,
            garbage in proptest::collection::vec(0x00u8..0xF0, 0..12),
        ) {
            let (controller, _device) = helpers::connected(SimBehavior {
                garbage_prefix: garbage,
                chunk_size,
                ..Default::default()
            });

            prop_assert_eq!(controller.uid(), "00 11 22 33 44 55 66 77 88 99 aa bb");
        }
    }
}
