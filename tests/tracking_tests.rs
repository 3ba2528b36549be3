// tests/tracking_tests.rs
// Drives the tracking controller frame by frame on the simulated robot and
// checks gimbal, wheel and indicator output.

use pibot::core::Light;
use pibot::interface::SimHardware;
use pibot::{Detection, Frame, Mode, PibotConfig, Robot, TrackingController};

fn setup() -> (SimHardware, Robot, TrackingController) {
    let mut config = PibotConfig::default();
    config.idle_settle_ms = 0;
    let hw = SimHardware::new();
    let robot = Robot::simulated(&hw, &config).expect("simulated robot");
    let controller = TrackingController::new(&config);
    (hw, robot, controller)
}

fn target(x: f64, y: f64, radius: f64) -> Frame {
    Frame::Target(Detection::new(x, y, radius))
}

#[test]
fn lost_then_found_then_lost_again() {
    let (hw, mut robot, mut controller) = setup();

    for _ in 0..4 {
        assert_eq!(controller.on_frame(&mut robot, &Frame::NoTarget), Mode::Idle);
    }
    assert_eq!(controller.on_frame(&mut robot, &Frame::NoTarget), Mode::Scan);
    // Centred gimbal: the sweep starts 45 degrees to the right
    assert_eq!(robot.gimbal().pan().angle(), 45.0);

    assert_eq!(controller.on_frame(&mut robot, &target(160.0, 120.0, 50.0)), Mode::Follow);
    assert_eq!(robot.gimbal().pan().angle(), 45.0);
    assert_eq!(robot.gimbal().tilt().angle(), 0.0);
    assert_eq!(hw.log().wheel_speeds(), (100.0, 10.0));
    assert_eq!(controller.scan_state().ticks(), None);

    for _ in 0..4 {
        assert_eq!(controller.on_frame(&mut robot, &Frame::NoTarget), Mode::Follow);
    }
    assert_eq!(controller.on_frame(&mut robot, &Frame::NoTarget), Mode::Scan);

    // Fresh pattern seeded from where the camera was last pointing
    let pattern = controller.scan_state().pattern().expect("pattern");
    assert_eq!(pattern.get(0).unwrap().x, 90.0);
    assert_eq!(controller.scan_state().ticks(), Some(1));

    for _ in 0..5 {
        controller.on_frame(&mut robot, &Frame::NoTarget);
    }
    assert_eq!(controller.scan_state().ticks(), Some(6));

    assert_eq!(
        hw.log().light_writes(),
        &[Light::Blue, Light::Red, Light::Yellow, Light::Green, Light::Red]
    );
    assert_eq!(hw.log().active_lights(), &[Light::Red]);
}

#[test]
fn four_dropped_frames_do_not_start_a_scan() {
    let (_hw, mut robot, mut controller) = setup();
    controller.on_frame(&mut robot, &target(160.0, 120.0, 40.0));

    for _ in 0..4 {
        controller.on_frame(&mut robot, &Frame::NoTarget);
    }
    assert_eq!(controller.on_frame(&mut robot, &target(160.0, 120.0, 40.0)), Mode::Follow);
    assert_eq!(controller.scan_state().pattern(), None);
    assert_eq!(controller.lost_frames(), 0);
}

#[test]
fn tiny_blobs_count_as_lost_frames() {
    let (_hw, mut robot, mut controller) = setup();
    for _ in 0..4 {
        controller.on_frame(&mut robot, &Frame::NoTarget);
    }
    assert_eq!(controller.on_frame(&mut robot, &target(160.0, 120.0, 0.05)), Mode::Scan);
}

#[test]
fn target_left_of_centre_curves_left() {
    let (hw, mut robot, mut controller) = setup();
    controller.on_frame(&mut robot, &target(0.0, 120.0, 50.0));

    assert_eq!(robot.gimbal().pan().angle(), -10.0);
    assert_eq!(hw.log().wheel_speeds(), (80.0, 100.0));
    assert_eq!(controller.mode(), Mode::Follow);
}

#[test]
fn centred_pan_drives_straight() {
    let (hw, mut robot, mut controller) = setup();
    controller.on_frame(&mut robot, &target(160.0, 120.0, 50.0));
    assert_eq!(hw.log().wheel_speeds(), (100.0, 100.0));
}

#[test]
fn correction_accumulates_over_frames() {
    let (_hw, mut robot, mut controller) = setup();
    for _ in 0..3 {
        controller.on_frame(&mut robot, &target(240.0, 60.0, 30.0));
    }
    assert!((robot.gimbal().pan().angle() - 15.0).abs() < 1e-9);
    assert!((robot.gimbal().tilt().angle() - 15.0).abs() < 1e-9);
}

#[test]
fn target_overhead_stops_the_robot() {
    let (hw, mut robot, mut controller) = setup();
    controller.on_frame(&mut robot, &target(160.0, 0.0, 30.0));
    assert_eq!(controller.mode(), Mode::Follow);

    // Second frame pushes the tilt to 20 degrees, above the stop threshold
    controller.on_frame(&mut robot, &target(160.0, 0.0, 30.0));
    assert_eq!(robot.gimbal().tilt().angle(), 20.0);
    assert_eq!(hw.log().wheel_speeds(), (0.0, 0.0));
    assert_eq!(controller.mode(), Mode::Track);
}

#[test]
fn close_target_turns_in_place() {
    let (hw, mut robot, mut controller) = setup();
    controller.on_frame(&mut robot, &target(240.0, 120.0, 100.0));

    assert_eq!(robot.gimbal().pan().angle(), 5.0);
    assert_eq!(hw.log().wheel_speeds(), (5.0, -5.0));
    assert_eq!(controller.mode(), Mode::Track);
}

#[test]
fn steady_tracking_writes_the_indicator_once() {
    let (hw, mut robot, mut controller) = setup();
    for _ in 0..3 {
        controller.on_frame(&mut robot, &target(200.0, 120.0, 100.0));
    }
    assert_eq!(hw.log().light_writes(), &[Light::Blue, Light::Yellow]);
}

#[test]
fn following_flips_through_track_each_frame() {
    let (hw, mut robot, mut controller) = setup();
    controller.on_frame(&mut robot, &target(160.0, 120.0, 40.0));
    controller.on_frame(&mut robot, &target(160.0, 120.0, 40.0));

    assert_eq!(
        hw.log().light_writes(),
        &[Light::Blue, Light::Yellow, Light::Green, Light::Yellow, Light::Green]
    );
    assert_eq!(hw.log().active_lights(), &[Light::Green]);
}
