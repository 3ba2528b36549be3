// src/main.rs
// Entry point for Pibot: loads configuration, assembles the robot on the
// simulated backend and runs the tracking loop over a detection script.
//
// Usage: pibot [config.yaml] [script.yaml]
// Without a script a short built-in run is replayed (target lost, found, lost
// again). Set RUST_LOG=debug to see every servo and wheel command.

use log::{error, info};
use pibot::interface::{LogDisplay, ScriptedVision, SimControls, SimHardware};
use pibot::{Detection, Frame, Pibot, PibotConfig, Robot};
use std::error::Error;

/// Frames replayed when no script is given.
fn demo_frames() -> Vec<Frame> {
    let mut frames = vec![Frame::NoTarget; 5];
    frames.push(Frame::Target(Detection::new(160.0, 120.0, 50.0)));
    frames.extend(std::iter::repeat(Frame::NoTarget).take(10));
    frames
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging for debugging
    env_logger::init();
    info!("Starting Pibot...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => PibotConfig::load(&path)?,
        None => PibotConfig::default(),
    };
    let mut vision = match args.next() {
        Some(path) => ScriptedVision::load(&path)?,
        None => ScriptedVision::new(demo_frames()),
    };

    // A servo on the wrong output aborts here
    let hardware = SimHardware::new();
    let robot = match Robot::simulated(&hardware, &config) {
        Ok(robot) => robot,
        Err(e) => {
            error!("Robot initialization failed: {}", e);
            return Err(e.into());
        }
    };

    let mut pibot = Pibot::new(config, robot)?;
    let mut controls = SimControls::new(0);
    if !pibot.wait_for_start(&mut controls) {
        return Ok(());
    }

    let mut display = LogDisplay::new();
    let summary = pibot.run(&mut vision, Some(&mut display), &mut controls)?;
    info!(
        "Run finished: {} frames, final mode {}",
        summary.frames, summary.final_mode
    );

    let log = hardware.log();
    info!(
        "{} wheel commands, {} indicator changes",
        log.wheel_commands(),
        log.light_switches()
    );
    Ok(())
}
