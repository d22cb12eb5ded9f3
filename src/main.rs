//! Lane Rush headless demo
//!
//! Drives a full session at a simulated 60 fps with a scripted steering
//! sweep, logging every event the core emits. Useful for eyeballing balance
//! changes without a renderer: `RUST_LOG=info cargo run -- <seed>`.

use std::process;

use lane_rush::sim::state::{GameEvent, GamePhase, Steer};
use lane_rush::{Session, Tuning};

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0x5EED);

    let mut session = match Session::new(seed, Tuning::default()) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("bad tuning: {err}");
            process::exit(1);
        }
    };
    session.request_start();

    let frame_ms = 1000.0 / 60.0;
    let mut frame: u64 = 0;
    loop {
        // Sweep across the lanes so the demo actually dodges something
        if frame % 75 == 0 {
            let steer = if (frame / 75) % 2 == 0 {
                Steer::Left
            } else {
                Steer::Right
            };
            session.request_lane_change(steer);
        }

        session.advance(frame_ms);
        for event in session.drain_events() {
            match event {
                GameEvent::Scored { points } => log::info!("scored {points}"),
                GameEvent::ComboStreak { count } => log::info!("combo x{count}"),
                GameEvent::Damaged { amount, cause } => {
                    log::info!("hit by {cause:?} for {amount}")
                }
                GameEvent::ShieldActivated => log::info!("shield up"),
                GameEvent::SpeedTier { multiplier } => log::info!("traffic speed x{multiplier}"),
                GameEvent::SessionWon => log::info!("made it to the end"),
                GameEvent::SessionLost => log::info!("ran out of power"),
            }
        }

        if matches!(session.phase(), GamePhase::GameOver | GamePhase::LeadForm) {
            break;
        }
        frame += 1;
        if frame > 60 * 90 {
            // Safety stop well past any configured session length
            break;
        }
    }

    let snapshot = session.snapshot();
    println!(
        "seed {seed:#x} | phase {:?} | score {} | power {:.0} | time left {:.1}s",
        snapshot.phase, snapshot.score, snapshot.power, snapshot.time_left
    );
}
