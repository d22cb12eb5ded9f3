//! Frame clock and session facade
//!
//! The host environment (browser rAF loop, terminal harness, tests) owns the
//! real clock and hands [`Session::advance`] wall-clock deltas in
//! milliseconds. The session clamps bad deltas, accumulates, and steps the
//! deterministic simulation at the fixed timestep. One-shot input intents are
//! consumed by the first step of a frame, mirroring how a per-frame input
//! queue drains.

use crate::consts::*;
use crate::sim::state::{GameEvent, GamePhase, GameState, Steer};
use crate::sim::tick::{TickInput, tick};
use crate::tuning::{Tuning, TuningError};

/// One live game session
pub struct Session {
    state: GameState,
    pending: TickInput,
    accumulator: f32,
    running: bool,
}

impl Session {
    pub fn new(seed: u64, tuning: Tuning) -> Result<Self, TuningError> {
        Ok(Self {
            state: GameState::new(seed, tuning)?,
            pending: TickInput::default(),
            accumulator: 0.0,
            running: true,
        })
    }

    /// Start from splash, or restart from a terminal screen
    pub fn request_start(&mut self) {
        self.pending.start = true;
        self.running = true;
    }

    /// Relative lane-change intent; the sim drops it unless the player has settled
    pub fn request_lane_change(&mut self, steer: Steer) {
        self.pending.steer = Some(steer);
    }

    /// Halt the cadence. A tick callback already in flight sees `running`
    /// false and exits without mutating state.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Advance by a wall-clock delta in milliseconds
    pub fn advance(&mut self, delta_ms: f32) {
        if !self.running {
            return;
        }
        if !(delta_ms > 0.0) {
            // Negative or NaN deltas come from clock skew; skip the frame
            return;
        }
        let delta_ms = if delta_ms > MAX_DELTA_MS {
            log::warn!("clamping {delta_ms:.0}ms frame delta");
            MAX_DELTA_MS
        } else {
            delta_ms
        };
        self.accumulator += delta_ms / 1000.0;

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            let input = self.pending.clone();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            steps += 1;
            self.pending.start = false;
            self.pending.steer = None;
            if matches!(self.state.phase, GamePhase::GameOver | GamePhase::LeadForm) {
                // Terminal transitions stop the cadence
                self.running = false;
                break;
            }
        }
    }

    /// Events emitted since the last drain, in emission order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Read-only view for the renderer and HUD
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.state.phase,
            score: self.state.player.score,
            power: self.state.player.power,
            shielded: self.state.player.shield_active(self.state.time),
            combo: self.state.combo,
            speed_mult: self.state.speed_mult,
            time_left: self.state.time_left,
            player: &self.state.player,
            npcs: &self.state.npcs,
            coins: &self.state.coins,
            powerups: &self.state.powerups,
            hazards: &self.state.hazards,
            particles: &self.state.particles,
        }
    }

    /// Full state access for hosts that need more than the snapshot
    pub fn state(&self) -> &GameState {
        &self.state
    }
}

/// Read-only world view; all slices hold live entities only
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub score: u32,
    pub power: f32,
    pub shielded: bool,
    pub combo: u32,
    pub speed_mult: f32,
    pub time_left: f32,
    pub player: &'a crate::sim::state::Player,
    pub npcs: &'a [crate::sim::state::Npc],
    pub coins: &'a [crate::sim::state::Coin],
    pub powerups: &'a [crate::sim::state::Powerup],
    pub hazards: &'a [crate::sim::state::Hazard],
    pub particles: &'a [crate::sim::state::Particle],
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn booted(seed: u64, tuning: Tuning) -> Session {
        let mut session = Session::new(seed, tuning).unwrap();
        session.request_start();
        // Two ticks: splash -> loading -> playing
        session.advance(40.0);
        session
    }

    #[test]
    fn test_huge_delta_is_clamped_to_substep_budget() {
        let mut session = booted(7, Tuning::default());
        let before = session.state().time;
        session.advance(10_000.0);
        let stepped = session.state().time - before;
        assert!(stepped <= MAX_SUBSTEPS as f32 * SIM_DT + 1e-4);
    }

    #[test]
    fn test_stopped_session_ignores_stale_ticks() {
        let mut session = booted(7, Tuning::default());
        let before = session.state().time;
        session.stop();
        session.advance(100.0);
        assert_eq!(session.state().time, before);
    }

    #[test]
    fn test_negative_delta_is_ignored() {
        let mut session = booted(7, Tuning::default());
        let before = session.state().time;
        session.advance(-16.0);
        assert_eq!(session.state().time, before);
    }

    #[test]
    fn test_terminal_phase_stops_the_cadence() {
        let mut tuning = Tuning::default();
        tuning.session_secs = 0.5;
        tuning.power_decay = 0.0;
        let mut session = booted(7, tuning);
        for _ in 0..120 {
            session.advance(1000.0 / 60.0);
        }
        assert_eq!(session.phase(), GamePhase::LeadForm);
        assert!(!session.is_running());

        let frozen = session.state().time;
        session.advance(16.0);
        assert_eq!(session.state().time, frozen);

        // Restart re-arms the cadence and resets the run
        session.request_start();
        session.advance(40.0);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.snapshot().score, 0);
    }

    #[test]
    fn test_snapshot_reflects_session_scalars() {
        let session = booted(7, Tuning::default());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.score, 0);
        assert!(snapshot.power > 0.0);
        assert!(!snapshot.shielded);
    }

    proptest! {
        /// Any two delta sequences with equal sums produce the identical
        /// session, tick for tick.
        #[test]
        fn test_power_decay_is_framerate_independent(
            deltas in proptest::collection::vec(1.0f32..60.0, 2..40)
        ) {
            let mut fine = booted(99, Tuning::default());
            let mut coarse = booted(99, Tuning::default());

            for pair in deltas.chunks(2) {
                for &delta in pair {
                    fine.advance(delta);
                }
                coarse.advance(pair.iter().sum::<f32>());
            }

            prop_assert_eq!(fine.state().time, coarse.state().time);
            prop_assert_eq!(fine.state().player.power, coarse.state().player.power);
            prop_assert_eq!(fine.state().npcs.len(), coarse.state().npcs.len());
        }
    }
}
