//! Time- and population-gated entity spawning
//!
//! Each category runs an independent cooldown against accumulated sim time.
//! NPC traffic additionally enforces a longitudinal gap to every live car and
//! a per-lane density limit; a blocked attempt is a silent no-op and keeps the
//! cooldown hot, so traffic resumes the moment the road clears. The other
//! categories re-arm their timer on every attempt - only a probability gate
//! stands after the cooldown.
//!
//! Spawn velocities bake in the speed multiplier in force at creation time;
//! later difficulty boosts never rescale cars already on the road.

use rand::Rng;

use crate::consts::*;

use super::state::{CarKind, Coin, GameState, Hazard, HazardKind, Npc, Powerup, PowerupKind};

/// Per-category cooldown clocks, in seconds of sim time
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    pub npc_elapsed: f32,
    pub coin_elapsed: f32,
    pub powerup_elapsed: f32,
    pub hazard_elapsed: f32,
}

/// Run all spawn categories for one tick
pub fn run_spawns(state: &mut GameState, dt: f32) {
    state.spawner.npc_elapsed += dt;
    state.spawner.coin_elapsed += dt;
    state.spawner.powerup_elapsed += dt;
    state.spawner.hazard_elapsed += dt;

    if state.spawner.npc_elapsed >= state.tuning.npc.interval && try_spawn_npc(state) {
        state.spawner.npc_elapsed = 0.0;
    }
    if state.spawner.coin_elapsed >= state.tuning.coin.interval {
        state.spawner.coin_elapsed = 0.0;
        try_spawn_coin(state);
    }
    if state.spawner.powerup_elapsed >= state.tuning.powerup.interval {
        state.spawner.powerup_elapsed = 0.0;
        try_spawn_powerup(state);
    }
    if state.spawner.hazard_elapsed >= state.tuning.hazard.interval {
        state.spawner.hazard_elapsed = 0.0;
        try_spawn_hazard(state);
    }
}

fn try_spawn_npc(state: &mut GameState) -> bool {
    if state.npcs.len() >= state.tuning.npc.cap {
        return false;
    }
    if !state.rng.random_bool(f64::from(state.tuning.npc.chance)) {
        return false;
    }
    let lane = state.rng.random_range(0..LANE_COUNT);
    let in_lane = state.npcs.iter().filter(|npc| npc.lane == lane).count();
    if in_lane >= state.tuning.npc_lane_cap {
        return false;
    }
    // Gap check against every live car, not just the chosen lane
    let too_close = state
        .npcs
        .iter()
        .any(|npc| (npc.body.pos.y - SPAWN_Y).abs() < state.tuning.npc_min_gap);
    if too_close {
        return false;
    }
    let kind = CarKind::ALL[state.rng.random_range(0..CarKind::ALL.len())];
    let spread = state.rng.random_range(-NPC_SPEED_SPREAD..NPC_SPEED_SPREAD);
    let vy = (NPC_BASE_SPEED + spread) * state.speed_mult;
    let id = state.next_entity_id();
    let x = state.tuning.lane_xs[lane];
    let npc = Npc::new(id, lane, kind, x, vy, &mut state.rng);
    state.npcs.push(npc);
    true
}

fn try_spawn_coin(state: &mut GameState) {
    if state.coins.len() >= state.tuning.coin.cap {
        return;
    }
    if !state.rng.random_bool(f64::from(state.tuning.coin.chance)) {
        return;
    }
    let lane = state.rng.random_range(0..LANE_COUNT);
    let vy = COIN_SPEED * state.speed_mult;
    let bob_phase = state.rng.random_range(0.0..std::f32::consts::TAU);
    let id = state.next_entity_id();
    state
        .coins
        .push(Coin::new(id, lane, state.tuning.lane_xs[lane], vy, bob_phase));
}

fn try_spawn_powerup(state: &mut GameState) {
    if state.powerups.len() >= state.tuning.powerup.cap {
        return;
    }
    if !state.rng.random_bool(f64::from(state.tuning.powerup.chance)) {
        return;
    }
    let lane = state.rng.random_range(0..LANE_COUNT);
    let vy = POWERUP_SPEED * state.speed_mult;
    let id = state.next_entity_id();
    state.powerups.push(Powerup::new(
        id,
        lane,
        PowerupKind::Shield,
        state.tuning.lane_xs[lane],
        vy,
    ));
}

fn try_spawn_hazard(state: &mut GameState) {
    if state.hazards.len() >= state.tuning.hazard.cap {
        return;
    }
    if !state.rng.random_bool(f64::from(state.tuning.hazard.chance)) {
        return;
    }
    let lane = state.rng.random_range(0..LANE_COUNT);
    let kind = HazardKind::ALL[state.rng.random_range(0..HazardKind::ALL.len())];
    let vy = HAZARD_SPEED * state.speed_mult;
    let id = state.next_entity_id();
    state
        .hazards
        .push(Hazard::new(id, lane, kind, state.tuning.lane_xs[lane], vy));
}
