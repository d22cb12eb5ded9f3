//! Lane Rush - a three-lane arcade traffic dodger
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, spawning, collisions, session state)
//! - `driver`: Frame clock feeding the simulation fixed steps from wall-clock deltas
//! - `tuning`: Data-driven game balance

pub mod driver;
pub mod sim;
pub mod tuning;

pub use driver::{Session, Snapshot};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frame deltas above this are clamped (backgrounded tabs, debugger stalls)
    pub const MAX_DELTA_MS: f32 = 250.0;

    /// Playfield dimensions; y grows downward, traffic scrolls toward +y
    pub const FIELD_WIDTH: f32 = 420.0;
    pub const FIELD_HEIGHT: f32 = 640.0;
    /// Entities this far past the bottom edge are despawned
    pub const DESPAWN_MARGIN: f32 = 80.0;
    /// Spawn line above the top edge
    pub const SPAWN_Y: f32 = -60.0;
    pub const LANE_COUNT: usize = 3;

    /// Player car
    pub const PLAYER_Y: f32 = 520.0;
    pub const PLAYER_WIDTH: f32 = 34.0;
    pub const PLAYER_HEIGHT: f32 = 62.0;
    /// Lane-change progress per second (full change in 0.2 s)
    pub const LANE_CHANGE_RATE: f32 = 5.0;

    /// NPC traffic
    pub const NPC_BASE_SPEED: f32 = 150.0;
    pub const NPC_SPEED_SPREAD: f32 = 45.0;
    pub const NPC_WOBBLE_AMP: f32 = 3.5;
    pub const NPC_WOBBLE_RATE: f32 = 2.2;
    /// Per-second chance an eligible NPC starts a dash
    pub const NPC_DASH_CHANCE: f32 = 0.08;
    pub const NPC_DASH_SPEED: f32 = 120.0;
    pub const NPC_DASH_MIN_SECS: f32 = 0.35;
    pub const NPC_DASH_MAX_SECS: f32 = 0.9;
    pub const NPC_MIGRATE_MIN_SECS: f32 = 7.0;
    pub const NPC_MIGRATE_MAX_SECS: f32 = 16.0;
    /// Duration of one eased lane migration
    pub const NPC_MIGRATE_SECS: f32 = 1.1;

    /// Reactive avoidance window around the player
    pub const AVOID_WINDOW_X: f32 = 48.0;
    pub const AVOID_WINDOW_Y: f32 = 110.0;
    pub const AVOID_PUSH: f32 = 220.0;
    pub const AVOID_MAX: f32 = 60.0;
    /// Offset decay per tick when the player is out of range
    pub const AVOID_DECAY: f32 = 0.9;
    /// Extra sideways kick when the player actually makes contact
    pub const AVOID_NUDGE: f32 = 18.0;

    /// Collectibles and hazards
    pub const COIN_SIZE: f32 = 18.0;
    pub const COIN_SPEED: f32 = 140.0;
    pub const COIN_BOB_AMP: f32 = 2.5;
    pub const COIN_BOB_RATE: f32 = 3.0;
    pub const POWERUP_SIZE: f32 = 24.0;
    pub const POWERUP_SPEED: f32 = 135.0;
    pub const HAZARD_SPEED: f32 = 155.0;
    pub const HAZARD_BLINK_RATE: f32 = 6.0;

    /// Particles
    pub const MAX_PARTICLES: usize = 256;
    pub const PARTICLE_GRAVITY: f32 = 260.0;
    pub const BURST_COUNT: usize = 14;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep, clamped to [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
