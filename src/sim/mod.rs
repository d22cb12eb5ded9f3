//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Timers run on accumulated sim time, never the wall clock
//! - No rendering or platform dependencies

pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Aabb, player_hits};
pub use spawn::{Spawner, run_spawns};
pub use state::{
    Body, CarKind, Coin, DamageCause, GameEvent, GamePhase, GameState, Hazard, HazardKind, Npc,
    Particle, Player, Powerup, PowerupKind, Steer,
};
pub use tick::{TickInput, tick};
