//! Game state and core simulation types
//!
//! Everything that evolves during a session lives here: the player, the
//! traffic, collectibles, hazards, particles, and the session-level scalars
//! (clock, score, difficulty latches). All of it is owned by [`GameState`];
//! entities never hold references to each other.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::tuning::{Tuning, TuningError};
use crate::{lerp, smoothstep};

use super::spawn::Spawner;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Title screen, waiting for a start request
    Splash,
    /// Host is preparing assets; the next tick enters Playing
    Loading,
    /// Active gameplay - the only phase that runs the simulation
    Playing,
    /// Run ended by power hitting zero
    GameOver,
    /// Run survived the full timer; host shows the lead-capture panel
    LeadForm,
}

/// Relative steering intent, pre-validated by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

impl Steer {
    pub fn delta(self) -> i32 {
        match self {
            Steer::Left => -1,
            Steer::Right => 1,
        }
    }
}

/// What hit the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCause {
    Npc,
    Hazard,
}

/// Discrete notifications for UI/audio collaborators, drained once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Scored { points: u32 },
    ComboStreak { count: u32 },
    /// amount is 0 when the shield soaked an NPC contact
    Damaged { amount: f32, cause: DamageCause },
    ShieldActivated,
    /// Difficulty tier changed; affects newly spawned traffic only
    SpeedTier { multiplier: f32 },
    SessionWon,
    SessionLost,
}

/// Shared position/velocity/active record embedded in every entity
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub pos: Vec2,
    /// Half extents of the bounding box
    pub half: Vec2,
    pub vel: Vec2,
    /// false = eligible for removal; never rendered, never collides
    pub active: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            half: size * 0.5,
            vel: Vec2::ZERO,
            active: true,
        }
    }

    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    /// Scrolled past the bottom despawn line
    pub fn past_bottom(&self) -> bool {
        self.pos.y - self.half.y > FIELD_HEIGHT + DESPAWN_MARGIN
    }
}

/// The player's car
#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub current_lane: usize,
    pub target_lane: usize,
    /// 0..=1; 1 = settled on `current_lane`
    pub lane_progress: f32,
    pub power: f32,
    /// Sim-time expiry of the shield; None = never picked one up
    pub shield_until: Option<f32>,
    pub score: u32,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        let lane = LANE_COUNT / 2;
        Self {
            body: Body::new(
                Vec2::new(tuning.lane_xs[lane], PLAYER_Y),
                Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            ),
            current_lane: lane,
            target_lane: lane,
            lane_progress: 1.0,
            power: tuning.power_max,
            shield_until: None,
            score: 0,
        }
    }

    pub fn settled(&self) -> bool {
        self.lane_progress >= 1.0
    }

    /// Accepts a steer only when the previous change has settled.
    /// The target clamps to the outer lanes, so steering off the road is a no-op.
    pub fn request_lane_change(&mut self, steer: Steer) -> bool {
        if !self.settled() {
            return false;
        }
        let target =
            (self.current_lane as i32 + steer.delta()).clamp(0, LANE_COUNT as i32 - 1) as usize;
        if target == self.current_lane {
            return false;
        }
        self.target_lane = target;
        self.lane_progress = 0.0;
        true
    }

    pub fn shield_active(&self, now: f32) -> bool {
        self.shield_until.is_some_and(|until| now < until)
    }

    /// x is always the lane-interpolated position; cosmetics never leak into it
    pub fn update(&mut self, dt: f32, lane_xs: &[f32; LANE_COUNT], power_decay: f32) {
        if self.lane_progress < 1.0 {
            self.lane_progress = (self.lane_progress + LANE_CHANGE_RATE * dt).min(1.0);
            if self.lane_progress >= 1.0 {
                self.current_lane = self.target_lane;
            }
        }
        let from = lane_xs[self.current_lane];
        let to = lane_xs[self.target_lane];
        self.body.pos.x = lerp(from, to, smoothstep(self.lane_progress));
        self.power = (self.power - power_decay * dt).max(0.0);
    }
}

/// NPC car body styles; chosen at spawn and fixed for the car's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarKind {
    Sedan,
    Hatch,
    Taxi,
    Pickup,
    Van,
    Bus,
}

impl CarKind {
    pub const ALL: [CarKind; 6] = [
        CarKind::Sedan,
        CarKind::Hatch,
        CarKind::Taxi,
        CarKind::Pickup,
        CarKind::Van,
        CarKind::Bus,
    ];

    pub fn size(self) -> Vec2 {
        match self {
            CarKind::Sedan => Vec2::new(30.0, 56.0),
            CarKind::Hatch => Vec2::new(28.0, 50.0),
            CarKind::Taxi => Vec2::new(30.0, 56.0),
            CarKind::Pickup => Vec2::new(32.0, 60.0),
            CarKind::Van => Vec2::new(34.0, 66.0),
            CarKind::Bus => Vec2::new(36.0, 84.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    from_x: f32,
    target_lane: usize,
    progress: f32,
}

/// An NPC traffic car
///
/// Lateral motion is layered additively on a lane-locked base x: sinusoidal
/// wobble, an occasional forward dash, a rare eased lane migration, and a
/// reactive offset that leans away from the player. The base x only moves
/// when a migration completes.
#[derive(Debug, Clone)]
pub struct Npc {
    pub id: u32,
    pub body: Body,
    pub lane: usize,
    pub kind: CarKind,
    pub base_x: f32,
    pub wobble_phase: f32,
    pub avoid_offset: f32,
    /// Seconds of dash remaining; 0 = not dashing
    pub dash_left: f32,
    migrate_timer: f32,
    migration: Option<Migration>,
    /// Contact debounce: damage lands once per distinct overlap
    pub touching_player: bool,
}

impl Npc {
    pub fn new(id: u32, lane: usize, kind: CarKind, x: f32, vy: f32, rng: &mut Pcg32) -> Self {
        Self {
            id,
            body: Body::new(Vec2::new(x, SPAWN_Y), kind.size()).with_vel(Vec2::new(0.0, vy)),
            lane,
            kind,
            base_x: x,
            wobble_phase: rng.random_range(0.0..std::f32::consts::TAU),
            avoid_offset: 0.0,
            dash_left: 0.0,
            migrate_timer: rng.random_range(NPC_MIGRATE_MIN_SECS..NPC_MIGRATE_MAX_SECS),
            migration: None,
            touching_player: false,
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_left > 0.0
    }

    pub fn is_migrating(&self) -> bool {
        self.migration.is_some()
    }

    /// Returns true when a dash started this tick, so the caller can keep the
    /// concurrent-dasher budget accurate mid-loop.
    pub fn update(
        &mut self,
        dt: f32,
        lane_xs: &[f32; LANE_COUNT],
        player: &Player,
        rng: &mut Pcg32,
        may_dash: bool,
    ) -> bool {
        let mut started_dash = false;
        if self.dash_left > 0.0 {
            self.dash_left -= dt;
        } else if may_dash && rng.random::<f32>() < NPC_DASH_CHANCE * dt {
            self.dash_left = rng.random_range(NPC_DASH_MIN_SECS..NPC_DASH_MAX_SECS);
            started_dash = true;
        }
        let dash_boost = if self.dash_left > 0.0 {
            NPC_DASH_SPEED
        } else {
            0.0
        };
        self.body.pos.y += (self.body.vel.y + dash_boost) * dt;

        if let Some(migration) = self.migration.as_mut() {
            migration.progress = (migration.progress + dt / NPC_MIGRATE_SECS).min(1.0);
            if migration.progress >= 1.0 {
                self.lane = migration.target_lane;
                self.base_x = lane_xs[self.lane];
                self.migration = None;
                self.migrate_timer = rng.random_range(NPC_MIGRATE_MIN_SECS..NPC_MIGRATE_MAX_SECS);
            }
        } else {
            self.migrate_timer -= dt;
            if self.migrate_timer <= 0.0 {
                let dir = if self.lane == 0 {
                    1
                } else if self.lane == LANE_COUNT - 1 {
                    -1
                } else if rng.random_bool(0.5) {
                    1
                } else {
                    -1
                };
                self.migration = Some(Migration {
                    from_x: self.base_x,
                    target_lane: (self.lane as i32 + dir) as usize,
                    progress: 0.0,
                });
            }
        }
        let base_x = match self.migration {
            Some(ref migration) => lerp(
                migration.from_x,
                lane_xs[migration.target_lane],
                smoothstep(migration.progress),
            ),
            None => self.base_x,
        };

        self.wobble_phase += NPC_WOBBLE_RATE * dt;
        let near_player = (player.body.pos.y - self.body.pos.y).abs() < AVOID_WINDOW_Y;
        let dx = player.body.pos.x - base_x;
        if near_player && dx.abs() < AVOID_WINDOW_X {
            let away = if dx > 0.0 { -1.0 } else { 1.0 };
            self.avoid_offset = (self.avoid_offset + away * AVOID_PUSH * dt).clamp(-AVOID_MAX, AVOID_MAX);
        } else {
            self.avoid_offset *= AVOID_DECAY;
        }
        self.body.pos.x = base_x + self.wobble_phase.sin() * NPC_WOBBLE_AMP + self.avoid_offset;

        if self.body.past_bottom() {
            self.body.active = false;
        }
        started_dash
    }
}

/// A coin pickup
#[derive(Debug, Clone)]
pub struct Coin {
    pub id: u32,
    pub body: Body,
    pub lane: usize,
    pub collected: bool,
    pub bob_phase: f32,
}

impl Coin {
    pub fn new(id: u32, lane: usize, x: f32, vy: f32, bob_phase: f32) -> Self {
        Self {
            id,
            body: Body::new(Vec2::new(x, SPAWN_Y), Vec2::splat(COIN_SIZE))
                .with_vel(Vec2::new(0.0, vy)),
            lane,
            collected: false,
            bob_phase,
        }
    }

    /// Vanishes immediately on collection; collecting twice is a no-op
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        self.body.active = false;
        true
    }

    pub fn update(&mut self, dt: f32, lane_x: f32) {
        self.body.pos.y += self.body.vel.y * dt;
        self.bob_phase += COIN_BOB_RATE * dt;
        self.body.pos.x = lane_x + self.bob_phase.sin() * COIN_BOB_AMP;
        if self.body.past_bottom() {
            self.body.active = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerupKind {
    Shield,
}

/// A single-use powerup capsule
#[derive(Debug, Clone)]
pub struct Powerup {
    pub id: u32,
    pub body: Body,
    pub lane: usize,
    pub kind: PowerupKind,
}

impl Powerup {
    pub fn new(id: u32, lane: usize, kind: PowerupKind, x: f32, vy: f32) -> Self {
        Self {
            id,
            body: Body::new(Vec2::new(x, SPAWN_Y), Vec2::splat(POWERUP_SIZE))
                .with_vel(Vec2::new(0.0, vy)),
            lane,
            kind,
        }
    }

    pub fn update(&mut self, dt: f32, lane_x: f32) {
        self.body.pos.y += self.body.vel.y * dt;
        self.body.pos.x = lane_x;
        if self.body.past_bottom() {
            self.body.active = false;
        }
    }
}

/// Road hazard variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    Light,
    RoadWork,
    Crossing,
}

impl HazardKind {
    pub const ALL: [HazardKind; 3] = [HazardKind::Light, HazardKind::RoadWork, HazardKind::Crossing];

    pub fn size(self) -> Vec2 {
        match self {
            HazardKind::Light => Vec2::new(26.0, 26.0),
            HazardKind::RoadWork => Vec2::new(30.0, 28.0),
            HazardKind::Crossing => Vec2::new(40.0, 22.0),
        }
    }
}

/// A hazard; always damages, shield or not
#[derive(Debug, Clone)]
pub struct Hazard {
    pub id: u32,
    pub body: Body,
    pub lane: usize,
    pub kind: HazardKind,
    /// Cosmetic blink for the renderer
    pub blink_phase: f32,
}

impl Hazard {
    pub fn new(id: u32, lane: usize, kind: HazardKind, x: f32, vy: f32) -> Self {
        Self {
            id,
            body: Body::new(Vec2::new(x, SPAWN_Y), kind.size()).with_vel(Vec2::new(0.0, vy)),
            lane,
            kind,
            blink_phase: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32, lane_x: f32) {
        self.body.pos.y += self.body.vel.y * dt;
        self.body.pos.x = lane_x;
        self.blink_phase += HAZARD_BLINK_RATE * dt;
        if self.body.past_bottom() {
            self.body.active = false;
        }
    }
}

/// A particle for visual effects; never an obstacle
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining
    pub life: f32,
    pub max_life: f32,
    pub color: u32,
    pub size: f32,
}

impl Particle {
    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel.y += PARTICLE_GRAVITY * dt;
        self.life -= dt;
    }

    /// Linear fade for the renderer
    pub fn alpha(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

/// Complete session state
///
/// Constructed once per session; `begin_session` re-arms everything on
/// restart. Deterministic given (seed, input sequence, delta sequence).
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub phase: GamePhase,
    /// Accumulated sim time in the current run (seconds)
    pub time: f32,
    /// Countdown to the win screen
    pub time_left: f32,
    pub speed_mult: f32,
    pub(crate) boost_mid_done: bool,
    pub(crate) boost_late_done: bool,

    pub player: Player,
    pub npcs: Vec<Npc>,
    pub coins: Vec<Coin>,
    pub powerups: Vec<Powerup>,
    pub hazards: Vec<Hazard>,
    pub particles: Vec<Particle>,

    pub combo: u32,
    pub(crate) last_score_at: f32,
    pub events: Vec<GameEvent>,
    pub(crate) spawner: Spawner,
    pub tuning: Tuning,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Validates the tuning up front; a bad config never produces a session
    pub fn new(seed: u64, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        let player = Player::new(&tuning);
        Ok(Self {
            seed,
            phase: GamePhase::Splash,
            time: 0.0,
            time_left: tuning.session_secs,
            speed_mult: tuning.speed_base,
            boost_mid_done: false,
            boost_late_done: false,
            player,
            npcs: Vec::new(),
            coins: Vec::new(),
            powerups: Vec::new(),
            hazards: Vec::new(),
            particles: Vec::new(),
            combo: 0,
            last_score_at: f32::NEG_INFINITY,
            events: Vec::new(),
            spawner: Spawner::default(),
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reset collections, player, timers and latches, then enter Playing
    pub fn begin_session(&mut self) {
        self.npcs.clear();
        self.coins.clear();
        self.powerups.clear();
        self.hazards.clear();
        self.particles.clear();
        self.player = Player::new(&self.tuning);
        self.spawner = Spawner::default();
        self.time = 0.0;
        self.time_left = self.tuning.session_secs;
        self.speed_mult = self.tuning.speed_base;
        self.boost_mid_done = false;
        self.boost_late_done = false;
        self.combo = 0;
        self.last_score_at = f32::NEG_INFINITY;
        self.phase = GamePhase::Playing;
        log::info!("session start: {}s on the clock", self.tuning.session_secs);
    }
}
