//! Data-driven game balance
//!
//! Everything a designer might want to retune without touching simulation code
//! lives here. A `Tuning` can be deserialized from JSON shipped next to the
//! host page; out-of-range values are a configuration bug, so validation fails
//! fast at session construction instead of clamping silently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Spawn pacing for one entity category
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpawnPacing {
    /// Seconds between spawn attempts
    pub interval: f32,
    /// Maximum live population
    pub cap: usize,
    /// Probability that a due attempt goes through
    pub chance: f32,
}

/// Game balance knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Session length in seconds; the timer counts down to the win screen
    pub session_secs: f32,
    /// Lane center x positions, left to right
    pub lane_xs: [f32; 3],

    /// Global speed multiplier applied to spawn velocities
    pub speed_base: f32,
    pub speed_mid: f32,
    pub speed_late: f32,
    /// Elapsed-time thresholds for the two one-way speed boosts
    pub boost_mid_at: f32,
    pub boost_late_at: f32,

    pub npc: SpawnPacing,
    pub coin: SpawnPacing,
    pub powerup: SpawnPacing,
    pub hazard: SpawnPacing,
    /// Minimum longitudinal gap to every live NPC at spawn time
    pub npc_min_gap: f32,
    /// Concurrent NPCs allowed per lane at spawn time
    pub npc_lane_cap: usize,

    /// Shrinks the player's box before overlap tests
    pub forgiveness: f32,
    pub power_max: f32,
    /// Power lost per second just by driving
    pub power_decay: f32,
    pub shield_secs: f32,
    pub npc_damage: f32,
    pub hazard_damage: f32,
    pub coin_points: u32,
    pub powerup_points: u32,
    /// Two scores inside this window extend the combo streak
    pub combo_window: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            session_secs: 60.0,
            lane_xs: [90.0, 210.0, 330.0],

            speed_base: 1.0,
            speed_mid: 1.25,
            speed_late: 1.5,
            boost_mid_at: 20.0,
            boost_late_at: 40.0,

            npc: SpawnPacing {
                interval: 0.9,
                cap: 8,
                chance: 1.0,
            },
            coin: SpawnPacing {
                interval: 1.4,
                cap: 5,
                chance: 0.75,
            },
            powerup: SpawnPacing {
                interval: 9.0,
                cap: 1,
                chance: 0.35,
            },
            hazard: SpawnPacing {
                interval: 5.0,
                cap: 2,
                chance: 0.5,
            },
            npc_min_gap: 130.0,
            npc_lane_cap: 2,

            forgiveness: 6.0,
            power_max: 100.0,
            power_decay: 1.5,
            shield_secs: 5.0,
            npc_damage: 12.0,
            hazard_damage: 18.0,
            coin_points: 10,
            powerup_points: 25,
            combo_window: 0.5,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json).map_err(TuningError::Parse)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject configurations that indicate a programming error
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive: [(&'static str, f32); 9] = [
            ("session_secs", self.session_secs),
            ("speed_base", self.speed_base),
            ("npc.interval", self.npc.interval),
            ("coin.interval", self.coin.interval),
            ("powerup.interval", self.powerup.interval),
            ("hazard.interval", self.hazard.interval),
            ("npc_min_gap", self.npc_min_gap),
            ("shield_secs", self.shield_secs),
            ("combo_window", self.combo_window),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(TuningError::NonPositive(field));
            }
        }
        if self.power_max <= 0.0 {
            return Err(TuningError::NonPositive("power_max"));
        }
        // Zero decay and zero damage are legitimate debug configs
        let non_negative: [(&'static str, f32); 4] = [
            ("power_decay", self.power_decay),
            ("npc_damage", self.npc_damage),
            ("hazard_damage", self.hazard_damage),
            ("forgiveness", self.forgiveness),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(TuningError::NonPositive(field));
            }
        }
        if self.npc.cap == 0 || self.coin.cap == 0 || self.powerup.cap == 0 || self.hazard.cap == 0
        {
            return Err(TuningError::NonPositive("cap"));
        }
        if self.npc_lane_cap == 0 {
            return Err(TuningError::NonPositive("npc_lane_cap"));
        }
        for (field, chance) in [
            ("npc.chance", self.npc.chance),
            ("coin.chance", self.coin.chance),
            ("powerup.chance", self.powerup.chance),
            ("hazard.chance", self.hazard.chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(TuningError::UnitRange(field));
            }
        }
        if !(self.lane_xs[0] < self.lane_xs[1] && self.lane_xs[1] < self.lane_xs[2]) {
            return Err(TuningError::LaneOrder);
        }
        let thresholds_ordered = 0.0 < self.boost_mid_at && self.boost_mid_at < self.boost_late_at;
        let speeds_ordered =
            self.speed_base <= self.speed_mid && self.speed_mid <= self.speed_late;
        if !thresholds_ordered || !speeds_ordered {
            return Err(TuningError::BoostOrder);
        }
        Ok(())
    }
}

/// Rejected tuning document
#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    NonPositive(&'static str),
    UnitRange(&'static str),
    LaneOrder,
    BoostOrder,
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(err) => write!(f, "tuning parse error: {err}"),
            TuningError::NonPositive(field) => write!(f, "tuning field {field} must be positive"),
            TuningError::UnitRange(field) => write!(f, "tuning field {field} must be in [0, 1]"),
            TuningError::LaneOrder => write!(f, "lane_xs must be strictly ascending"),
            TuningError::BoostOrder => {
                write!(f, "boost thresholds/multipliers must be ascending")
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(err) => Some(err),
            _ => None,
        }
    }
}
