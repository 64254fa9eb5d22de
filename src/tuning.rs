//! Data-driven game balance
//!
//! Every number the simulation consumes lives here. Defaults reproduce the
//! shipped feel; hosts may override any subset from JSON.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::difficulty::DifficultyCurve;

/// What ends a run vertically
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum FloorPolicy {
    /// No ground: falling fully below the viewport ends the run
    #[default]
    Endless,
    /// Touching the ground line ends the run
    Ground { y: f32 },
}

/// How a shield treats an otherwise fatal obstacle hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ShieldRule {
    /// First hit consumes the shield and grants a short grace period
    #[default]
    Consume,
    /// Hits are ignored for as long as the shield lasts
    Persist,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Added to vertical velocity every tick (positive = down)
    pub gravity: f32,
    /// Velocity set by a jump (negative = up)
    pub jump_force: f32,
    /// Uniform jitter applied to the jump impulse (0 = exact)
    pub jump_variance: f32,
    /// Vertical speed cap in both directions
    pub max_velocity_y: f32,
    /// Fraction of speed kept when bouncing off the ceiling, in [0, 1)
    pub ceiling_damping: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 0.6,
            jump_force: -10.0,
            jump_variance: 0.0,
            max_velocity_y: 15.0,
            ceiling_damping: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub width: f32,
    pub height: f32,
    pub floor: FloorPolicy,
    pub spawn: Vec2,
    pub character_size: Vec2,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            floor: FloorPolicy::Endless,
            spawn: Vec2::new(SPAWN_X, SPAWN_Y),
            character_size: Vec2::splat(CHARACTER_SIZE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub base_gap: f32,
    /// Hard floor on the gap, whatever the difficulty
    pub min_gap: f32,
    pub shrink_per_difficulty: f32,
    /// Minimum pipe length above and below the gap
    pub gap_margin: f32,
    /// Largest vertical move of the gap between consecutive pairs
    pub max_gap_shift: f32,
    pub base_width: f32,
    pub width_growth: f32,
    pub max_width: f32,
    pub base_speed: f32,
    pub speed_growth: f32,
    pub max_speed: f32,
    /// Pipe cap sticks out this far on each side of the body
    pub cap_overhang: f32,
    pub cap_height: f32,
    pub base_interval_ms: f32,
    pub interval_per_difficulty_ms: f32,
    pub min_interval_ms: f32,
    /// No spawn while any pipe's right edge is this close to the world edge
    pub edge_margin: f32,
    /// Rightmost pipe must have travelled this share of the world width
    pub min_spacing_fraction: f32,
    /// Pipes are pruned once their right edge passes `-prune_margin`
    pub prune_margin: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            base_gap: 350.0,
            min_gap: 220.0,
            shrink_per_difficulty: 25.0,
            gap_margin: 60.0,
            max_gap_shift: 260.0,
            base_width: 80.0,
            width_growth: 4.0,
            max_width: 110.0,
            base_speed: 3.0,
            speed_growth: 0.4,
            max_speed: 6.0,
            cap_overhang: 4.0,
            cap_height: 24.0,
            base_interval_ms: 2000.0,
            interval_per_difficulty_ms: 150.0,
            min_interval_ms: 1300.0,
            edge_margin: 120.0,
            min_spacing_fraction: 0.65,
            prune_margin: 50.0,
        }
    }
}

/// One coin tier: value and relative draw weight
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoinTier {
    pub value: u64,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Gaps smaller than this get no pickups
    pub min_gap_for_coins: f32,
    pub coin_size: f32,
    pub max_coins: u32,
    /// Vertical space between stacked coins
    pub coin_spacing: f32,
    /// Common, uncommon, rare
    pub tiers: [CoinTier; 3],
    /// Chance that a pair carries a power-up instead of coins
    pub power_up_chance: f64,
    pub power_up_size: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            min_gap_for_coins: 100.0,
            coin_size: 30.0,
            max_coins: 3,
            coin_spacing: 10.0,
            tiers: [
                CoinTier { value: 10, weight: 75 },
                CoinTier { value: 25, weight: 20 },
                CoinTier { value: 50, weight: 5 },
            ],
            power_up_chance: 0.12,
            power_up_size: 36.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    pub shield_ticks: u32,
    pub speed_ticks: u32,
    pub magnet_ticks: u32,
    pub slow_time_ticks: u32,
    pub shield_rule: ShieldRule,
    /// Grace period after a consumed shield
    pub hurt_ticks: u32,
    pub speed_scale: f32,
    pub slow_time_scale: f32,
    pub magnet_radius: f32,
    /// Coin drift toward the character per tick
    pub magnet_pull: f32,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            shield_ticks: 600,
            speed_ticks: 300,
            magnet_ticks: 480,
            slow_time_ticks: 300,
            shield_rule: ShieldRule::Consume,
            hurt_ticks: 45,
            speed_scale: 1.5,
            slow_time_scale: 0.5,
            magnet_radius: 160.0,
            magnet_pull: 6.0,
        }
    }
}

/// Complete balance sheet for one game instance
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub world: WorldTuning,
    pub obstacles: ObstacleTuning,
    pub pickups: PickupTuning,
    pub power_ups: PowerUpTuning,
    pub difficulty: DifficultyCurve,
}

/// Why a tuning sheet was rejected
#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning parse error: {}", e),
            TuningError::Invalid(reason) => write!(f, "invalid tuning: {}", reason),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON sheet over the defaults and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject sheets that could produce an unwinnable world
    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.physics;
        let w = &self.world;
        let o = &self.obstacles;
        let c = &self.pickups;

        if p.gravity <= 0.0 {
            return Err(TuningError::Invalid("gravity must be positive"));
        }
        if p.jump_force >= 0.0 {
            return Err(TuningError::Invalid("jump force must point up (negative)"));
        }
        if p.jump_variance < 0.0 || p.jump_variance >= -p.jump_force {
            return Err(TuningError::Invalid("jump variance must be smaller than the jump"));
        }
        if p.max_velocity_y <= 0.0 {
            return Err(TuningError::Invalid("max vertical velocity must be positive"));
        }
        if !(0.0..1.0).contains(&p.ceiling_damping) {
            return Err(TuningError::Invalid("ceiling damping must be in [0, 1)"));
        }
        if w.width <= 0.0 || w.height <= 0.0 {
            return Err(TuningError::Invalid("world must have a positive size"));
        }
        if o.min_gap <= w.character_size.y {
            return Err(TuningError::Invalid("minimum gap must exceed the character height"));
        }
        if o.base_gap < o.min_gap {
            return Err(TuningError::Invalid("base gap must not be below the minimum gap"));
        }
        if w.height < o.min_gap + 2.0 * o.gap_margin {
            return Err(TuningError::Invalid("world too short for the minimum gap"));
        }
        if o.max_width < o.base_width || o.base_width <= 0.0 {
            return Err(TuningError::Invalid("pipe width bounds are inconsistent"));
        }
        if o.max_speed < o.base_speed || o.base_speed <= 0.0 {
            return Err(TuningError::Invalid("pipe speed bounds are inconsistent"));
        }
        if o.max_gap_shift <= 0.0 {
            return Err(TuningError::Invalid("gap shift must be positive"));
        }
        if o.width_growth < 0.0 {
            return Err(TuningError::Invalid("pipe width must not shrink with difficulty"));
        }
        if c.coin_size > o.base_width || c.power_up_size > o.base_width {
            return Err(TuningError::Invalid("pickups must fit inside the narrowest pipe"));
        }
        // Pickups only appear in gaps of at least this height
        let smallest_stocked_gap = o.min_gap.max(c.min_gap_for_coins);
        if c.coin_size > smallest_stocked_gap || c.power_up_size > smallest_stocked_gap {
            return Err(TuningError::Invalid("pickups must fit inside the smallest gap"));
        }
        if c.tiers.iter().all(|t| t.weight == 0) {
            return Err(TuningError::Invalid("at least one coin tier needs weight"));
        }
        if !(0.0..=1.0).contains(&c.power_up_chance) {
            return Err(TuningError::Invalid("power-up chance must be a probability"));
        }
        self.difficulty.validate()?;
        Ok(())
    }
}
