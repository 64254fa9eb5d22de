//! Game state and core simulation types
//!
//! All state that the per-frame reducer reads or writes lives here, including
//! the RNG and every piece of spawn/score bookkeeping.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geom::Aabb;
use crate::consts::*;
use crate::tuning::{PowerUpTuning, Tuning};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No level running, waiting for a start command
    Menu,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended (collision or fell out of the world)
    GameOver,
    /// Active level's target score reached
    LevelCompleted,
}

/// The player-controlled character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity in px/tick (positive = down)
    pub velocity_y: f32,
    pub has_shield: bool,
    /// Ticks left of the post-hit grace period
    pub hurt_ticks: u32,
}

impl Character {
    pub fn new(spawn: Vec2, size: Vec2) -> Self {
        Self {
            pos: spawn,
            size,
            velocity_y: 0.0,
            has_shield: false,
            hurt_ticks: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    /// Rising (negative velocity)
    #[inline]
    pub fn is_jumping(&self) -> bool {
        self.velocity_y < 0.0
    }

    #[inline]
    pub fn is_hurt(&self) -> bool {
        self.hurt_ticks > 0
    }
}

/// Which member of an obstacle pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipeSide {
    Top,
    Bottom,
}

/// Obstacle identity: both members of a pair share `pair`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObstacleId {
    pub pair: u32,
    pub side: PipeSide,
}

/// One pipe of an obstacle pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub pos: Vec2,
    pub size: Vec2,
    /// Leftward displacement per tick before world scaling
    pub speed: f32,
    /// `pos.x` before the most recent displacement
    pub prev_x: f32,
    /// Decorative only
    #[serde(default)]
    pub rotation: Option<f32>,
    pub cap_overhang: f32,
    pub cap_height: f32,
}

impl Obstacle {
    #[inline]
    pub fn is_top(&self) -> bool {
        self.id.side == PipeSide::Top
    }

    /// Pipe body
    pub fn body(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    /// Cap at the gap end of the pipe; wider than the body
    pub fn cap(&self) -> Aabb {
        let cap_h = self.cap_height.min(self.size.y);
        let y = match self.id.side {
            PipeSide::Top => self.pos.y + self.size.y - cap_h,
            PipeSide::Bottom => self.pos.y,
        };
        Aabb::new(self.pos.x, y, self.size.x, cap_h).expanded(self.cap_overhang, 0.0)
    }

    /// Everything that kills on touch
    pub fn hitboxes(&self) -> [Aabb; 2] {
        [self.body(), self.cap()]
    }

    #[inline]
    pub fn mid_x(&self) -> f32 {
        self.pos.x + self.size.x * 0.5
    }

    #[inline]
    pub fn prev_mid_x(&self) -> f32 {
        self.prev_x + self.size.x * 0.5
    }

    /// Scroll left by `dx`, remembering where we were
    pub fn displace(&mut self, dx: f32) {
        self.prev_x = self.pos.x;
        self.pos.x -= dx;
    }
}

/// Coin rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CoinRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
}

impl CoinRarity {
    pub const ALL: [CoinRarity; 3] = [CoinRarity::Common, CoinRarity::Uncommon, CoinRarity::Rare];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoinRarity::Common => "common",
            CoinRarity::Uncommon => "uncommon",
            CoinRarity::Rare => "rare",
        }
    }
}

/// A collectible coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    /// Pair whose gap produced this coin
    pub pair: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
    pub value: u64,
    pub rarity: CoinRarity,
    pub is_collected: bool,
}

impl Collectible {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    Speed,
    Magnet,
    SlowTime,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Shield,
        PowerUpKind::Speed,
        PowerUpKind::Magnet,
        PowerUpKind::SlowTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "shield",
            PowerUpKind::Speed => "speed",
            PowerUpKind::Magnet => "magnet",
            PowerUpKind::SlowTime => "slow_time",
        }
    }

    pub fn duration_ticks(&self, tuning: &PowerUpTuning) -> u32 {
        match self {
            PowerUpKind::Shield => tuning.shield_ticks,
            PowerUpKind::Speed => tuning.speed_ticks,
            PowerUpKind::Magnet => tuning.magnet_ticks,
            PowerUpKind::SlowTime => tuning.slow_time_ticks,
        }
    }
}

/// A power-up pickup floating in a gap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub pair: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
    pub is_collected: bool,
    pub duration_ticks: u32,
}

impl PowerUp {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }
}

/// A collected power-up still in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub remaining_ticks: u32,
}

/// Monotonic entity id source; ids are never reused within a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    Collision,
    FellOut,
}

/// Things that happened during a tick, for audio/notification collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped,
    PairSpawned { pair: u32, gap_top: f32, gap_size: f32 },
    SpawnSkipped,
    ObstaclePassed { pair: u32, points: u64 },
    CoinCollected { id: u32, value: u64 },
    PowerUpCollected { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    ShieldAbsorbed,
    DifficultyRaised { level: u32 },
    GameOver { score: u64, cause: EndCause },
    LevelCompleted { score: u64 },
    /// Raised by the orchestrator when a finished run beats the stored best
    NewHighScore { score: u64 },
}

/// Complete game state (deterministic: same seed + same inputs = same run)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Active level id
    pub level: u32,
    /// Score that completes the active level, if any
    pub target_score: Option<u64>,
    /// Level preset multiplier on scroll speed
    pub world_speed: f32,
    pub lives: u8,
    pub score: u64,
    pub difficulty: f32,
    /// Play time credited while Playing
    pub elapsed_ms: f64,
    pub time_ticks: u64,
    pub character: Character,
    /// Active obstacles (spawn order)
    pub obstacles: Vec<Obstacle>,
    pub collectibles: Vec<Collectible>,
    pub power_ups: Vec<PowerUp>,
    pub active_power_ups: Vec<ActivePowerUp>,
    /// `elapsed_ms` of the last spawn attempt
    pub last_spawn_ms: Option<f64>,
    /// x of the rightmost obstacle
    pub last_obstacle_x: Option<f32>,
    /// Gap top of the most recent pair
    pub last_gap_top: Option<f32>,
    /// Top pipes already scored
    pub passed: BTreeSet<ObstacleId>,
    /// Pairs already offered pickups
    pub processed_pairs: BTreeSet<u32>,
    /// Events emitted by the most recent tick
    pub events: Vec<GameEvent>,
    /// Entity ID source
    pub ids: IdAllocator,
}

impl GameState {
    /// Create a new game state with the given seed, parked in the menu
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let character = Character::new(tuning.world.spawn, tuning.world.character_size);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            phase: GamePhase::Menu,
            level: 1,
            target_score: None,
            world_speed: 1.0,
            lives: STARTING_LIVES,
            score: 0,
            difficulty: 1.0,
            elapsed_ms: 0.0,
            time_ticks: 0,
            character,
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            power_ups: Vec::new(),
            active_power_ups: Vec::new(),
            last_spawn_ms: None,
            last_obstacle_x: None,
            last_gap_top: None,
            passed: BTreeSet::new(),
            processed_pairs: BTreeSet::new(),
            events: Vec::new(),
            ids: IdAllocator::default(),
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next_id()
    }

    /// Clear the run and enter Playing on the given level.
    ///
    /// The RNG keeps its stream so retries get fresh layouts.
    pub fn begin_level(&mut self, level: u32, target_score: Option<u64>, world_speed: f32) {
        self.level = level;
        self.target_score = target_score;
        self.world_speed = world_speed;
        self.lives = STARTING_LIVES;
        self.score = 0;
        self.difficulty = 1.0;
        self.elapsed_ms = 0.0;
        self.time_ticks = 0;
        self.character = Character::new(self.tuning.world.spawn, self.tuning.world.character_size);
        self.obstacles.clear();
        self.collectibles.clear();
        self.power_ups.clear();
        self.active_power_ups.clear();
        self.last_spawn_ms = None;
        self.last_obstacle_x = None;
        self.last_gap_top = None;
        self.passed.clear();
        self.processed_pairs.clear();
        self.events.clear();
        self.phase = GamePhase::Playing;
    }

    /// Back to the menu with an empty world
    pub fn return_to_menu(&mut self) {
        let level = self.level;
        self.begin_level(level, None, 1.0);
        self.phase = GamePhase::Menu;
    }

    pub fn has_power_up(&self, kind: PowerUpKind) -> bool {
        self.active_power_ups.iter().any(|p| p.kind == kind)
    }

    /// Scroll multiplier from level preset and time power-ups
    pub fn scroll_scale(&self) -> f32 {
        let mut scale = self.world_speed;
        if self.has_power_up(PowerUpKind::Speed) {
            scale *= self.tuning.power_ups.speed_scale;
        }
        if self.has_power_up(PowerUpKind::SlowTime) {
            scale *= self.tuning.power_ups.slow_time_scale;
        }
        scale
    }

    /// Start (or refresh) a power-up effect
    pub fn activate_power_up(&mut self, kind: PowerUpKind, duration_ticks: u32) {
        if let Some(active) = self.active_power_ups.iter_mut().find(|p| p.kind == kind) {
            active.remaining_ticks = active.remaining_ticks.max(duration_ticks);
        } else {
            self.active_power_ups.push(ActivePowerUp {
                kind,
                remaining_ticks: duration_ticks,
            });
        }
        if kind == PowerUpKind::Shield {
            self.character.has_shield = true;
        }
    }

    /// Drop the shield effect after it absorbed a hit
    pub fn consume_shield(&mut self) {
        self.character.has_shield = false;
        self.active_power_ups.retain(|p| p.kind != PowerUpKind::Shield);
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_level_completed(&self) -> bool {
        self.phase == GamePhase::LevelCompleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_pipe(x: f32, height: f32) -> Obstacle {
        Obstacle {
            id: ObstacleId { pair: 1, side: PipeSide::Top },
            pos: Vec2::new(x, 0.0),
            size: Vec2::new(80.0, height),
            speed: 3.0,
            prev_x: x,
            rotation: None,
            cap_overhang: 4.0,
            cap_height: 24.0,
        }
    }

    #[test]
    fn test_new_state_starts_in_menu() {
        let state = GameState::new(7, Tuning::default());
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, STARTING_LIVES);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.character.pos, Vec2::new(SPAWN_X, SPAWN_Y));
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut state = GameState::new(7, Tuning::default());
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_top_cap_sits_at_gap_end_and_overhangs() {
        let pipe = top_pipe(200.0, 150.0);
        let cap = pipe.cap();
        assert_eq!(cap.bottom(), 150.0);
        assert_eq!(cap.top(), 126.0);
        assert_eq!(cap.left(), 196.0);
        assert_eq!(cap.right(), 284.0);
    }

    #[test]
    fn test_bottom_cap_sits_at_pipe_top() {
        let mut pipe = top_pipe(200.0, 200.0);
        pipe.id.side = PipeSide::Bottom;
        pipe.pos.y = 400.0;
        let cap = pipe.cap();
        assert_eq!(cap.top(), 400.0);
        assert_eq!(cap.bottom(), 424.0);
    }

    #[test]
    fn test_displace_tracks_previous_x() {
        let mut pipe = top_pipe(200.0, 150.0);
        pipe.displace(3.0);
        assert_eq!(pipe.prev_x, 200.0);
        assert_eq!(pipe.pos.x, 197.0);
        assert_eq!(pipe.prev_mid_x(), 240.0);
        assert_eq!(pipe.mid_x(), 237.0);
    }

    #[test]
    fn test_shield_activation_and_consumption() {
        let mut state = GameState::new(7, Tuning::default());
        state.activate_power_up(PowerUpKind::Shield, 100);
        assert!(state.character.has_shield);
        assert!(state.has_power_up(PowerUpKind::Shield));

        state.consume_shield();
        assert!(!state.character.has_shield);
        assert!(!state.has_power_up(PowerUpKind::Shield));
    }

    #[test]
    fn test_reactivation_extends_not_duplicates() {
        let mut state = GameState::new(7, Tuning::default());
        state.activate_power_up(PowerUpKind::Magnet, 100);
        state.activate_power_up(PowerUpKind::Magnet, 300);
        assert_eq!(state.active_power_ups.len(), 1);
        assert_eq!(state.active_power_ups[0].remaining_ticks, 300);
    }

    #[test]
    fn test_scroll_scale_combines_effects() {
        let mut state = GameState::new(7, Tuning::default());
        state.world_speed = 1.2;
        assert!((state.scroll_scale() - 1.2).abs() < 1e-6);
        state.activate_power_up(PowerUpKind::SlowTime, 10);
        assert!((state.scroll_scale() - 0.6).abs() < 1e-6);
    }
}
