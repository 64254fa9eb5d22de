//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, owned by `GameState`
//! - Stable iteration order (spawn order, ordered sets)
//! - No platform dependencies
//!
//! The only clock is the frame delta passed in through `TickInput`.

pub mod collision;
pub mod difficulty;
pub mod geom;
pub mod obstacles;
pub mod physics;
pub mod pickups;
pub mod state;
pub mod tick;

pub use collision::{Resolution, ResolveInput, resolve};
pub use difficulty::{DifficultyCurve, pass_points};
pub use geom::Aabb;
pub use obstacles::{ObstacleGenerator, ObstaclePair, can_spawn, spawn_pair};
pub use physics::{apply_jump, integrate};
pub use pickups::{CoinGenerator, CoinPattern, PickupBatch, spawn_pickups};
pub use state::{
    ActivePowerUp, Character, CoinRarity, Collectible, EndCause, GameEvent, GamePhase, GameState,
    Obstacle, ObstacleId, PipeSide, PowerUp, PowerUpKind,
};
pub use tick::{TickInput, step, tick};
