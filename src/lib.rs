//! Power Flap - A side-scrolling pipe-dodging arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, generation, collisions, scoring)
//! - `game`: Orchestrator (commands, frame loop, high score, level progress)
//! - `levels`: Level book, presets and star ratings
//! - `tuning`: Data-driven game balance
//! - `platform`: Logging, frame scheduling, input mapping, storage

pub mod game;
pub mod highscores;
pub mod levels;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use game::{Game, GameError, Snapshot};
pub use highscores::{HighScore, HighScoreStore, format_score};
pub use levels::{DifficultyPreset, Level, LevelBook};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration the tuning is expressed against (60 Hz)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest frame delta credited to elapsed play time (tab switch, hitch)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Default viewport
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;

    /// Character spawn point and hitbox
    pub const SPAWN_X: f32 = 100.0;
    pub const SPAWN_Y: f32 = 200.0;
    pub const CHARACTER_SIZE: f32 = 50.0;

    /// Single life: any unshielded hit ends the run
    pub const STARTING_LIVES: u8 = 1;
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f32::clamp` this never panics when the bounds cross; `min` wins.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Linear interpolation between `start` and `end`
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start * (1.0 - t) + end * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_crossed_bounds_prefers_min() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
        // Degenerate range: lower bound wins
        assert_eq!(clamp(3.0, 8.0, 4.0), 8.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert!((lerp(2.0, 4.0, 0.5) - 3.0).abs() < 1e-6);
    }
}
