//! Character physics: gravity, velocity cap, ceiling bounce, jump impulse
//!
//! There is no floor here. Leaving the world downward is judged by the tick.

use rand::Rng;

use super::state::Character;
use crate::clamp;

/// Advance the character by one tick under gravity
pub fn integrate(character: &Character, gravity: f32, max_velocity_y: f32, damping: f32) -> Character {
    let mut next = character.clone();

    let mut velocity_y = clamp(character.velocity_y + gravity, -max_velocity_y, max_velocity_y);
    let mut y = character.pos.y + velocity_y;

    // Bounce off the ceiling
    if y < 0.0 {
        y = 0.0;
        velocity_y = velocity_y.abs() * damping;
    }

    next.pos.y = y;
    next.velocity_y = velocity_y;
    next.hurt_ticks = character.hurt_ticks.saturating_sub(1);
    next
}

/// Set the upward velocity of a jump.
///
/// Legal at any time: with no ground, mid-air jumps are the only way to fly.
pub fn apply_jump<R: Rng>(character: &Character, jump_force: f32, variance: f32, rng: &mut R) -> Character {
    let jitter = if variance > 0.0 {
        rng.random_range(-variance..=variance)
    } else {
        0.0
    };
    let mut next = character.clone();
    next.velocity_y = jump_force + jitter;
    next
}
