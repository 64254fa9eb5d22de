//! Per-frame simulation step
//!
//! One call runs the whole Playing sequence: difficulty, spawning, scrolling,
//! resolution, pruning, physics, power-up countdowns and terminal checks.

use super::collision::{Resolution, ResolveInput, resolve};
use super::difficulty::pass_points;
use super::obstacles::spawn_pair;
use super::physics::{apply_jump, integrate};
use super::pickups::spawn_pickups;
use super::state::{EndCause, GameEvent, GamePhase, GameState, PowerUpKind};
use crate::consts::MAX_FRAME_MS;
use crate::tuning::{FloorPolicy, ShieldRule};

/// Input for a single step (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Wall-clock time since the previous frame
    pub dt_ms: f32,
    /// Jump this frame
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Pure form of [`tick`]: the input state is left untouched
pub fn step(state: &GameState, input: &TickInput) -> GameState {
    let mut next = state.clone();
    tick(&mut next, input);
    next
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.events.clear();

    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("paused at {:.0}ms", state.elapsed_ms);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("resumed");
            }
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    state.elapsed_ms += input.dt_ms.clamp(0.0, MAX_FRAME_MS) as f64;
    state.time_ticks += 1;

    if input.jump {
        let physics = &state.tuning.physics;
        state.character = apply_jump(
            &state.character,
            physics.jump_force,
            physics.jump_variance,
            &mut state.rng,
        );
        state.events.push(GameEvent::Jumped);
    }

    update_difficulty(state);

    spawn_pair(state);
    spawn_pickups(state);

    scroll_world(state);
    if state.has_power_up(PowerUpKind::Magnet) {
        attract_coins(state);
    }

    let resolution = resolve(ResolveInput {
        character: &state.character,
        obstacles: &state.obstacles,
        collectibles: &state.collectibles,
        power_ups: &state.power_ups,
        passed: &state.passed,
        difficulty: state.difficulty,
    });
    let fatal = resolution.fatal;
    apply_resolution(state, resolution);

    prune(state);

    let physics = &state.tuning.physics;
    state.character = integrate(
        &state.character,
        physics.gravity,
        physics.max_velocity_y,
        physics.ceiling_damping,
    );

    count_down_power_ups(state);

    if fatal {
        end_run(state, EndCause::Collision);
    } else if fell_out(state) {
        end_run(state, EndCause::FellOut);
    } else if state.target_score.is_some_and(|target| state.score >= target) {
        state.phase = GamePhase::LevelCompleted;
        state.events.push(GameEvent::LevelCompleted { score: state.score });
        log::info!("level {} completed with {} points", state.level, state.score);
    }
}

/// Raise difficulty along the curve; it never drops during a run
fn update_difficulty(state: &mut GameState) {
    let computed = state.tuning.difficulty.compute(state.elapsed_ms, state.score);
    let previous = state.difficulty;
    state.difficulty = previous.max(computed);

    if state.difficulty.floor() > previous.floor() {
        let level = state.difficulty.floor() as u32;
        log::info!("difficulty raised to {}", level);
        state.events.push(GameEvent::DifficultyRaised { level });
    }
}

/// Move obstacles and pickups left at their own speed, scaled by world effects
fn scroll_world(state: &mut GameState) {
    let scale = state.scroll_scale();
    for obstacle in &mut state.obstacles {
        let dx = obstacle.speed * scale;
        obstacle.displace(dx);
    }
    for coin in &mut state.collectibles {
        coin.pos.x -= coin.speed * scale;
    }
    for power_up in &mut state.power_ups {
        power_up.pos.x -= power_up.speed * scale;
    }
}

/// Pull nearby uncollected coins toward the character
fn attract_coins(state: &mut GameState) {
    let target = state.character.bounds().center();
    let radius = state.tuning.power_ups.magnet_radius;
    let pull = state.tuning.power_ups.magnet_pull;

    for coin in state.collectibles.iter_mut().filter(|c| !c.is_collected) {
        let offset = target - coin.bounds().center();
        let distance = offset.length();
        if distance > 0.0 && distance <= radius {
            coin.pos += offset / distance * pull.min(distance);
        }
    }
}

fn apply_resolution(state: &mut GameState, resolution: Resolution) {
    if resolution.shield_absorbed {
        if state.tuning.power_ups.shield_rule == ShieldRule::Consume {
            state.consume_shield();
        }
        state.character.hurt_ticks = state.tuning.power_ups.hurt_ticks;
        state.events.push(GameEvent::ShieldAbsorbed);
        log::info!("shield absorbed a hit");
    }

    let points = pass_points(state.difficulty);
    for id in resolution.newly_passed {
        if state.passed.insert(id) {
            state.events.push(GameEvent::ObstaclePassed { pair: id.pair, points });
        }
    }

    for id in resolution.collected_coins {
        if let Some(coin) = state.collectibles.iter_mut().find(|c| c.id == id) {
            coin.is_collected = true;
            log::debug!("coin {} ({}) +{}", id, coin.rarity.as_str(), coin.value);
            state.events.push(GameEvent::CoinCollected { id, value: coin.value });
        }
    }

    for id in resolution.collected_power_ups {
        let Some(power_up) = state.power_ups.iter_mut().find(|p| p.id == id) else {
            continue;
        };
        power_up.is_collected = true;
        let (kind, duration) = (power_up.kind, power_up.duration_ticks);
        state.activate_power_up(kind, duration);
        state.events.push(GameEvent::PowerUpCollected { kind });
        log::info!("power-up {} active for {} ticks", kind.as_str(), duration);
    }

    state.score = state.score.saturating_add(resolution.score_delta);
}

/// Drop everything that scrolled past the left edge, with its bookkeeping
fn prune(state: &mut GameState) {
    let margin = state.tuning.obstacles.prune_margin;
    let gone = |x: f32, w: f32| x + w < -margin;

    state.obstacles.retain(|o| !gone(o.pos.x, o.size.x));
    state.collectibles.retain(|c| !gone(c.pos.x, c.size.x));
    state.power_ups.retain(|p| !gone(p.pos.x, p.size.x));

    let live = &state.obstacles;
    state.passed.retain(|id| live.iter().any(|o| o.id == *id));
    state.processed_pairs.retain(|pair| live.iter().any(|o| o.id.pair == *pair));

    state.last_obstacle_x = state.obstacles.iter().map(|o| o.pos.x).reduce(f32::max);
}

fn count_down_power_ups(state: &mut GameState) {
    let mut expired = Vec::new();
    for active in &mut state.active_power_ups {
        active.remaining_ticks = active.remaining_ticks.saturating_sub(1);
        if active.remaining_ticks == 0 {
            expired.push(active.kind);
        }
    }
    if expired.is_empty() {
        return;
    }

    state.active_power_ups.retain(|p| p.remaining_ticks > 0);
    for kind in expired {
        if kind == PowerUpKind::Shield {
            state.character.has_shield = false;
        }
        log::debug!("power-up {} expired", kind.as_str());
        state.events.push(GameEvent::PowerUpExpired { kind });
    }
}

/// Character left the world through the bottom (or touched the ground)
fn fell_out(state: &GameState) -> bool {
    let bounds = state.character.bounds();
    match state.tuning.world.floor {
        FloorPolicy::Endless => bounds.top() > state.tuning.world.height,
        FloorPolicy::Ground { y } => bounds.bottom() >= y,
    }
}

fn end_run(state: &mut GameState, cause: EndCause) {
    state.lives = 0;
    state.phase = GamePhase::GameOver;
    state.events.push(GameEvent::GameOver {
        score: state.score,
        cause,
    });
    log::info!("game over ({:?}) with {} points", cause, state.score);
}
