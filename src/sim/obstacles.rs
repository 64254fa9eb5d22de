//! Obstacle pair generation and spawn gating
//!
//! Every pair leaving this module has passed `validate`: both pipes have
//! length, they do not overlap, and the gap is never below the configured
//! minimum. Geometry is snapped to whole pixels so the gap arithmetic is exact.

use glam::Vec2;
use rand::Rng;

use super::geom::Aabb;
use super::state::{GameEvent, GameState, Obstacle, ObstacleId, PipeSide};
use crate::tuning::ObstacleTuning;

/// Where the fallback split puts the gap top, as a share of world height
const FALLBACK_GAP_TOP: f32 = 0.3;

/// A validated top/bottom pipe pair
#[derive(Debug, Clone)]
pub struct ObstaclePair {
    pub top: Obstacle,
    pub bottom: Obstacle,
}

impl ObstaclePair {
    pub fn pair_id(&self) -> u32 {
        self.top.id.pair
    }

    pub fn gap_top(&self) -> f32 {
        self.top.pos.y + self.top.size.y
    }

    pub fn gap_bottom(&self) -> f32 {
        self.bottom.pos.y
    }

    pub fn gap_size(&self) -> f32 {
        self.gap_bottom() - self.gap_top()
    }

    /// The traversable box: the gap's vertical span over the pipe's horizontal span
    pub fn gap_box(&self) -> Aabb {
        Aabb::new(self.top.pos.x, self.gap_top(), self.top.size.x, self.gap_size())
    }
}

/// Builds obstacle pairs from difficulty-scaled parameters
pub struct ObstacleGenerator<'a> {
    tuning: &'a ObstacleTuning,
}

impl<'a> ObstacleGenerator<'a> {
    pub fn new(tuning: &'a ObstacleTuning) -> Self {
        Self { tuning }
    }

    /// Gap height, never below `min_gap`
    pub fn gap_size(&self, difficulty: f32) -> f32 {
        let t = self.tuning;
        (t.base_gap - difficulty * t.shrink_per_difficulty).max(t.min_gap).ceil()
    }

    pub fn pipe_width(&self, difficulty: f32) -> f32 {
        let t = self.tuning;
        (t.base_width + difficulty * t.width_growth).min(t.max_width).round()
    }

    pub fn pipe_speed(&self, difficulty: f32) -> f32 {
        let t = self.tuning;
        (t.base_speed + difficulty * t.speed_growth).min(t.max_speed)
    }

    /// Time between spawns, shrinking with difficulty down to `min_interval_ms`
    pub fn spawn_interval_ms(&self, difficulty: f32) -> f32 {
        let t = self.tuning;
        (t.base_interval_ms - difficulty * t.interval_per_difficulty_ms).max(t.min_interval_ms)
    }

    /// Generate a pair entering at the right edge of the world.
    ///
    /// `previous_gap_top` keeps consecutive gaps within reach of each other.
    /// Returns `None` only when even the fallback split cannot fit the world.
    pub fn generate<R: Rng>(
        &self,
        pair: u32,
        world_width: f32,
        world_height: f32,
        difficulty: f32,
        previous_gap_top: Option<f32>,
        rng: &mut R,
    ) -> Option<ObstaclePair> {
        let t = self.tuning;
        let gap = self.gap_size(difficulty);
        let width = self.pipe_width(difficulty);
        let speed = self.pipe_speed(difficulty);

        let lo = t.gap_margin.ceil();
        let hi = (world_height - gap - t.gap_margin).floor();
        let (mut range_lo, mut range_hi) = (lo, hi);
        if let Some(prev) = previous_gap_top {
            let near_lo = range_lo.max((prev - t.max_gap_shift).ceil());
            let near_hi = range_hi.min((prev + t.max_gap_shift).floor());
            if near_lo <= near_hi {
                range_lo = near_lo;
                range_hi = near_hi;
            }
        }
        let gap_top = if range_lo < range_hi {
            rng.random_range(range_lo..=range_hi).round()
        } else {
            range_lo
        };
        let gap_top = gap_top.min(hi).max(lo);

        let candidate = self.build(pair, world_width, world_height, gap_top, gap, width, speed);
        if self.validate(&candidate) {
            return Some(candidate);
        }

        log::warn!(
            "pair {} failed validation (gap_top={}, gap={}), using fallback split",
            pair,
            gap_top,
            gap
        );
        let fallback_top = (world_height * FALLBACK_GAP_TOP).round();
        let fallback = self.build(
            pair,
            world_width,
            world_height,
            fallback_top,
            t.min_gap.ceil(),
            width,
            speed,
        );
        if self.validate(&fallback) {
            Some(fallback)
        } else {
            None
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        pair: u32,
        x: f32,
        world_height: f32,
        gap_top: f32,
        gap: f32,
        width: f32,
        speed: f32,
    ) -> ObstaclePair {
        let bottom_y = gap_top + gap;
        let pipe = |side: PipeSide, y: f32, height: f32| Obstacle {
            id: ObstacleId { pair, side },
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
            speed,
            prev_x: x,
            rotation: None,
            cap_overhang: self.tuning.cap_overhang,
            cap_height: self.tuning.cap_height,
        };
        ObstaclePair {
            top: pipe(PipeSide::Top, 0.0, gap_top),
            bottom: pipe(PipeSide::Bottom, bottom_y, world_height - bottom_y),
        }
    }

    /// Check the pair is physically sound and leaves at least `min_gap` open
    pub fn validate(&self, pair: &ObstaclePair) -> bool {
        let top = &pair.top;
        let bottom = &pair.bottom;
        top.size.y > 0.0
            && bottom.size.y > 0.0
            && bottom.pos.y >= top.pos.y + top.size.y
            && pair.gap_size() >= self.tuning.min_gap
    }
}

/// Spawn gate: interval elapsed, previous pair far enough left, right edge clear
pub fn can_spawn(state: &GameState) -> bool {
    let t = &state.tuning.obstacles;
    let world_width = state.tuning.world.width;
    let generator = ObstacleGenerator::new(t);

    let interval = generator.spawn_interval_ms(state.difficulty) as f64;
    let timed = state
        .last_spawn_ms
        .is_none_or(|last| state.elapsed_ms - last >= interval);

    let spaced = state
        .last_obstacle_x
        .is_none_or(|x| x < world_width * (1.0 - t.min_spacing_fraction));

    let edge_clear = !state
        .obstacles
        .iter()
        .any(|o| o.pos.x + o.size.x > world_width - t.edge_margin);

    timed && spaced && edge_clear
}

/// Try to add one obstacle pair to the world. Returns the new pair id.
///
/// Retries once at reduced difficulty; a second failure skips this spawn
/// cycle rather than emitting a broken pair.
pub fn spawn_pair(state: &mut GameState) -> Option<u32> {
    if !can_spawn(state) {
        return None;
    }

    let pair = state.next_entity_id();
    let world_width = state.tuning.world.width;
    let world_height = state.tuning.world.height;
    let difficulty = state.difficulty;
    let previous = state.last_gap_top;

    let generator = ObstacleGenerator::new(&state.tuning.obstacles);
    let generated = generator
        .generate(pair, world_width, world_height, difficulty, previous, &mut state.rng)
        .or_else(|| {
            let eased = (difficulty - 1.0).max(1.0);
            log::warn!("pair {} retrying at difficulty {:.2}", pair, eased);
            generator.generate(pair, world_width, world_height, eased, previous, &mut state.rng)
        });

    state.last_spawn_ms = Some(state.elapsed_ms);

    match generated {
        Some(new_pair) => {
            log::debug!(
                "spawned pair {} gap_top={} gap={} speed={:.2}",
                pair,
                new_pair.gap_top(),
                new_pair.gap_size(),
                new_pair.top.speed
            );
            state.events.push(GameEvent::PairSpawned {
                pair,
                gap_top: new_pair.gap_top(),
                gap_size: new_pair.gap_size(),
            });
            state.last_gap_top = Some(new_pair.gap_top());
            state.last_obstacle_x = Some(new_pair.top.pos.x);
            state.obstacles.push(new_pair.top);
            state.obstacles.push(new_pair.bottom);
            Some(pair)
        }
        None => {
            log::warn!("pair {} skipped: no valid layout fits the world", pair);
            state.events.push(GameEvent::SpawnSkipped);
            None
        }
    }
}

/// Rebuild pairs from the flat obstacle list (top followed by its bottom)
pub fn pairs(obstacles: &[Obstacle]) -> Vec<ObstaclePair> {
    obstacles
        .iter()
        .filter(|o| o.is_top())
        .filter_map(|top| {
            obstacles
                .iter()
                .find(|b| b.id.pair == top.id.pair && b.id.side == PipeSide::Bottom)
                .map(|bottom| ObstaclePair {
                    top: top.clone(),
                    bottom: bottom.clone(),
                })
        })
        .collect()
}
