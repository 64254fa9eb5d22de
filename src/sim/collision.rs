//! Collision detection and scoring for one tick
//!
//! `resolve` is read-only: it reports what happened and the tick applies it.
//! Obstacle hits are exact AABB tests against the pipe body and its wider cap.

use std::collections::BTreeSet;

use super::difficulty::pass_points;
use super::geom::Aabb;
use super::state::{Character, Collectible, Obstacle, ObstacleId, PowerUp};

/// World view the resolver needs
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub character: &'a Character,
    pub obstacles: &'a [Obstacle],
    pub collectibles: &'a [Collectible],
    pub power_ups: &'a [PowerUp],
    /// Top pipes already scored
    pub passed: &'a BTreeSet<ObstacleId>,
    pub difficulty: f32,
}

/// Result of a resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Character overlaps an obstacle this tick
    pub hit: bool,
    /// The hit ends the run
    pub fatal: bool,
    /// The hit was taken by the shield
    pub shield_absorbed: bool,
    pub collected_coins: Vec<u32>,
    pub collected_power_ups: Vec<u32>,
    pub newly_passed: Vec<ObstacleId>,
    pub score_delta: u64,
}

/// First obstacle whose body or cap overlaps `bounds`
pub fn obstacle_hit(bounds: &Aabb, obstacles: &[Obstacle]) -> Option<ObstacleId> {
    obstacles
        .iter()
        .find(|o| o.hitboxes().iter().any(|h| h.overlaps(bounds)))
        .map(|o| o.id)
}

/// Character's leading edge moved from at-or-before the midpoint to past it
#[inline]
pub fn crossed_midpoint(character_right: f32, obstacle: &Obstacle) -> bool {
    character_right <= obstacle.prev_mid_x() && character_right > obstacle.mid_x()
}

/// Evaluate the updated world against the character
pub fn resolve(input: ResolveInput<'_>) -> Resolution {
    let mut result = Resolution::default();
    let character = input.character;
    let bounds = character.bounds();

    if let Some(id) = obstacle_hit(&bounds, input.obstacles) {
        result.hit = true;
        // Grace ticks after an absorbed hit ignore further contact
        if !character.is_hurt() {
            if character.has_shield {
                result.shield_absorbed = true;
            } else {
                log::debug!("fatal contact with pipe {:?}", id);
                result.fatal = true;
            }
        }
    }

    // Pass-through scoring: top member only, once per pair
    let right = bounds.right();
    let points = pass_points(input.difficulty);
    for obstacle in input.obstacles.iter().filter(|o| o.is_top()) {
        if input.passed.contains(&obstacle.id) || result.newly_passed.contains(&obstacle.id) {
            continue;
        }
        if crossed_midpoint(right, obstacle) {
            result.newly_passed.push(obstacle.id);
            result.score_delta += points;
        }
    }

    for coin in input.collectibles.iter().filter(|c| !c.is_collected) {
        if coin.bounds().overlaps(&bounds) {
            result.collected_coins.push(coin.id);
            result.score_delta += coin.value;
        }
    }

    for power_up in input.power_ups.iter().filter(|p| !p.is_collected) {
        if power_up.bounds().overlaps(&bounds) {
            result.collected_power_ups.push(power_up.id);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{CoinRarity, PipeSide, PowerUpKind};
    use glam::Vec2;

    fn character(x: f32, y: f32) -> Character {
        Character::new(Vec2::new(x, y), Vec2::splat(50.0))
    }

    fn pipe(pair: u32, side: PipeSide, x: f32, y: f32, w: f32, h: f32) -> Obstacle {
        Obstacle {
            id: ObstacleId { pair, side },
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
            speed: 3.0,
            prev_x: x,
            rotation: None,
            cap_overhang: 0.0,
            cap_height: 0.0,
        }
    }

    fn coin(id: u32, x: f32, y: f32, collected: bool) -> Collectible {
        Collectible {
            id,
            pair: 1,
            pos: Vec2::new(x, y),
            size: Vec2::splat(30.0),
            speed: 3.0,
            value: 10,
            rarity: CoinRarity::Common,
            is_collected: collected,
        }
    }

    fn input<'a>(
        character: &'a Character,
        obstacles: &'a [Obstacle],
        collectibles: &'a [Collectible],
        power_ups: &'a [PowerUp],
        passed: &'a BTreeSet<ObstacleId>,
    ) -> ResolveInput<'a> {
        ResolveInput {
            character,
            obstacles,
            collectibles,
            power_ups,
            passed,
            difficulty: 1.0,
        }
    }

    #[test]
    fn test_overlap_is_fatal_without_shield() {
        let c = character(100.0, 100.0);
        let obstacles = [pipe(1, PipeSide::Bottom, 120.0, 120.0, 30.0, 30.0)];
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &obstacles, &[], &[], &passed));
        assert!(result.hit);
        assert!(result.fatal);
        assert!(!result.shield_absorbed);
    }

    #[test]
    fn test_shield_absorbs_hit() {
        let mut c = character(100.0, 100.0);
        c.has_shield = true;
        let obstacles = [pipe(1, PipeSide::Bottom, 120.0, 120.0, 30.0, 30.0)];
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &obstacles, &[], &[], &passed));
        assert!(result.hit);
        assert!(!result.fatal);
        assert!(result.shield_absorbed);
    }

    #[test]
    fn test_grace_period_ignores_contact() {
        let mut c = character(100.0, 100.0);
        c.hurt_ticks = 10;
        let obstacles = [pipe(1, PipeSide::Bottom, 120.0, 120.0, 30.0, 30.0)];
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &obstacles, &[], &[], &passed));
        assert!(result.hit);
        assert!(!result.fatal);
        assert!(!result.shield_absorbed);
    }

    #[test]
    fn test_cap_overhang_is_part_of_hitbox() {
        // Character sits just left of the body but inside the cap overhang
        let c = character(100.0, 100.0);
        let mut top = pipe(1, PipeSide::Top, 152.0, 0.0, 80.0, 130.0);
        top.cap_overhang = 4.0;
        top.cap_height = 24.0;
        assert!(!top.body().overlaps(&c.bounds()));
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &[top], &[], &[], &passed));
        assert!(result.fatal);
    }

    #[test]
    fn test_no_hit_in_gap() {
        let c = character(100.0, 200.0);
        let obstacles = [
            pipe(1, PipeSide::Top, 110.0, 0.0, 80.0, 150.0),
            pipe(1, PipeSide::Bottom, 110.0, 400.0, 80.0, 200.0),
        ];
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &obstacles, &[], &[], &passed));
        assert!(!result.hit);
        assert!(!result.fatal);
    }

    #[test]
    fn test_pass_scores_top_member_once() {
        // Character right edge at 150; pipe midpoint moves from 151 to 148
        let c = character(100.0, 200.0);
        let mut top = pipe(1, PipeSide::Top, 108.0, 0.0, 80.0, 150.0);
        top.prev_x = 111.0;
        let mut bottom = pipe(1, PipeSide::Bottom, 108.0, 400.0, 80.0, 200.0);
        bottom.prev_x = 111.0;
        let obstacles = [top, bottom];

        let mut passed = BTreeSet::new();
        let result = resolve(input(&c, &obstacles, &[], &[], &passed));
        assert_eq!(result.newly_passed, vec![ObstacleId { pair: 1, side: PipeSide::Top }]);
        assert_eq!(result.score_delta, 1);

        // Replaying the same tick with the id recorded scores nothing
        passed.extend(result.newly_passed);
        let replay = resolve(input(&c, &obstacles, &[], &[], &passed));
        assert!(replay.newly_passed.is_empty());
        assert_eq!(replay.score_delta, 0);
    }

    #[test]
    fn test_pass_points_scale_with_difficulty() {
        let c = character(100.0, 200.0);
        let mut top = pipe(1, PipeSide::Top, 108.0, 0.0, 80.0, 150.0);
        top.prev_x = 111.0;
        let obstacles = [top];
        let passed = BTreeSet::new();
        let mut view = input(&c, &obstacles, &[], &[], &passed);
        view.difficulty = 4.2;
        assert_eq!(resolve(view).score_delta, 3);
    }

    #[test]
    fn test_no_score_without_crossing() {
        let c = character(100.0, 200.0);
        // Midpoint already behind the character on both ticks
        let mut top = pipe(1, PipeSide::Top, 20.0, 0.0, 80.0, 150.0);
        top.prev_x = 23.0;
        let obstacles = [top];
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &obstacles, &[], &[], &passed));
        assert!(result.newly_passed.is_empty());
    }

    #[test]
    fn test_collects_coins_once() {
        let c = character(100.0, 100.0);
        let coins = [coin(7, 120.0, 110.0, false), coin(8, 120.0, 110.0, true), coin(9, 400.0, 400.0, false)];
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &[], &coins, &[], &passed));
        assert_eq!(result.collected_coins, vec![7]);
        assert_eq!(result.score_delta, 10);
    }

    #[test]
    fn test_collects_power_up() {
        let c = character(100.0, 100.0);
        let power_up = PowerUp {
            id: 3,
            pair: 1,
            kind: PowerUpKind::Magnet,
            pos: Vec2::new(110.0, 110.0),
            size: Vec2::splat(36.0),
            speed: 3.0,
            is_collected: false,
            duration_ticks: 100,
        };
        let mut collected = power_up.clone();
        collected.id = 4;
        collected.is_collected = true;
        let passed = BTreeSet::new();
        let result = resolve(input(&c, &[], &[], &[power_up, collected], &passed));
        assert_eq!(result.collected_power_ups, vec![3]);
        assert_eq!(result.score_delta, 0);
    }
}
