//! Coin and power-up placement inside obstacle gaps
//!
//! Each pair is offered pickups exactly once. Whatever is placed sits fully
//! inside the gap and inside the pipe's horizontal span, so collecting it
//! never requires touching a pipe.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use super::geom::Aabb;
use super::obstacles::{ObstaclePair, pairs};
use super::state::{CoinRarity, Collectible, GameState, IdAllocator, PowerUp, PowerUpKind};
use crate::tuning::{PickupTuning, PowerUpTuning};

/// Arrangement of coins in a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinPattern {
    /// One coin in the middle of the gap
    Single,
    /// Vertical stack on the pipe's centre line
    Column,
    /// Vertical stack alternating between the pipe's left and right edges
    Zigzag,
    /// Two side-by-side columns (falls back to a column on narrow pipes)
    Cluster,
}

impl CoinPattern {
    pub const ALL: [CoinPattern; 4] = [
        CoinPattern::Single,
        CoinPattern::Column,
        CoinPattern::Zigzag,
        CoinPattern::Cluster,
    ];
}

/// Output of one population pass
#[derive(Debug, Clone, Default)]
pub struct PickupBatch {
    pub coins: Vec<Collectible>,
    pub power_ups: Vec<PowerUp>,
    /// Every pair considered this pass, pickups or not
    pub processed: Vec<u32>,
}

pub struct CoinGenerator<'a> {
    tuning: &'a PickupTuning,
    power_ups: &'a PowerUpTuning,
}

impl<'a> CoinGenerator<'a> {
    pub fn new(tuning: &'a PickupTuning, power_ups: &'a PowerUpTuning) -> Self {
        Self { tuning, power_ups }
    }

    /// Populate every pair not yet in `processed`
    pub fn populate<R: Rng>(
        &self,
        pairs: &[ObstaclePair],
        processed: &BTreeSet<u32>,
        difficulty: f32,
        ids: &mut IdAllocator,
        rng: &mut R,
    ) -> PickupBatch {
        let mut batch = PickupBatch::default();

        for pair in pairs {
            let pair_id = pair.pair_id();
            if processed.contains(&pair_id) || batch.processed.contains(&pair_id) {
                continue;
            }
            batch.processed.push(pair_id);

            let gap = pair.gap_box();
            if gap.size.y < self.tuning.min_gap_for_coins {
                continue;
            }

            if rng.random_bool(self.tuning.power_up_chance) {
                if let Some(power_up) = self.place_power_up(pair, &gap, ids, rng) {
                    batch.power_ups.push(power_up);
                    continue;
                }
            }

            let size = self.tuning.coin_size;
            if size > gap.size.x || size > gap.size.y {
                log::warn!("pair {} gap too small for a {}px coin", pair_id, size);
                continue;
            }

            let pattern = CoinPattern::ALL[rng.random_range(0..CoinPattern::ALL.len())];
            let count = rng.random_range(1..=self.max_coins(difficulty));
            for slot in self.layout(&gap, pattern, count) {
                let (rarity, value) = self.roll_tier(rng);
                batch.coins.push(Collectible {
                    id: ids.next_id(),
                    pair: pair_id,
                    pos: slot.pos,
                    size: slot.size,
                    speed: pair.top.speed,
                    value,
                    rarity,
                    is_collected: false,
                });
            }
        }

        batch
    }

    /// Fewer coins per gap as the game speeds up
    pub fn max_coins(&self, difficulty: f32) -> u32 {
        let reduction = ((difficulty - 1.0).max(0.0) / 2.0).floor() as u32;
        self.tuning.max_coins.saturating_sub(reduction).max(1)
    }

    /// Coin boxes for `pattern`, each clamped inside `gap`
    pub fn layout(&self, gap: &Aabb, pattern: CoinPattern, count: u32) -> Vec<Aabb> {
        let size = self.tuning.coin_size;
        let spacing = self.tuning.coin_spacing;
        let step = size + spacing;

        let two_wide = gap.size.x >= 2.0 * size + spacing;
        let (columns, wanted) = match pattern {
            CoinPattern::Single => (1, 1),
            CoinPattern::Cluster if two_wide => (2, count.max(2)),
            _ => (1, count),
        };

        // Rows that fit the gap height
        let max_rows = (((gap.size.y + spacing) / step).floor() as u32).max(1);
        let rows = wanted.div_ceil(columns).min(max_rows);
        let total = (rows * columns).min(wanted.max(1));

        let block_height = rows as f32 * size + (rows.saturating_sub(1)) as f32 * spacing;
        let start_y = (gap.top() + (gap.size.y - block_height) / 2.0).floor();
        let centre_x = (gap.left() + (gap.size.x - size) / 2.0).floor();

        (0..total)
            .map(|i| {
                let row = i / columns;
                let column = i % columns;
                let x = match pattern {
                    CoinPattern::Zigzag if row % 2 == 0 => gap.left(),
                    CoinPattern::Zigzag => gap.right() - size,
                    CoinPattern::Cluster if columns == 2 => {
                        let left = (gap.center().x - size - spacing / 2.0).floor();
                        left + column as f32 * step
                    }
                    _ => centre_x,
                };
                let y = start_y + row as f32 * step;
                clamp_into(Aabb::new(x, y, size, size), gap)
            })
            .collect()
    }

    fn roll_tier<R: Rng>(&self, rng: &mut R) -> (CoinRarity, u64) {
        let total: u32 = self.tuning.tiers.iter().map(|t| t.weight).sum();
        if total == 0 {
            return (CoinRarity::Common, self.tuning.tiers[0].value);
        }
        let mut roll = rng.random_range(0..total);
        for (rarity, tier) in CoinRarity::ALL.iter().zip(self.tuning.tiers.iter()) {
            if roll < tier.weight {
                return (*rarity, tier.value);
            }
            roll -= tier.weight;
        }
        (CoinRarity::Common, self.tuning.tiers[0].value)
    }

    fn place_power_up<R: Rng>(
        &self,
        pair: &ObstaclePair,
        gap: &Aabb,
        ids: &mut IdAllocator,
        rng: &mut R,
    ) -> Option<PowerUp> {
        let size = self.tuning.power_up_size;
        if size > gap.size.x || size > gap.size.y {
            return None;
        }
        let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
        let centre = gap.center();
        let bounds = clamp_into(
            Aabb::new((centre.x - size / 2.0).floor(), (centre.y - size / 2.0).floor(), size, size),
            gap,
        );
        Some(PowerUp {
            id: ids.next_id(),
            pair: pair.pair_id(),
            kind,
            pos: bounds.pos,
            size: bounds.size,
            speed: pair.top.speed,
            is_collected: false,
            duration_ticks: kind.duration_ticks(self.power_ups),
        })
    }
}

/// Shift `item` so it lies inside `container` (item must be the smaller box)
fn clamp_into(item: Aabb, container: &Aabb) -> Aabb {
    let x = item.pos.x.min(container.right() - item.size.x).max(container.left());
    let y = item.pos.y.min(container.bottom() - item.size.y).max(container.top());
    Aabb::from_pos_size(Vec2::new(x, y), item.size)
}

/// Offer pickups to every pair that has not had its pass yet
pub fn spawn_pickups(state: &mut GameState) {
    let fresh: Vec<ObstaclePair> = pairs(&state.obstacles)
        .into_iter()
        .filter(|p| !state.processed_pairs.contains(&p.pair_id()))
        .collect();
    if fresh.is_empty() {
        return;
    }

    let generator = CoinGenerator::new(&state.tuning.pickups, &state.tuning.power_ups);
    let batch = generator.populate(
        &fresh,
        &state.processed_pairs,
        state.difficulty,
        &mut state.ids,
        &mut state.rng,
    );

    log::debug!(
        "pickups: {} coins, {} power-ups over {} pairs",
        batch.coins.len(),
        batch.power_ups.len(),
        batch.processed.len()
    );
    state.processed_pairs.extend(batch.processed);
    state.collectibles.extend(batch.coins);
    state.power_ups.extend(batch.power_ups);
}
