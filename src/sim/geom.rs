//! Axis-aligned boxes for every collidable entity
//!
//! Screen convention: origin top-left, +y points down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (top-left corner + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap: touching edges do not count, any shared area does
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// True when `other` lies entirely inside `self` (shared edges allowed)
    pub fn contains(&self, other: &Aabb) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Grow horizontally by `dx` on each side and vertically by `dy` on each side
    pub fn expanded(&self, dx: f32, dy: f32) -> Aabb {
        Aabb {
            pos: self.pos - Vec2::new(dx, dy),
            size: self.size + Vec2::new(2.0 * dx, 2.0 * dy),
        }
    }
}
