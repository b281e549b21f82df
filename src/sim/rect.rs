//! Axis-aligned bounding boxes
//!
//! Every collision in the game is a box overlap test. Edges that merely
//! touch do not overlap.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, `pos` is the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
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
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }

    /// Shrink by `amount` on every edge (never below zero size)
    pub fn inset(&self, amount: f32) -> Rect {
        let shrink = Vec2::splat(amount).min(self.size * 0.5);
        Rect {
            pos: self.pos + shrink,
            size: self.size - shrink * 2.0,
        }
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }
}
