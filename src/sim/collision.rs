//! Collision geometry: axis-aligned rectangles and the rotated elliptical hitbox
//!
//! The ellipse/rectangle test is an edge-sampling approximation: points spread
//! along each rectangle edge are tested against the ellipse, then the ellipse
//! center is tested against the rectangle. A rectangle the ellipse pokes into
//! between two samples, without covering the center, is not detected. Gameplay
//! is tuned against this behavior, so it stays sampling-based.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::rotate_about;

/// Axis-aligned rectangle in field coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Half-open containment: the right and bottom edges are outside
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// `n` evenly spaced points along each edge, in top, bottom, left, right order
    pub fn edge_samples(&self, n: usize) -> impl Iterator<Item = Vec2> + '_ {
        let step = move |i: usize| i as f32 / (n - 1).max(1) as f32;
        let top = (0..n).map(move |i| Vec2::new(self.left() + self.w * step(i), self.top()));
        let bottom = (0..n).map(move |i| Vec2::new(self.left() + self.w * step(i), self.bottom()));
        let left = (0..n).map(move |i| Vec2::new(self.left(), self.top() + self.h * step(i)));
        let right = (0..n).map(move |i| Vec2::new(self.right(), self.top() + self.h * step(i)));
        top.chain(bottom).chain(left).chain(right)
    }
}

/// Ellipse with full axis lengths `width` x `height`, rotated by `rotation_deg`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub rotation_deg: f32,
}

impl Ellipse {
    /// Map a point into the ellipse's unrotated, centered, unit-scaled frame
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        let unrotated = rotate_about(p, self.center, -self.rotation_deg) - self.center;
        Vec2::new(unrotated.x / (self.width / 2.0), unrotated.y / (self.height / 2.0))
    }

    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.to_local(p).length_squared() <= 1.0
    }
}

/// Sampled ellipse vs. rectangle overlap test (short-circuits on the first hit)
pub fn ellipse_rect_collision(ellipse: &Ellipse, rect: &Rect, samples_per_edge: usize) -> bool {
    rect.edge_samples(samples_per_edge)
        .any(|p| ellipse.contains_point(p))
        || rect.contains_point(ellipse.center)
}
