//! The player's bird: gravity integration, tilt, animation and hitbox

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Ellipse, Rect, ellipse_rect_collision};
use super::config::GameConfig;
use super::difficulty::speed_multiplier;

/// The player-controlled avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    /// Sprite top-left corner
    pub pos: Vec2,
    /// Vertical velocity (positive = falling)
    pub velocity: f32,
    /// Tilt in degrees (positive = nose down)
    pub angle: f32,
    /// Current animation frame
    pub frame: u8,
    /// Unscaled real time since the last frame change
    pub animation_time: f32,
    /// Elliptical hitbox size
    pub hitbox_width: f32,
    pub hitbox_height: f32,
    /// Recent positions, oldest first
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,
}

impl Bird {
    /// Fresh bird at the configured start position, at rest
    pub fn new(config: &GameConfig) -> Self {
        let (hitbox_width, hitbox_height) = config.hitbox_size();
        Self {
            pos: Vec2::from(config.bird_start),
            velocity: 0.0,
            angle: 0.0,
            frame: 0,
            animation_time: 0.0,
            hitbox_width,
            hitbox_height,
            trail: VecDeque::with_capacity(config.trail_length + 1),
        }
    }

    /// Launch upward. Flap strength does not scale with difficulty.
    pub fn flap(&mut self, config: &GameConfig) {
        self.velocity = -config.flap_strength;
    }

    /// Advance by `dt` seconds of real time at the given score
    pub fn update(&mut self, dt: f32, score: u32, config: &GameConfig) {
        // Scaling time rather than gravity keeps the arc shape at every speed
        let scaled_dt = dt * speed_multiplier(score, config);

        self.velocity = (self.velocity + config.gravity * scaled_dt).min(config.max_fall_speed);
        self.pos.y += self.velocity * scaled_dt;

        self.animation_time += dt;
        if self.animation_time > config.animation_frame_time {
            self.frame = (self.frame + 1) % config.animation_frames;
            self.animation_time = 0.0;
        }

        let target = (self.velocity * config.tilt_per_velocity).clamp(config.min_tilt, config.max_tilt);
        let blend = (scaled_dt * config.tilt_damping).min(1.0);
        self.angle += (target - self.angle) * blend;

        self.record_trail(config.trail_length);
    }

    /// Push the current position, dropping the oldest beyond `max_len`
    pub fn record_trail(&mut self, max_len: usize) {
        self.trail.push_back(self.pos);
        while self.trail.len() > max_len {
            self.trail.pop_front();
        }
    }

    /// Sprite center, which is also the hitbox center
    pub fn center(&self, config: &GameConfig) -> Vec2 {
        self.pos + Vec2::splat((config.bird_size / 2.0).floor())
    }

    /// Hitbox ellipse, rotated with the sprite
    pub fn hitbox(&self, config: &GameConfig) -> Ellipse {
        Ellipse {
            center: self.center(config),
            width: self.hitbox_width,
            height: self.hitbox_height,
            rotation_deg: -self.angle,
        }
    }

    /// Sampled hitbox vs. rectangle test
    pub fn collides_with(&self, rect: &Rect, config: &GameConfig) -> bool {
        ellipse_rect_collision(&self.hitbox(config), rect, config.edge_samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_bird_at_rest() {
        let config = GameConfig::default();
        let bird = Bird::new(&config);
        assert_eq!(bird.pos, Vec2::new(200.0, 300.0));
        assert_eq!(bird.velocity, 0.0);
        assert_eq!(bird.angle, 0.0);
        assert!(bird.trail.is_empty());
        assert_eq!(bird.center(&config), Vec2::new(225.0, 325.0));
    }

    #[test]
    fn test_flap_sets_upward_velocity() {
        let config = GameConfig::default();
        let mut bird = Bird::new(&config);
        bird.velocity = 380.0;
        bird.flap(&config);
        assert_eq!(bird.velocity, -250.0);
        bird.flap(&config);
        assert_eq!(bird.velocity, -250.0);
    }

    #[test]
    fn test_gravity_integration() {
        let config = GameConfig::default();
        let mut bird = Bird::new(&config);
        bird.update(0.1, 0, &config);
        assert!((bird.velocity - 60.0).abs() < 1e-4);
        assert!((bird.pos.y - 306.0).abs() < 1e-4);
        assert_eq!(bird.pos.x, 200.0);
    }

    #[test]
    fn test_difficulty_scales_timestep_not_constants() {
        let config = GameConfig::default();
        let mut slow = Bird::new(&config);
        let mut fast = Bird::new(&config);
        slow.update(0.02, 0, &config);
        fast.update(0.01, 10, &config);
        assert!((slow.velocity - fast.velocity).abs() < 1e-4);
        assert!((slow.pos.y - fast.pos.y).abs() < 1e-4);
    }

    #[test]
    fn test_animation_uses_unscaled_time() {
        let config = GameConfig::default();
        let mut bird = Bird::new(&config);
        // At the speed cap, 0.06s of real time is still under one frame period
        bird.update(0.06, 50, &config);
        assert_eq!(bird.frame, 0);
        bird.update(0.06, 50, &config);
        assert_eq!(bird.frame, 1);
        assert_eq!(bird.animation_time, 0.0);
        for _ in 0..2 {
            bird.update(0.06, 50, &config);
        }
        assert_eq!(bird.frame, 0);
    }

    #[test]
    fn test_trail_keeps_last_five_oldest_first() {
        let config = GameConfig::default();
        let mut bird = Bird::new(&config);
        let mut seen = Vec::new();
        for _ in 0..8 {
            bird.update(1.0 / 60.0, 0, &config);
            seen.push(bird.pos);
        }
        assert_eq!(bird.trail.len(), 5);
        let kept: Vec<Vec2> = bird.trail.iter().copied().collect();
        assert_eq!(kept, seen[3..].to_vec());
    }

    #[test]
    fn test_tilt_follows_velocity() {
        let config = GameConfig::default();
        let mut bird = Bird::new(&config);
        bird.flap(&config);
        for _ in 0..5 {
            bird.update(1.0 / 60.0, 0, &config);
        }
        assert!(bird.angle < 0.0);
        for _ in 0..120 {
            bird.update(1.0 / 60.0, 0, &config);
        }
        assert!(bird.angle > 70.0);
        assert!(bird.angle <= 90.0);
    }

    #[test]
    fn test_hitbox_rotation_mirrors_tilt() {
        let config = GameConfig::default();
        let mut bird = Bird::new(&config);
        bird.angle = 45.0;
        let hitbox = bird.hitbox(&config);
        assert_eq!(hitbox.rotation_deg, -45.0);
        assert_eq!((hitbox.width, hitbox.height), (30.0, 25.0));
    }

    proptest! {
        #[test]
        fn prop_velocity_never_exceeds_fall_cap(
            steps in proptest::collection::vec((0.0f32..2.0, 0u32..40, any::<bool>()), 1..200),
        ) {
            let config = GameConfig::default();
            let mut bird = Bird::new(&config);
            for (dt, score, flap) in steps {
                if flap {
                    bird.flap(&config);
                }
                bird.update(dt, score, &config);
                prop_assert!(bird.velocity <= config.max_fall_speed);
                prop_assert!(bird.angle >= config.min_tilt - 1e-3);
                prop_assert!(bird.angle <= config.max_tilt + 1e-3);
                prop_assert!(bird.trail.len() <= config.trail_length);
            }
        }
    }
}
