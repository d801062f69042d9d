//! Obstacle pairs: spawning, scrolling, collision bodies and pass tracking

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::config::GameConfig;
use super::difficulty::speed_multiplier;

/// A decorative particle drifting in an obstacle's gap (not gameplay-affecting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Seconds remaining
    pub life: f32,
    pub color: [u8; 3],
}

/// A top/bottom obstacle pair with a vertical gap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstaclePair {
    /// Left edge; only ever decreases
    pub x: f32,
    /// Gap center
    pub gap_y: f32,
    pub gap_height: f32,
    pub width: f32,
    pub cap_height: f32,
    /// Set once the avatar has overtaken this pair
    pub passed: bool,
    /// Score the scroll speed is derived from, refreshed on every update
    pub score: u32,
    #[serde(skip)]
    pub particles: Vec<Particle>,
}

impl ObstaclePair {
    /// New pair at `x` with its gap centered on `gap_y`
    pub fn spawn(x: f32, gap_y: f32, score: u32, config: &GameConfig) -> Self {
        Self {
            x,
            gap_y,
            gap_height: config.gap_height,
            width: config.obstacle_width,
            cap_height: config.cap_height,
            passed: false,
            score,
            particles: Vec::new(),
        }
    }

    /// Scroll left at the difficulty-scaled speed and age particles
    pub fn update(&mut self, dt: f32, score: u32, config: &GameConfig) {
        self.score = score;
        self.x -= self.speed(config) * dt;

        for particle in self.particles.iter_mut() {
            particle.life -= dt;
            particle.pos += particle.vel * dt;
            particle.size *= 0.95;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Current leftward speed
    pub fn speed(&self, config: &GameConfig) -> f32 {
        config.base_obstacle_speed * speed_multiplier(self.score, config)
    }

    /// Top and bottom bodies, each extended by its end cap
    pub fn collision_rects(&self, field_height: f32) -> (Rect, Rect) {
        let half_gap = self.gap_height / 2.0;
        let top = Rect::new(self.x, 0.0, self.width, self.gap_y - half_gap + self.cap_height);
        let bottom_y = self.gap_y + half_gap - self.cap_height;
        let bottom = Rect::new(self.x, bottom_y, self.width, field_height - bottom_y);
        (top, bottom)
    }

    /// One-shot pass detection: true exactly once, when `x` falls left of `avatar_x`
    pub fn mark_passed_if(&mut self, avatar_x: f32) -> bool {
        if !self.passed && self.x < avatar_x {
            self.passed = true;
            return true;
        }
        false
    }

    /// Right edge has left the field
    #[inline]
    pub fn is_off_screen(&self) -> bool {
        self.x < -self.width
    }

    /// Emit one particle somewhere in the gap
    pub fn emit_particle<R: Rng>(&mut self, rng: &mut R) {
        let half_gap = self.gap_height / 2.0;
        self.particles.push(Particle {
            pos: Vec2::new(
                self.x + rng.random_range(0.0..=self.width),
                self.gap_y + rng.random_range(-half_gap..=half_gap),
            ),
            vel: Vec2::new(rng.random_range(-20.0..=20.0), rng.random_range(-20.0..=20.0)),
            size: rng.random_range(2.0..=4.0),
            life: rng.random_range(0.3..=0.8),
            color: [
                rng.random_range(200..=255),
                rng.random_range(200..=255),
                rng.random_range(200..=255),
            ],
        });
    }
}

/// Spawn cadence: none alive, or the newest has scrolled past `width - spacing`
pub fn should_spawn(obstacles: &[ObstaclePair], config: &GameConfig) -> bool {
    obstacles
        .last()
        .is_none_or(|newest| newest.x < config.width - config.spacing)
}

/// Gap center drawn uniformly from the safe band
pub fn random_gap_center<R: Rng>(rng: &mut R, config: &GameConfig) -> f32 {
    let (low, high) = config.gap_center_range();
    rng.random_range(low..=high) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_scrolls_with_difficulty() {
        let config = GameConfig::default();
        let mut pair = ObstaclePair::spawn(800.0, 300.0, 0, &config);
        pair.update(0.5, 0, &config);
        assert!((pair.x - 700.0).abs() < 1e-4);
        pair.update(0.5, 10, &config);
        assert!((pair.x - 500.0).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_score_sets_initial_speed() {
        let config = GameConfig::default();
        let pair = ObstaclePair::spawn(800.0, 300.0, 10, &config);
        assert!((pair.speed(&config) - 400.0).abs() < 1e-3);
        let fresh = ObstaclePair::spawn(800.0, 300.0, 0, &config);
        assert!((fresh.speed(&config) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_collision_rects_include_caps() {
        let config = GameConfig::default();
        let pair = ObstaclePair::spawn(300.0, 250.0, 0, &config);
        let (top, bottom) = pair.collision_rects(config.height);
        assert_eq!(top, Rect::new(300.0, 0.0, 80.0, 180.0));
        assert_eq!(bottom, Rect::new(300.0, 320.0, 80.0, 280.0));
        assert_eq!(bottom.bottom(), config.height);
    }

    #[test]
    fn test_mark_passed_fires_once() {
        let config = GameConfig::default();
        let mut pair = ObstaclePair::spawn(250.0, 250.0, 0, &config);
        assert!(!pair.mark_passed_if(200.0));
        pair.x = 199.0;
        assert!(pair.mark_passed_if(200.0));
        assert!(!pair.mark_passed_if(200.0));
        pair.x = -50.0;
        assert!(!pair.mark_passed_if(200.0));
    }

    #[test]
    fn test_off_screen_after_right_edge_leaves() {
        let config = GameConfig::default();
        let mut pair = ObstaclePair::spawn(-80.0, 250.0, 0, &config);
        assert!(!pair.is_off_screen());
        pair.x = -80.5;
        assert!(pair.is_off_screen());
    }

    #[test]
    fn test_spawn_cadence() {
        let config = GameConfig::default();
        let mut obstacles = Vec::new();
        assert!(should_spawn(&obstacles, &config));
        obstacles.push(ObstaclePair::spawn(800.0, 250.0, 0, &config));
        assert!(!should_spawn(&obstacles, &config));
        obstacles[0].x = 500.0;
        assert!(!should_spawn(&obstacles, &config));
        obstacles[0].x = 499.9;
        assert!(should_spawn(&obstacles, &config));
    }

    #[test]
    fn test_gap_centers_stay_in_safe_band() {
        let config = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..1000 {
            let y = random_gap_center(&mut rng, &config);
            assert!((150.0..=350.0).contains(&y));
            assert_eq!(y.fract(), 0.0);
        }
    }

    #[test]
    fn test_particles_age_out() {
        let config = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pair = ObstaclePair::spawn(400.0, 250.0, 0, &config);
        for _ in 0..10 {
            pair.emit_particle(&mut rng);
        }
        let p = &pair.particles[0];
        assert!(p.pos.x >= 400.0 && p.pos.x <= 480.0);
        assert!(p.pos.y >= 150.0 && p.pos.y <= 350.0);
        pair.update(0.2, 0, &config);
        assert!(pair.particles.len() == 10);
        pair.update(0.7, 0, &config);
        assert!(pair.particles.is_empty());
    }
}
