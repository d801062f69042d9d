//! Tuning constants for a run
//!
//! Every physics and layout constant lives in `GameConfig`, which is held by
//! the game state and handed to each component. Tests build variants of it
//! instead of patching globals.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::background::cloud_bands;
use crate::consts::{LOGICAL_HEIGHT, LOGICAL_WIDTH};

/// Immutable configuration for the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Field ===
    /// Logical field width
    pub width: f32,
    /// Logical field height
    pub height: f32,
    /// Height of the ground band (the ceiling band mirrors it above the field)
    pub ground_height: f32,

    // === Avatar physics ===
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    /// Upward speed set by a flap
    pub flap_strength: f32,
    /// Terminal fall speed
    pub max_fall_speed: f32,

    // === Difficulty ===
    /// Obstacle scroll speed at score 0
    pub base_obstacle_speed: f32,
    /// Scroll speed cap
    pub max_obstacle_speed: f32,
    /// Multiplier increase per point scored
    pub speed_increase_per_point: f32,

    // === Obstacles ===
    /// Horizontal distance between consecutive obstacle pairs
    pub spacing: f32,
    /// Vertical opening between the top and bottom bodies
    pub gap_height: f32,
    /// Minimum clearance between a gap and the ceiling/ground
    pub gap_margin: f32,
    pub obstacle_width: f32,
    /// End-cap height, collidable on both bodies
    pub cap_height: f32,
    /// Per-tick chance that an obstacle emits a decorative particle
    pub particle_chance: f64,

    // === Avatar shape ===
    /// Sprite edge length
    pub bird_size: f32,
    /// Sprite top-left at run start
    pub bird_start: [f32; 2],
    pub hitbox_width_ratio: f32,
    pub hitbox_height_ratio: f32,
    /// Points sampled along each rectangle edge by the collision test
    pub edge_samples: usize,

    // === Avatar presentation ===
    /// Real-time seconds per animation frame
    pub animation_frame_time: f32,
    pub animation_frames: u8,
    pub trail_length: usize,
    pub min_tilt: f32,
    pub max_tilt: f32,
    /// Degrees of tilt per unit of velocity
    pub tilt_per_velocity: f32,
    pub tilt_damping: f32,

    // === Terminal collision ===
    /// Weight of the pre-tick position when snapping after a crash
    pub collision_snap: f32,

    // === Background ===
    pub cloud_layer_speeds: [f32; 3],
    pub cloud_layer_scales: [f32; 3],
    pub clouds_per_layer: usize,
    pub cloud_scale_range: [f32; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: LOGICAL_WIDTH,
            height: LOGICAL_HEIGHT,
            ground_height: 100.0,

            gravity: 600.0,
            flap_strength: 250.0,
            max_fall_speed: 400.0,

            base_obstacle_speed: 200.0,
            max_obstacle_speed: 400.0,
            speed_increase_per_point: 0.1,

            spacing: 300.0,
            gap_height: 200.0,
            gap_margin: 50.0,
            obstacle_width: 80.0,
            cap_height: 30.0,
            particle_chance: 0.1,

            bird_size: 50.0,
            bird_start: [200.0, LOGICAL_HEIGHT / 2.0],
            hitbox_width_ratio: 0.6,
            hitbox_height_ratio: 0.5,
            edge_samples: 8,

            animation_frame_time: 0.1,
            animation_frames: 2,
            trail_length: 5,
            min_tilt: -30.0,
            max_tilt: 90.0,
            tilt_per_velocity: 0.2,
            tilt_damping: 10.0,

            collision_snap: 0.5,

            cloud_layer_speeds: [30.0, 60.0, 90.0],
            cloud_layer_scales: [1.2, 1.0, 0.8],
            clouds_per_layer: 4,
            cloud_scale_range: [0.7, 1.3],
        }
    }
}

impl GameConfig {
    /// Parse JSON overrides on top of the defaults, then validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Ratio of the maximum to the base scroll speed (the multiplier cap)
    #[inline]
    pub fn max_speed_multiplier(&self) -> f32 {
        self.max_obstacle_speed / self.base_obstacle_speed
    }

    /// Inclusive integer range gap centers are drawn from
    pub fn gap_center_range(&self) -> (i32, i32) {
        let half_gap = (self.gap_height / 2.0).floor();
        let low = (half_gap + self.gap_margin) as i32;
        let high = (self.height - self.ground_height - half_gap - self.gap_margin) as i32;
        (low, high)
    }

    /// Elliptical hitbox size (whole units, like the sprite grid)
    pub fn hitbox_size(&self) -> (f32, f32) {
        (
            (self.bird_size * self.hitbox_width_ratio).trunc(),
            (self.bird_size * self.hitbox_height_ratio).trunc(),
        )
    }

    /// Reject configurations the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("ground_height", self.ground_height),
            ("gravity", self.gravity),
            ("flap_strength", self.flap_strength),
            ("max_fall_speed", self.max_fall_speed),
            ("base_obstacle_speed", self.base_obstacle_speed),
            ("spacing", self.spacing),
            ("gap_height", self.gap_height),
            ("obstacle_width", self.obstacle_width),
            ("bird_size", self.bird_size),
            ("animation_frame_time", self.animation_frame_time),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.max_obstacle_speed < self.base_obstacle_speed {
            return Err(ConfigError::SpeedCapBelowBase {
                base: self.base_obstacle_speed,
                max: self.max_obstacle_speed,
            });
        }
        if self.speed_increase_per_point < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "speed_increase_per_point",
                value: self.speed_increase_per_point,
            });
        }
        if self.ground_height >= self.height {
            return Err(ConfigError::GroundTooTall {
                ground: self.ground_height,
                height: self.height,
            });
        }
        let (low, high) = self.gap_center_range();
        if low > high {
            return Err(ConfigError::EmptyGapBand { low, high });
        }
        if self.edge_samples < 2 {
            return Err(ConfigError::TooFewEdgeSamples(self.edge_samples));
        }
        if self.trail_length == 0 {
            return Err(ConfigError::ZeroTrailLength);
        }
        if self.animation_frames == 0 {
            return Err(ConfigError::ZeroAnimationFrames);
        }
        if self.min_tilt > self.max_tilt {
            return Err(ConfigError::InvertedTilt {
                min: self.min_tilt,
                max: self.max_tilt,
            });
        }
        if !(0.0..=1.0).contains(&self.collision_snap) {
            return Err(ConfigError::SnapOutOfRange(self.collision_snap));
        }
        if !(0.0..=1.0).contains(&self.particle_chance) {
            return Err(ConfigError::ChanceOutOfRange(self.particle_chance));
        }
        if cloud_bands(self.height).iter().any(|(low, high)| low > high) {
            return Err(ConfigError::SkyTooShort(self.height));
        }
        let [min_scale, max_scale] = self.cloud_scale_range;
        if !(min_scale > 0.0 && min_scale <= max_scale) {
            return Err(ConfigError::BadCloudScale {
                min: min_scale,
                max: max_scale,
            });
        }
        Ok(())
    }
}

/// Startup configuration errors
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    NotPositive { field: &'static str, value: f32 },
    SpeedCapBelowBase { base: f32, max: f32 },
    GroundTooTall { ground: f32, height: f32 },
    EmptyGapBand { low: i32, high: i32 },
    TooFewEdgeSamples(usize),
    ZeroTrailLength,
    ZeroAnimationFrames,
    InvertedTilt { min: f32, max: f32 },
    SnapOutOfRange(f32),
    ChanceOutOfRange(f64),
    SkyTooShort(f32),
    BadCloudScale { min: f32, max: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be positive (got {value})")
            }
            Self::SpeedCapBelowBase { base, max } => {
                write!(f, "max_obstacle_speed {max} is below base_obstacle_speed {base}")
            }
            Self::GroundTooTall { ground, height } => {
                write!(f, "ground_height {ground} leaves no room in a field of height {height}")
            }
            Self::EmptyGapBand { low, high } => {
                write!(f, "no room for gap centers (band {low}..={high})")
            }
            Self::TooFewEdgeSamples(n) => write!(f, "edge_samples must be at least 2 (got {n})"),
            Self::ZeroTrailLength => write!(f, "trail_length must be at least 1"),
            Self::ZeroAnimationFrames => write!(f, "animation_frames must be at least 1"),
            Self::InvertedTilt { min, max } => {
                write!(f, "min_tilt {min} is greater than max_tilt {max}")
            }
            Self::SnapOutOfRange(v) => write!(f, "collision_snap must be within [0, 1] (got {v})"),
            Self::ChanceOutOfRange(v) => {
                write!(f, "particle_chance must be within [0, 1] (got {v})")
            }
            Self::SkyTooShort(height) => {
                write!(f, "height {height} is too short for the cloud layers")
            }
            Self::BadCloudScale { min, max } => {
                write!(f, "cloud_scale_range [{min}, {max}] must be positive and ordered")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
