//! Parallax cloud layers and the scrolling ground strip
//!
//! Pure dressing: nothing here feeds back into collisions or scoring.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use super::difficulty::speed_multiplier;

/// Clouds wrap once this far past the left edge
const CLOUD_WRAP_MARGIN: f32 = 200.0;
/// Wrapped clouds re-enter this far past the right edge
const CLOUD_REENTRY_OFFSET: f32 = 100.0;

/// Base cloud sprite size before scaling
pub const CLOUD_BASE_SIZE: Vec2 = Vec2::new(100.0, 60.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub pos: Vec2,
    pub scale: f32,
    /// Sprite variant (1-3)
    pub variant: u8,
}

impl Cloud {
    pub fn size(&self) -> Vec2 {
        CLOUD_BASE_SIZE * self.scale
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudLayer {
    pub base_speed: f32,
    /// Scroll offset in [0, width)
    pub offset: f32,
    pub clouds: Vec<Cloud>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Background {
    pub layers: Vec<CloudLayer>,
    /// Ground strip scroll offset in [0, width)
    pub ground_offset: f32,
}

/// Vertical range each cloud layer is scattered over, far layer first
pub(crate) fn cloud_bands(field_height: f32) -> [(f32, f32); 3] {
    [
        (50.0, field_height / 3.0),
        (30.0, field_height / 3.0),
        (20.0, field_height / 4.0),
    ]
}

impl Background {
    /// Scatter the clouds; `config` must have passed `validate`
    pub fn new<R: Rng>(rng: &mut R, config: &GameConfig) -> Self {
        let y_bands = cloud_bands(config.height);
        let [min_scale, max_scale] = config.cloud_scale_range;

        let layers = (0..3)
            .map(|i| {
                let (y_min, y_max) = y_bands[i];
                let clouds = (0..config.clouds_per_layer)
                    .map(|_| Cloud {
                        pos: Vec2::new(
                            rng.random_range(0.0..=config.width).floor(),
                            rng.random_range(y_min..=y_max).floor(),
                        ),
                        scale: config.cloud_layer_scales[i] * rng.random_range(min_scale..=max_scale),
                        variant: rng.random_range(1..=3),
                    })
                    .collect();
                CloudLayer {
                    base_speed: config.cloud_layer_speeds[i],
                    offset: 0.0,
                    clouds,
                }
            })
            .collect();

        Self {
            layers,
            ground_offset: 0.0,
        }
    }

    /// Scroll every layer and the ground at the difficulty-scaled speed
    pub fn update(&mut self, dt: f32, score: u32, config: &GameConfig) {
        let multiplier = speed_multiplier(score, config);

        for layer in &mut self.layers {
            let speed = layer.base_speed * multiplier;
            layer.offset = (layer.offset - speed * dt).rem_euclid(config.width);
            for cloud in &mut layer.clouds {
                cloud.pos.x -= speed * dt;
                if cloud.pos.x + CLOUD_WRAP_MARGIN < 0.0 {
                    cloud.pos.x = config.width + CLOUD_REENTRY_OFFSET;
                }
            }
        }

        let ground_speed = config.base_obstacle_speed * multiplier;
        self.ground_offset = (self.ground_offset - ground_speed * dt).rem_euclid(config.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn background() -> (Background, GameConfig) {
        let config = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(11);
        (Background::new(&mut rng, &config), config)
    }

    #[test]
    fn test_layers_and_clouds_in_bounds() {
        let (bg, config) = background();
        assert_eq!(bg.layers.len(), 3);
        for (i, layer) in bg.layers.iter().enumerate() {
            assert_eq!(layer.clouds.len(), 4);
            assert_eq!(layer.base_speed, config.cloud_layer_speeds[i]);
            for cloud in &layer.clouds {
                assert!((1..=3).contains(&cloud.variant));
                assert!(cloud.pos.x >= 0.0 && cloud.pos.x <= config.width);
                assert!(cloud.pos.y <= config.height / 3.0);
                let base = config.cloud_layer_scales[i];
                assert!(cloud.scale >= base * 0.7 - 1e-4 && cloud.scale <= base * 1.3 + 1e-4);
            }
        }
    }

    #[test]
    fn test_ground_scrolls_with_difficulty_and_wraps() {
        let (mut bg, config) = background();
        bg.update(0.5, 0, &config);
        assert!((bg.ground_offset - 700.0).abs() < 1e-3);
        bg.update(0.5, 10, &config);
        assert!((bg.ground_offset - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_clouds_wrap_to_right_edge() {
        let (mut bg, config) = background();
        bg.layers[0].clouds[0].pos.x = -199.0;
        bg.update(0.1, 0, &config);
        assert_eq!(bg.layers[0].clouds[0].pos.x, config.width + 100.0);
    }
}
