//! Score-driven difficulty scaling

use super::config::GameConfig;

/// Speed multiplier for a score: `min(1 + score * K, max / base)`
///
/// Scales obstacle, ground and parallax scroll speeds, and the avatar's
/// physics timestep.
#[inline]
pub fn speed_multiplier(score: u32, config: &GameConfig) -> f32 {
    (1.0 + score as f32 * config.speed_increase_per_point).min(config.max_speed_multiplier())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_multiplier_at_zero_is_one() {
        assert_eq!(speed_multiplier(0, &GameConfig::default()), 1.0);
    }

    #[test]
    fn test_multiplier_reaches_cap_at_ten_points() {
        let config = GameConfig::default();
        assert!((speed_multiplier(5, &config) - 1.5).abs() < 1e-6);
        assert_eq!(speed_multiplier(10, &config), 2.0);
        assert_eq!(speed_multiplier(10_000, &config), 2.0);
    }

    proptest! {
        #[test]
        fn prop_multiplier_bounded_and_monotonic(score in 0u32..1_000_000) {
            let config = GameConfig::default();
            let m = speed_multiplier(score, &config);
            prop_assert!(m >= 1.0);
            prop_assert!(m <= config.max_speed_multiplier());
            prop_assert!(speed_multiplier(score + 1, &config) >= m);
        }

        #[test]
        fn prop_multiplier_saturates(
            increment in 0.01f32..1.0,
            max_speed in 200.0f32..2000.0,
            extra in 0u32..10_000,
        ) {
            let config = GameConfig {
                speed_increase_per_point: increment,
                max_obstacle_speed: max_speed,
                ..Default::default()
            };
            let cap = config.max_speed_multiplier();
            // One point past the exact threshold absorbs f32 rounding
            let saturation = ((cap - 1.0) / increment).ceil() as u32 + 1;
            prop_assert_eq!(speed_multiplier(saturation + extra, &config), cap);
        }
    }
}
