//! Flapline - a side-scrolling flap-and-dodge arcade game
//!
//! Core modules:
//! - `sim`: Simulation (physics, collisions, obstacle lifecycle, game flow)
//! - `renderer`: WebGPU rendering pipeline
//! - `viewport`: Letterbox scaling of the logical field into the window
//! - `assets`: Sprite loading with transparent placeholders
//! - `settings`: Presentation preferences

pub mod assets;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod viewport;

pub use settings::{QualityPreset, Settings};
pub use viewport::Letterbox;

use glam::Vec2;

/// Frame pacing constants shared by the frontends
pub mod consts {
    /// Target frame rate (one simulation tick per rendered frame)
    pub const TARGET_FPS: u32 = 60;
    /// Nominal frame duration at the target rate
    pub const FRAME_DT: f32 = 1.0 / TARGET_FPS as f32;
    /// Frontends clamp frame hitches to this before ticking
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Logical resolution the game is simulated and drawn at
    pub const LOGICAL_WIDTH: f32 = 800.0;
    pub const LOGICAL_HEIGHT: f32 = 600.0;
}

/// Rotate `point` around `center` by `angle_deg` degrees
#[inline]
pub fn rotate_about(point: Vec2, center: Vec2, angle_deg: f32) -> Vec2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let d = point - center;
    Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos) + center
}

/// Weighted blend of two points: `t` is the weight of `a` (t = 1 gives `a`)
#[inline]
pub fn lerp_point(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a * t + b * (1.0 - t)
}
