//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Variable timestep, supplied by the caller
//! - Seeded RNG only (gameplay and decoration on separate streams)
//! - Obstacles processed in spawn order
//! - No rendering or platform dependencies

pub mod avatar;
pub mod background;
pub mod collision;
pub mod config;
pub mod difficulty;
pub mod obstacle;
pub mod state;
pub mod tick;

pub use avatar::Bird;
pub use background::{Background, Cloud, CloudLayer};
pub use collision::{Ellipse, Rect, ellipse_rect_collision};
pub use config::{ConfigError, GameConfig};
pub use difficulty::speed_multiplier;
pub use obstacle::{ObstaclePair, Particle};
pub use state::{CrashCause, GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
