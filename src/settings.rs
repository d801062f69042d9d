//! Presentation preferences
//!
//! Persisted in LocalStorage on the web. Nothing here reaches the simulation.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Case-insensitive lookup by name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// The preset after this one, wrapping around
    pub fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Gap particles uploaded per frame
    pub fn particle_budget(&self) -> usize {
        match self {
            Self::Low => 32,
            Self::Medium => 128,
            Self::High => 512,
        }
    }

    pub fn clouds_enabled(&self) -> bool {
        *self != Self::Low
    }
}

/// Presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Outline the avatar hitbox and obstacle bodies
    pub show_hitboxes: bool,
    /// Ghosted trail behind the avatar
    pub trails: bool,
    /// Particles drifting in obstacle gaps
    pub particles: bool,
    /// Parallax cloud layers
    pub clouds: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            show_hitboxes: false,
            trails: true,
            particles: true,
            clouds: true,
        }
    }
}

impl Settings {
    /// Switch preset; particles follow it (off on Low, back on otherwise)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.particles = preset != QualityPreset::Low;
    }

    /// Effective particle cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.particle_budget()
        }
    }

    /// Effective cloud toggle
    pub fn draw_clouds(&self) -> bool {
        self.clouds && self.quality.clouds_enabled()
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "flapline_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Failed to save settings");
                } else {
                    log::info!("Settings saved");
                }
            }
        }
    }

    /// Native builds keep defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}
