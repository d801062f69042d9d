//! Letterbox scaling of the logical field into a physical window

use glam::Vec2;

/// Uniformly scaled, centered placement of the logical field inside a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    /// Top-left of the game area in window pixels
    pub offset: (u32, u32),
    /// Game area size in window pixels
    pub size: (u32, u32),
    /// Window size the placement was computed for
    pub window: (u32, u32),
}

impl Letterbox {
    /// Fit `logical` (width, height) into a `window` of physical pixels
    pub fn fit(logical: Vec2, window: (u32, u32)) -> Self {
        let (ww, wh) = window;
        let scale = (ww as f32 / logical.x).min(wh as f32 / logical.y);
        let sw = ((logical.x * scale) as u32).min(ww);
        let sh = ((logical.y * scale) as u32).min(wh);
        Self {
            scale,
            offset: ((ww - sw) / 2, (wh - sh) / 2),
            size: (sw, sh),
            window,
        }
    }

    /// Map a window pixel to logical coordinates; None on the black bars
    pub fn to_logical(&self, point: Vec2) -> Option<Vec2> {
        let local = point - Vec2::new(self.offset.0 as f32, self.offset.1 as f32);
        if local.x < 0.0
            || local.y < 0.0
            || local.x >= self.size.0 as f32
            || local.y >= self.size.1 as f32
            || self.scale <= 0.0
        {
            return None;
        }
        Some(local / self.scale)
    }

    /// Game area as `[x, y, w, h]` in window pixels (shader uniform layout)
    pub fn as_rect(&self) -> [f32; 4] {
        [
            self.offset.0 as f32,
            self.offset.1 as f32,
            self.size.0 as f32,
            self.size.1 as f32,
        ]
    }
}
