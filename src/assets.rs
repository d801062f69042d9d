//! Sprite loading
//!
//! Images are looked up by logical name (`flying/frame-1`, `cloud2`, ...) and
//! scaled to the size the game draws them at. Loading never fails from the
//! caller's point of view: any missing or undecodable PNG becomes a fully
//! transparent placeholder of the requested size, and the renderer draws a
//! procedural shape in its place.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use image::imageops::{self, FilterType};

use crate::sim::GameConfig;
use crate::sim::background::CLOUD_BASE_SIZE;

/// Bird animation frames, in frame order
pub const BIRD_FRAMES: [&str; 2] = ["flying/frame-1", "flying/frame-2"];
/// Cloud variants 1-3
pub const CLOUD_VARIANTS: [&str; 3] = ["cloud1", "cloud2", "cloud3"];

/// Path of an image relative to the asset root
pub fn asset_path(name: &str) -> String {
    format!("images/{name}.png")
}

/// RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub width: usize,
    pub height: usize,
    /// Row-major RGBA, top row first
    pub pixels: Vec<u8>,
    /// False for placeholders standing in for a missing or broken image
    pub loaded: bool,
}

impl Sprite {
    /// Fully transparent stand-in
    pub fn placeholder(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
            loaded: false,
        }
    }

    /// Decode PNG bytes and scale to exactly `width` x `height`
    pub fn decode_scaled(bytes: &[u8], width: usize, height: usize) -> image::ImageResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let scaled = imageops::resize(&rgba, width as u32, height as u32, FilterType::Nearest);
        Ok(Self {
            width,
            height,
            pixels: scaled.into_raw(),
            loaded: true,
        })
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

#[derive(Debug)]
pub enum AssetError {
    NotFound(String),
    Io { name: String, source: std::io::Error },
    Decode { name: String, source: image::ImageError },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "asset '{name}' not found"),
            Self::Io { name, source } => write!(f, "failed to read asset '{name}': {source}"),
            Self::Decode { name, source } => write!(f, "failed to decode asset '{name}': {source}"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::NotFound(_) => None,
        }
    }
}

/// Where raw image bytes come from
pub trait AssetSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, AssetError>;
}

/// Images on the local filesystem under `<root>/images/`
#[derive(Debug, Clone)]
pub struct DirSource {
    pub root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.root.join(asset_path(name));
        std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(path.display().to_string())
            } else {
                AssetError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })
    }
}

/// Preloaded images (the web frontend fills this from HTTP fetches)
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}

/// Load an image and scale it to `size`, or fall back to a transparent placeholder
pub fn load_scaled(source: &dyn AssetSource, name: &str, size: (usize, usize)) -> Sprite {
    let (width, height) = size;
    let decoded = source.fetch(name).and_then(|bytes| {
        Sprite::decode_scaled(&bytes, width, height).map_err(|source| AssetError::Decode {
            name: name.to_string(),
            source,
        })
    });
    match decoded {
        Ok(sprite) => sprite,
        Err(err) => {
            log::warn!("{err}. Using a blank {width}x{height} placeholder.");
            Sprite::placeholder(width, height)
        }
    }
}

/// Every sprite the renderer draws
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub bird_frames: Vec<Sprite>,
    pub clouds: Vec<Sprite>,
}

impl SpriteSheet {
    pub fn load(source: &dyn AssetSource, config: &GameConfig) -> Self {
        let bird = config.bird_size as usize;
        let cloud = (CLOUD_BASE_SIZE.x as usize, CLOUD_BASE_SIZE.y as usize);
        let sheet = Self {
            bird_frames: BIRD_FRAMES
                .iter()
                .map(|name| load_scaled(source, name, (bird, bird)))
                .collect(),
            clouds: CLOUD_VARIANTS
                .iter()
                .map(|name| load_scaled(source, name, cloud))
                .collect(),
        };
        log::info!(
            "Loaded {}/{} sprites",
            sheet.loaded_count(),
            BIRD_FRAMES.len() + CLOUD_VARIANTS.len()
        );
        sheet
    }

    /// All placeholders, for frontends without assets
    pub fn blank(config: &GameConfig) -> Self {
        let bird = config.bird_size as usize;
        Self {
            bird_frames: vec![Sprite::placeholder(bird, bird); BIRD_FRAMES.len()],
            clouds: vec![
                Sprite::placeholder(CLOUD_BASE_SIZE.x as usize, CLOUD_BASE_SIZE.y as usize);
                CLOUD_VARIANTS.len()
            ],
        }
    }

    /// Bird frames, then clouds
    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.bird_frames.iter().chain(self.clouds.iter())
    }

    /// Sprites that came from a real image
    pub fn loaded_count(&self) -> usize {
        self.iter().filter(|s| s.loaded).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| Rgba(pixel(x, y)));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];

    #[test]
    fn test_png_is_scaled_to_requested_size() {
        // Left half red, right half green
        let bytes = png(2, 1, |x, _| if x == 0 { RED } else { GREEN });
        let sprite = Sprite::decode_scaled(&bytes, 4, 2).unwrap();
        assert!(sprite.loaded);
        assert_eq!((sprite.width, sprite.height), (4, 2));
        assert_eq!(sprite.pixels.len(), 4 * 2 * 4);
        assert_eq!(sprite.pixel(0, 0), RED);
        assert_eq!(sprite.pixel(1, 1), RED);
        assert_eq!(sprite.pixel(3, 0), GREEN);
    }

    #[test]
    fn test_missing_asset_gives_sized_placeholder() {
        let source = MemorySource::new();
        let sprite = load_scaled(&source, "flying/frame-1", (50, 50));
        assert_eq!((sprite.width, sprite.height), (50, 50));
        assert!(!sprite.loaded);
        assert!(sprite.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_undecodable_asset_gives_placeholder() {
        let mut source = MemorySource::new();
        source.insert("cloud1", b"definitely not an image".to_vec());
        let sprite = load_scaled(&source, "cloud1", (100, 60));
        assert_eq!(sprite.pixels.len(), 100 * 60 * 4);
        assert!(!sprite.loaded);
    }

    #[test]
    fn test_transparent_png_still_counts_as_loaded() {
        let mut source = MemorySource::new();
        source.insert("cloud2", png(4, 4, |_, _| [0, 0, 0, 0]));
        let sprite = load_scaled(&source, "cloud2", (100, 60));
        assert!(sprite.loaded);
        assert!(sprite.pixels.chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn test_dir_source_missing_file() {
        let source = DirSource::new("/nonexistent-flapline-assets");
        assert!(matches!(source.fetch("cloud1"), Err(AssetError::NotFound(_))));
        assert_eq!(asset_path("flying/frame-2"), "images/flying/frame-2.png");
    }

    #[test]
    fn test_sprite_sheet_mixes_loaded_and_placeholders() {
        let mut source = MemorySource::new();
        source.insert("flying/frame-1", png(2, 2, |_, _| RED));
        let config = GameConfig::default();
        let sheet = SpriteSheet::load(&source, &config);

        assert_eq!(sheet.bird_frames.len(), 2);
        assert_eq!(sheet.clouds.len(), 3);
        assert_eq!(sheet.bird_frames[0].width, 50);
        assert!(sheet.bird_frames[0].loaded);
        assert!(!sheet.bird_frames[1].loaded);
        assert!(sheet.clouds.iter().all(|c| (c.width, c.height) == (100, 60)));
        assert_eq!(sheet.iter().count(), 5);
        assert_eq!(sheet.loaded_count(), 1);
    }
}
