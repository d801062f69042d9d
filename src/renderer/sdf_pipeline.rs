//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in a fragment shader over one fullscreen
//! triangle. Entity state is flattened into storage buffers each frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::assets::SpriteSheet;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState};
use crate::viewport::Letterbox;

/// Maximum number of obstacle pairs drawn
pub const MAX_PIPES: usize = 16;
/// Maximum number of clouds drawn
pub const MAX_CLOUDS: usize = 32;
/// Maximum number of trail ghosts
pub const MAX_TRAIL: usize = 16;
/// Maximum number of gap particles
pub const MAX_PARTICLES: usize = 512;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Globals {
    /// resolution.xy, time, letterbox scale
    pub view: [f32; 4],
    /// Game area in window pixels: x, y, w, h
    pub letterbox: [f32; 4],
    /// width, height, ground_height, ground_offset
    pub field: [f32; 4],
    /// center.xy, angle (degrees), sprite size
    pub bird: [f32; 4],
    /// hitbox w, h, obstacle width, cap height
    pub shapes: [f32; 4],
    /// pipes, clouds, trail, particles
    pub counts: [u32; 4],
    /// show_hitboxes, bird frame, phase, sprite count
    pub flags: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PipeData {
    pub x: f32,
    pub gap_y: f32,
    pub gap_height: f32,
    pub passed: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct CloudData {
    pub pos: [f32; 2],
    pub scale: f32,
    /// Sprite index into the sprite table
    pub sprite: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TrailData {
    /// Sprite center of the ghost
    pub pos: [f32; 2],
    pub alpha: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleData {
    pub pos: [f32; 2],
    pub size: f32,
    pub life: f32,
    pub color: [f32; 4],
}

/// Words per sprite table entry: offset, width, height, loaded
const SPRITE_ENTRY_WORDS: usize = 4;
/// Sprite table index of the first cloud (after the bird frames)
const fn cloud_sprite_index(variant: u8, bird_frames: usize) -> u32 {
    (bird_frames + variant.saturating_sub(1) as usize) as u32
}

/// Pack a sprite sheet into one `u32` array: a table of
/// `[pixel offset, width, height, loaded]` entries, then RGBA8 pixels
/// (red in the low byte, matching `unpack4x8unorm`)
pub fn pack_sprites(sheet: &SpriteSheet) -> Vec<u32> {
    let count = sheet.iter().count();
    let mut words = vec![0u32; count * SPRITE_ENTRY_WORDS];
    for (i, sprite) in sheet.iter().enumerate() {
        let entry = i * SPRITE_ENTRY_WORDS;
        words[entry] = words.len() as u32;
        words[entry + 1] = sprite.width as u32;
        words[entry + 2] = sprite.height as u32;
        words[entry + 3] = u32::from(sprite.loaded);
        words.extend(
            sprite
                .pixels
                .chunks_exact(4)
                .map(|px| u32::from_le_bytes([px[0], px[1], px[2], px[3]])),
        );
    }
    words
}

/// Everything uploaded for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameData {
    pub globals: Globals,
    pub pipes: Vec<PipeData>,
    pub clouds: Vec<CloudData>,
    pub trail: Vec<TrailData>,
    pub particles: Vec<ParticleData>,
}

impl FrameData {
    /// Flatten the game state for the shader
    pub fn build(
        state: &GameState,
        settings: &Settings,
        letterbox: &Letterbox,
        bird_frames: usize,
        sprite_count: usize,
        time: f32,
    ) -> Self {
        let config = &state.config;
        let bird = &state.bird;

        let pipes: Vec<PipeData> = state
            .obstacles
            .iter()
            .take(MAX_PIPES)
            .map(|o| PipeData {
                x: o.x,
                gap_y: o.gap_y,
                gap_height: o.gap_height,
                passed: if o.passed { 1.0 } else { 0.0 },
            })
            .collect();

        let clouds: Vec<CloudData> = if settings.draw_clouds() {
            state
                .background
                .layers
                .iter()
                .flat_map(|layer| layer.clouds.iter())
                .take(MAX_CLOUDS)
                .map(|c| CloudData {
                    pos: c.pos.to_array(),
                    scale: c.scale,
                    sprite: cloud_sprite_index(c.variant, bird_frames),
                })
                .collect()
        } else {
            Vec::new()
        };

        // Newest trail entry sits under the bird itself
        let half = Vec2::splat((config.bird_size / 2.0).floor());
        let ghosts = bird.trail.len().saturating_sub(1);
        let trail: Vec<TrailData> = if settings.trails && state.phase != GamePhase::Start {
            bird.trail
                .iter()
                .take(ghosts.min(MAX_TRAIL))
                .enumerate()
                .map(|(i, p)| TrailData {
                    pos: (*p + half).to_array(),
                    alpha: (i + 1) as f32 / (ghosts + 1) as f32,
                    _pad: 0.0,
                })
                .collect()
        } else {
            Vec::new()
        };

        let max_particles = settings.max_particles().min(MAX_PARTICLES);
        let particles: Vec<ParticleData> = state
            .obstacles
            .iter()
            .flat_map(|o| o.particles.iter())
            .take(max_particles)
            .map(|p| ParticleData {
                pos: p.pos.to_array(),
                size: p.size,
                life: p.life,
                color: [
                    p.color[0] as f32 / 255.0,
                    p.color[1] as f32 / 255.0,
                    p.color[2] as f32 / 255.0,
                    1.0,
                ],
            })
            .collect();

        let center = bird.center(config);
        let phase = match state.phase {
            GamePhase::Start => 0,
            GamePhase::Playing => 1,
            GamePhase::GameOver => 2,
        };

        let globals = Globals {
            view: [
                letterbox.window.0 as f32,
                letterbox.window.1 as f32,
                time,
                letterbox.scale,
            ],
            letterbox: letterbox.as_rect(),
            field: [
                config.width,
                config.height,
                config.ground_height,
                state.background.ground_offset,
            ],
            bird: [center.x, center.y, bird.angle, config.bird_size],
            shapes: [
                bird.hitbox_width,
                bird.hitbox_height,
                config.obstacle_width,
                config.cap_height,
            ],
            counts: [
                pipes.len() as u32,
                clouds.len() as u32,
                trail.len() as u32,
                particles.len() as u32,
            ],
            flags: [
                u32::from(settings.show_hitboxes),
                bird.frame as u32,
                phase,
                sprite_count as u32,
            ],
        };

        Self {
            globals,
            pipes,
            clouds,
            trail,
            particles,
        }
    }
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    pipes_buffer: wgpu::Buffer,
    clouds_buffer: wgpu::Buffer,
    trail_buffer: wgpu::Buffer,
    particles_buffer: wgpu::Buffer,
    /// Immutable after creation; held for the bind group's lifetime
    _sprites_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    /// Logical field size the letterbox is fitted for
    logical: Vec2,
    pub letterbox: Letterbox,
    bird_frames: usize,
    sprite_count: usize,
    start_time: f64,
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        logical: Vec2,
        sprites: &SpriteSheet,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                // Six fragment-stage storage buffers
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let pipes_buffer =
            storage_buffer(&device, "pipes", std::mem::size_of::<PipeData>() * MAX_PIPES);
        let clouds_buffer =
            storage_buffer(&device, "clouds", std::mem::size_of::<CloudData>() * MAX_CLOUDS);
        let trail_buffer =
            storage_buffer(&device, "trail", std::mem::size_of::<TrailData>() * MAX_TRAIL);
        let particles_buffer = storage_buffer(
            &device,
            "particles",
            std::mem::size_of::<ParticleData>() * MAX_PARTICLES,
        );

        let packed = pack_sprites(sprites);
        let sprites_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprites"),
            contents: bytemuck::cast_slice(&packed),
            usage: wgpu::BufferUsages::STORAGE,
        });
        log::info!("Uploaded {} KiB of sprite data", packed.len() * 4 / 1024);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
                storage_entry(5),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pipes_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: clouds_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: trail_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: particles_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: sprites_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            pipes_buffer,
            clouds_buffer,
            trail_buffer,
            particles_buffer,
            _sprites_buffer: sprites_buffer,
            bind_group,
            size: (width, height),
            logical,
            letterbox: Letterbox::fit(logical, (width, height)),
            bird_frames: sprites.bird_frames.len(),
            sprite_count: sprites.iter().count(),
            start_time: 0.0,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.letterbox = Letterbox::fit(self.logical, self.size);
            log::debug!(
                "Letterbox {}x{} at {:?} (scale {:.3})",
                self.letterbox.size.0,
                self.letterbox.size.1,
                self.letterbox.offset,
                self.letterbox.scale
            );
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    fn upload<T: Pod>(&self, buffer: &wgpu::Buffer, data: &[T]) {
        if !data.is_empty() {
            self.queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(data));
        }
    }

    /// Update GPU buffers from game state and render
    pub fn render(
        &mut self,
        state: &GameState,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms from requestAnimationFrame
        let elapsed = ((time - self.start_time) / 1000.0) as f32;

        let frame = FrameData::build(
            state,
            settings,
            &self.letterbox,
            self.bird_frames,
            self.sprite_count,
            elapsed,
        );

        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&frame.globals));
        self.upload(&self.pipes_buffer, &frame.pipes);
        self.upload(&self.clouds_buffer, &frame.clouds);
        self.upload(&self.trail_buffer, &frame.trail);
        self.upload(&self.particles_buffer, &frame.particles);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Sprite;
    use crate::sim::{GameConfig, ObstaclePair, TickInput, tick};

    fn letterbox() -> Letterbox {
        Letterbox::fit(Vec2::new(800.0, 600.0), (1600, 1200))
    }

    #[test]
    fn test_gpu_struct_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<Globals>(), 112);
        assert_eq!(std::mem::size_of::<PipeData>(), 16);
        assert_eq!(std::mem::size_of::<CloudData>(), 16);
        assert_eq!(std::mem::size_of::<TrailData>(), 16);
        assert_eq!(std::mem::size_of::<ParticleData>(), 32);
    }

    #[test]
    fn test_pack_sprites_table_and_pixels() {
        let config = GameConfig::default();
        let mut sheet = SpriteSheet::blank(&config);
        sheet.bird_frames[0] = Sprite {
            width: 1,
            height: 1,
            pixels: vec![1, 2, 3, 255],
            loaded: true,
        };
        let words = pack_sprites(&sheet);

        // 5 table entries, then pixels
        assert_eq!(words[0], 20);
        assert_eq!(&words[1..4], &[1, 1, 1]);
        assert_eq!(words[20], 0xFF03_0201);
        // Second frame starts right after the first
        assert_eq!(words[4], 21);
        assert_eq!(&words[5..8], &[50, 50, 0]);
        assert_eq!(words.len(), 20 + 1 + 50 * 50 + 3 * 100 * 60);
    }

    #[test]
    fn test_frame_data_reflects_state() {
        let config = GameConfig::default();
        let mut state = GameState::new(4, config.clone());
        state.activate();
        state.obstacles.push(ObstaclePair::spawn(600.0, 250.0, 0, &config));
        for _ in 0..6 {
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        }
        let settings = Settings {
            show_hitboxes: true,
            ..Default::default()
        };
        let frame = FrameData::build(&state, &settings, &letterbox(), 2, 5, 1.5);

        assert_eq!(frame.globals.counts[0] as usize, state.obstacles.len());
        assert_eq!(frame.globals.counts[1], 12);
        // Five trail entries, the newest is not a ghost
        assert_eq!(frame.trail.len(), 4);
        assert!(frame.trail.windows(2).all(|w| w[0].alpha < w[1].alpha));
        assert_eq!(frame.globals.flags, [1, state.bird.frame as u32, 1, 5]);
        assert_eq!(frame.globals.letterbox, [0.0, 0.0, 1600.0, 1200.0]);
        assert_eq!(frame.globals.view[3], 2.0);
        assert!(frame.clouds.iter().all(|c| (2..5).contains(&c.sprite)));
    }

    #[test]
    fn test_frame_data_honors_settings() {
        let config = GameConfig::default();
        let mut state = GameState::new(4, config.clone());
        state.activate();
        let mut pair = ObstaclePair::spawn(600.0, 250.0, 0, &config);
        let mut rng = rand_pcg::Pcg32::new(1, 1);
        for _ in 0..50 {
            pair.emit_particle(&mut rng);
        }
        state.obstacles.push(pair);
        state.bird.record_trail(5);
        state.bird.record_trail(5);

        let mut settings = Settings {
            trails: false,
            clouds: false,
            ..Default::default()
        };
        let frame = FrameData::build(&state, &settings, &letterbox(), 2, 5, 0.0);
        assert!(frame.trail.is_empty());
        assert!(frame.clouds.is_empty());
        assert_eq!(frame.particles.len(), 50);

        settings.apply_preset(crate::settings::QualityPreset::Low);
        let frame = FrameData::build(&state, &settings, &letterbox(), 2, 5, 0.0);
        assert!(frame.particles.is_empty());
    }
}
