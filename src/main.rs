//! Flapline entry point
//!
//! The web build runs the game in a canvas. The native build runs a headless
//! session (autopilot by default) and prints a run summary.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use flapline::assets::{self, BIRD_FRAMES, CLOUD_VARIANTS, MemorySource, SpriteSheet};
    use flapline::consts::*;
    use flapline::renderer::SdfRenderState;
    use flapline::sim::{GameConfig, GameEvent, GamePhase, GameState, TickInput, tick};
    use flapline::{QualityPreset, Settings};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        render_state: Option<SdfRenderState>,
        last_time: f64,
        input: TickInput,
        /// Frames left on the score "pop" highlight
        score_pop: u32,
    }

    impl Game {
        fn new(seed: u64, settings: Settings) -> Self {
            Self {
                state: GameState::new(seed, GameConfig::default()),
                settings,
                render_state: None,
                last_time: 0.0,
                input: TickInput::default(),
                score_pop: 0,
            }
        }

        /// One simulation step per displayed frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            let input = self.input;
            tick(&mut self.state, &input, dt);

            // Activate is one-shot
            self.input.activate = false;

            self.score_pop = self.score_pop.saturating_sub(1);
            for event in &self.state.events {
                if let GameEvent::Scored { .. } = event {
                    self.score_pop = 12;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, &self.settings, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.state.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-score") {
                let class = if self.score_pop > 0 { "hud-item pop" } else { "hud-item" };
                let _ = el.set_attribute("class", class);
            }

            if let Some(el) = document.query_selector("#hud-speed .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("x{:.2}", self.state.speed_multiplier())));
            }

            if let Some(el) = document.get_element_by_id("hud-autopilot") {
                let class = if self.input.autopilot { "hud-item" } else { "hud-item hidden" };
                let _ = el.set_attribute("class", class);
            }

            if let Some(el) = document.get_element_by_id("start-prompt") {
                let class = if self.state.phase == GamePhase::Start { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }

            if let Some(el) = document.get_element_by_id("game-over") {
                if self.state.phase == GamePhase::GameOver {
                    let _ = el.set_attribute("class", "");
                    if let Some(score_el) = document.get_element_by_id("final-score") {
                        score_el.set_text_content(Some(&self.state.score.to_string()));
                    }
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }

        /// Whether a point in CSS pixels (relative to the canvas) lands on the
        /// game area rather than the letterbox bars
        fn in_game_area(&self, css_x: f32, css_y: f32) -> bool {
            let Some(ref render_state) = self.render_state else {
                return true;
            };
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio()) as f32;
            render_state
                .letterbox
                .to_logical(glam::Vec2::new(css_x, css_y) * dpr)
                .is_some()
        }

        fn cycle_quality(&mut self) {
            let next = self.settings.quality.next();
            self.settings.apply_preset(next);
            self.settings.save();
            log::info!("Quality: {}", next.as_str());
        }
    }

    /// Session overrides from the page URL: `?show-hitboxes` and `?quality=<preset>`
    fn apply_url_overrides(window: &web_sys::Window, settings: &mut Settings) {
        let Some(params) = window
            .location()
            .search()
            .ok()
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
        else {
            return;
        };

        if params.has("show-hitboxes") {
            settings.show_hitboxes = true;
            log::info!("Hitbox overlay enabled from URL");
        }
        if let Some(name) = params.get("quality") {
            match QualityPreset::parse(&name) {
                Some(preset) => {
                    settings.apply_preset(preset);
                    log::info!("Quality from URL: {}", preset.as_str());
                }
                None => log::warn!("Unknown quality preset '{name}'"),
            }
        }
    }

    async fn fetch_bytes(window: &web_sys::Window, url: &str) -> Result<Vec<u8>, JsValue> {
        let response: web_sys::Response =
            JsFuture::from(window.fetch_with_str(url)).await?.dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
        }
        let buffer = JsFuture::from(response.array_buffer()?).await?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }

    /// Fetch every image up front; missing ones fall back to placeholders
    async fn prefetch_assets(window: &web_sys::Window) -> MemorySource {
        let mut source = MemorySource::new();
        for name in BIRD_FRAMES.iter().chain(CLOUD_VARIANTS.iter()) {
            let url = assets::asset_path(name);
            match fetch_bytes(window, &url).await {
                Ok(bytes) => source.insert(*name, bytes),
                Err(e) => log::warn!("Could not fetch {url}: {e:?}"),
            }
        }
        log::info!("Fetched {} images", source.len());
        source
    }

    /// Canvas size in physical pixels
    fn canvas_pixels(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        (
            (canvas.client_width() as f64 * dpr) as u32,
            (canvas.client_height() as f64 * dpr) as u32,
        )
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Flapline starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;

        let (width, height) = canvas_pixels(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let mut settings = Settings::load();
        apply_url_overrides(&window, &mut settings);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, settings)));
        log::info!("Game initialized with seed: {}", seed);

        let source = prefetch_assets(&window).await;
        let sprites = SpriteSheet::load(&source, &game.borrow().state.config);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&format!("Failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("Failed to get adapter: {e}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let logical = glam::Vec2::new(LOGICAL_WIDTH, LOGICAL_HEIGHT);
        match SdfRenderState::new(surface, &adapter, width, height, logical, &sprites).await {
            Ok(mut render_state) => {
                render_state.set_start_time(js_sys::Date::now());
                game.borrow_mut().render_state = Some(render_state);
            }
            // Keep simulating with the DOM HUD only
            Err(e) => log::error!("Renderer unavailable: {e}"),
        }

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }
        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        setup_input_handlers(&canvas, game.clone())?;
        setup_resize_handler(canvas, game.clone())?;

        request_animation_frame(game);

        log::info!("Flapline running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        // Mouse click
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.in_game_area(event.offset_x() as f32, event.offset_y() as f32) {
                    g.input.activate = true;
                }
            });
            canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                let rect = canvas_clone.get_bounding_client_rect();
                let x = touch.client_x() as f32 - rect.left() as f32;
                let y = touch.client_y() as f32 - rect.top() as f32;
                let mut g = game.borrow_mut();
                if g.in_game_area(x, y) {
                    g.input.activate = true;
                }
            });
            canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => {
                        // Keep the page from scrolling
                        event.prevent_default();
                        if !event.repeat() {
                            g.input.activate = true;
                        }
                    }
                    "a" | "A" => {
                        g.input.autopilot = !g.input.autopilot;
                        log::info!("Autopilot: {}", g.input.autopilot);
                    }
                    "h" | "H" => {
                        g.settings.show_hitboxes = !g.settings.show_hitboxes;
                        g.settings.save();
                        log::info!("Hitboxes: {}", g.settings.show_hitboxes);
                    }
                    "q" | "Q" => g.cycle_quality(),
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_resize_handler(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = canvas_pixels(&window, &canvas);
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(ref mut render_state) = game.borrow_mut().render_state {
                render_state.resize(width, height);
            }
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                FRAME_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use anyhow::{Context, Result, ensure};
    use clap::Parser;
    use serde::Serialize;

    use flapline::assets::{DirSource, SpriteSheet};
    use flapline::consts::FRAME_DT;
    use flapline::sim::{CrashCause, GameConfig, GameEvent, GamePhase, GameState, TickInput, tick};

    /// Run a headless Flapline session and report how it went
    #[derive(Parser, Debug)]
    #[command(name = "flapline", version, about)]
    pub struct Args {
        /// Log avatar and obstacle hitboxes whenever an event fires
        #[arg(long)]
        pub show_hitboxes: bool,

        /// RNG seed (defaults to the current time)
        #[arg(long)]
        pub seed: Option<u64>,

        /// Simulated seconds before the session stops
        #[arg(long, default_value_t = 30.0)]
        pub seconds: f32,

        /// Start the run and then never flap
        #[arg(long)]
        pub no_autopilot: bool,

        /// JSON file overriding gameplay constants
        #[arg(long, value_name = "JSON")]
        pub config: Option<PathBuf>,

        /// Directory containing images/ to validate sprite loading
        #[arg(long, value_name = "DIR")]
        pub assets: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        pub summary_json: bool,
    }

    #[derive(Debug, Serialize)]
    struct RunSummary {
        seed: u64,
        frames: u64,
        seconds: f32,
        phase: GamePhase,
        score: u32,
        crash: Option<CrashCause>,
        flaps: u32,
        speed_multiplier: f32,
        sprites_loaded: usize,
    }

    fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
        let Some(path) = path else {
            return Ok(GameConfig::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = GameConfig::from_json(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn log_hitboxes(state: &GameState) {
        let hitbox = state.bird.hitbox(&state.config);
        log::info!(
            "avatar ellipse center=({:.1}, {:.1}) size={:.1}x{:.1} rotation={:.1}",
            hitbox.center.x,
            hitbox.center.y,
            hitbox.width,
            hitbox.height,
            hitbox.rotation_deg
        );
        for pair in &state.obstacles {
            let (top, bottom) = pair.collision_rects(state.config.height);
            log::info!(
                "obstacle top=({:.1}, {:.1}, {:.1}, {:.1}) bottom=({:.1}, {:.1}, {:.1}, {:.1})",
                top.x,
                top.y,
                top.w,
                top.h,
                bottom.x,
                bottom.y,
                bottom.w,
                bottom.h
            );
        }
    }

    pub fn run(args: Args) -> Result<()> {
        ensure!(
            args.seconds.is_finite() && args.seconds > 0.0,
            "--seconds must be positive"
        );

        let config = load_config(args.config.as_ref())?;

        let sprites_loaded = match &args.assets {
            Some(dir) => {
                ensure!(dir.is_dir(), "asset directory {} not found", dir.display());
                let sheet = SpriteSheet::load(&DirSource::new(dir), &config);
                sheet.loaded_count()
            }
            None => 0,
        };

        let seed = args.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default()
        });
        log::info!("Seed: {seed}");

        let mut state = GameState::new(seed, config);
        let total_frames = (args.seconds / FRAME_DT).ceil() as u64;
        let mut frames = 0;
        let mut flaps = 0;
        let mut crash = None;

        while frames < total_frames {
            let input = TickInput {
                activate: args.no_autopilot && frames == 0,
                autopilot: !args.no_autopilot,
            };
            tick(&mut state, &input, FRAME_DT);
            frames += 1;

            for event in &state.events {
                log::debug!("frame {frames}: {event:?}");
                match event {
                    GameEvent::Flapped => flaps += 1,
                    GameEvent::Crashed { cause, .. } => crash = Some(*cause),
                    _ => {}
                }
            }
            if args.show_hitboxes && !state.events.is_empty() {
                log_hitboxes(&state);
            }
            if state.phase == GamePhase::GameOver {
                break;
            }
        }

        let summary = RunSummary {
            seed,
            frames,
            seconds: frames as f32 * FRAME_DT,
            phase: state.phase,
            score: state.score,
            crash,
            flaps,
            speed_multiplier: state.speed_multiplier(),
            sprites_loaded,
        };

        if args.summary_json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("seed:        {}", summary.seed);
            println!("simulated:   {:.2}s ({} frames)", summary.seconds, summary.frames);
            println!("phase:       {:?}", summary.phase);
            println!("score:       {}", summary.score);
            println!("flaps:       {}", summary.flaps);
            println!("speed:       x{:.2}", summary.speed_multiplier);
            match summary.crash {
                Some(cause) => println!("crashed into {}", cause.as_str()),
                None => println!("survived"),
            }
            if args.assets.is_some() {
                println!("sprites:     {} loaded", summary.sprites_loaded);
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Flapline (headless) starting...");
    headless::run(headless::Args::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
