//! Game state and the run state machine
//!
//! Everything a tick reads or writes lives here. Gameplay randomness (gap
//! placement) and decoration randomness (clouds, particles) come from two
//! separate streams, so turning decoration up or down never changes a run.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::avatar::Bird;
use super::background::Background;
use super::config::GameConfig;
use super::difficulty::speed_multiplier;
use super::obstacle::ObstaclePair;

/// PCG stream used for decoration
const FX_STREAM: u64 = 0xf1a9;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first activate
    Start,
    /// Active gameplay
    Playing,
    /// Run ended, showing the result
    GameOver,
}

/// What ended a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    Obstacle,
    Ground,
    Ceiling,
}

impl CrashCause {
    pub fn as_str(self) -> &'static str {
        match self {
            CrashCause::Obstacle => "obstacle",
            CrashCause::Ground => "ground",
            CrashCause::Ceiling => "ceiling",
        }
    }
}

/// Something that happened during the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    Flapped,
    Scored { score: u32 },
    Crashed { cause: CrashCause, score: u32 },
    ReturnedToStart,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Tuning constants, fixed for the lifetime of the state
    pub config: GameConfig,
    /// Seed both RNG streams were derived from
    pub seed: u64,
    pub phase: GamePhase,
    pub score: u32,
    pub bird: Bird,
    /// Live obstacle pairs in spawn order (also left-to-right screen order)
    pub obstacles: Vec<ObstaclePair>,
    pub background: Background,
    /// Seconds spent in the current run
    pub run_time: f32,
    /// Events produced by the most recent tick
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    pub(crate) fx_rng: Pcg32,
}

impl GameState {
    /// Create a new game state in the Start phase
    pub fn new(seed: u64, config: GameConfig) -> Self {
        let mut fx_rng = Pcg32::new(seed, FX_STREAM);
        let background = Background::new(&mut fx_rng, &config);

        Self {
            bird: Bird::new(&config),
            config,
            seed,
            phase: GamePhase::Start,
            score: 0,
            obstacles: Vec::new(),
            background,
            run_time: 0.0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            fx_rng,
        }
    }

    /// Apply the single discrete input
    ///
    /// Start begins a fresh run, Playing flaps, GameOver returns to Start.
    pub fn activate(&mut self) {
        match self.phase {
            GamePhase::Start => {
                self.reset_run();
                self.phase = GamePhase::Playing;
                self.events.push(GameEvent::RunStarted);
                log::info!("Run started");
            }
            GamePhase::Playing => {
                self.bird.flap(&self.config);
                self.events.push(GameEvent::Flapped);
            }
            GamePhase::GameOver => {
                self.phase = GamePhase::Start;
                self.events.push(GameEvent::ReturnedToStart);
                log::info!("Back to start screen");
            }
        }
    }

    /// Fresh avatar, no obstacles, score 0
    pub fn reset_run(&mut self) {
        self.bird = Bird::new(&self.config);
        self.obstacles.clear();
        self.score = 0;
        self.run_time = 0.0;
    }

    /// End the run: snap the avatar between its pre- and post-tick positions
    pub(crate) fn crash(&mut self, cause: CrashCause, pre_tick_pos: Vec2) {
        self.bird.pos = crate::lerp_point(pre_tick_pos, self.bird.pos, self.config.collision_snap);
        if cause != CrashCause::Obstacle {
            self.bird.velocity = 0.0;
        }
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::Crashed {
            cause,
            score: self.score,
        });
        log::info!(
            "Run over: hit {} with score {} after {:.1}s",
            cause.as_str(),
            self.score,
            self.run_time
        );
    }

    /// Current difficulty multiplier
    pub fn speed_multiplier(&self) -> f32 {
        speed_multiplier(self.score, &self.config)
    }

    /// The nearest obstacle the avatar's hitbox has not yet cleared
    pub fn next_obstacle(&self) -> Option<&ObstaclePair> {
        let hitbox_left = self.bird.center(&self.config).x - self.bird.hitbox_width / 2.0;
        self.obstacles.iter().find(|o| o.x + o.width > hitbox_left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_waits_at_start() {
        let state = GameState::new(12345, GameConfig::default());
        assert_eq!(state.phase, GamePhase::Start);
        assert_eq!(state.score, 0);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.background.layers.len(), 3);
    }

    #[test]
    fn test_activate_from_start_resets_run() {
        let mut state = GameState::new(1, GameConfig::default());
        state.score = 7;
        state.bird.pos.y = 420.0;
        state.bird.velocity = 300.0;
        state
            .obstacles
            .push(ObstaclePair::spawn(500.0, 250.0, 0, &state.config));

        state.activate();

        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.bird.pos, Vec2::new(200.0, 300.0));
        assert_eq!(state.bird.velocity, 0.0);
        assert_eq!(state.events, vec![GameEvent::RunStarted]);
    }

    #[test]
    fn test_activate_while_playing_flaps() {
        let mut state = GameState::new(1, GameConfig::default());
        state.activate();
        state.events.clear();
        state.activate();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.bird.velocity, -250.0);
        assert_eq!(state.events, vec![GameEvent::Flapped]);
    }

    #[test]
    fn test_game_over_returns_to_start() {
        let mut state = GameState::new(1, GameConfig::default());
        state.activate();
        let pos = state.bird.pos;
        state.crash(CrashCause::Obstacle, pos);
        assert_eq!(state.phase, GamePhase::GameOver);

        state.events.clear();
        state.activate();
        assert_eq!(state.phase, GamePhase::Start);
        assert_eq!(state.events, vec![GameEvent::ReturnedToStart]);
    }

    #[test]
    fn test_crash_snaps_and_zeroes_velocity_for_ground_only() {
        let mut state = GameState::new(1, GameConfig::default());
        state.activate();
        state.bird.pos = Vec2::new(200.0, 310.0);
        state.bird.velocity = 120.0;
        state.crash(CrashCause::Obstacle, Vec2::new(200.0, 300.0));
        assert_eq!(state.bird.pos, Vec2::new(200.0, 305.0));
        assert_eq!(state.bird.velocity, 120.0);

        let mut state = GameState::new(1, GameConfig::default());
        state.activate();
        state.bird.pos = Vec2::new(200.0, 480.0);
        state.bird.velocity = 400.0;
        state.crash(CrashCause::Ground, Vec2::new(200.0, 470.0));
        assert_eq!(state.bird.pos, Vec2::new(200.0, 475.0));
        assert_eq!(state.bird.velocity, 0.0);
    }

    #[test]
    fn test_next_obstacle_skips_cleared_pairs() {
        let mut state = GameState::new(1, GameConfig::default());
        let config = state.config.clone();
        // Hitbox spans x 210..240
        state.obstacles.push(ObstaclePair::spawn(120.0, 200.0, 0, &config));
        state.obstacles.push(ObstaclePair::spawn(150.0, 250.0, 0, &config));
        state.obstacles.push(ObstaclePair::spawn(450.0, 300.0, 0, &config));
        assert_eq!(state.next_obstacle().map(|o| o.gap_y), Some(250.0));
        state.obstacles.remove(1);
        assert_eq!(state.next_obstacle().map(|o| o.gap_y), Some(300.0));
    }
}
