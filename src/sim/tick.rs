//! Per-frame simulation step

use rand::Rng;

use super::collision::Rect;
use super::obstacle::{ObstaclePair, random_gap_center, should_spawn};
use super::state::{CrashCause, GameEvent, GamePhase, GameState};

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// The discrete activate input (key, click or tap)
    pub activate: bool,
    /// Demo mode: the controller plays by itself
    pub autopilot: bool,
}

/// Fraction of the gap height the avatar may sink below the gap center
/// before the autopilot flaps
const AUTOPILOT_SLACK: f32 = 0.15;

/// Advance the game state by `dt` seconds of real time
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();

    if input.activate || (input.autopilot && autopilot_wants_activate(state)) {
        state.activate();
    }

    state.background.update(dt, state.score, &state.config);

    if state.phase != GamePhase::Playing {
        return;
    }
    state.run_time += dt;

    let pre_tick_pos = state.bird.pos;
    state.bird.update(dt, state.score, &state.config);

    if should_spawn(&state.obstacles, &state.config) {
        let gap_y = random_gap_center(&mut state.rng, &state.config);
        state.obstacles.push(ObstaclePair::spawn(
            state.config.width,
            gap_y,
            state.score,
            &state.config,
        ));
    }

    let crash = advance_obstacles(state, dt).or_else(|| boundary_crash(state));

    emit_particles(state);

    if let Some(cause) = crash {
        state.crash(cause, pre_tick_pos);
    }
}

/// Scroll, score, cull and collide obstacles in spawn order
///
/// Stops at the first obstacle the avatar hits. Later pairs keep their
/// pre-tick positions.
fn advance_obstacles(state: &mut GameState, dt: f32) -> Option<CrashCause> {
    let avatar_x = state.bird.pos.x;
    let mut i = 0;
    while i < state.obstacles.len() {
        let obstacle = &mut state.obstacles[i];
        obstacle.update(dt, state.score, &state.config);

        if obstacle.mark_passed_if(avatar_x) {
            state.score += 1;
            state.events.push(GameEvent::Scored { score: state.score });
            log::debug!("Passed obstacle, score {}", state.score);
        }

        if obstacle.is_off_screen() {
            state.obstacles.remove(i);
            continue;
        }

        let (top, bottom) = obstacle.collision_rects(state.config.height);
        if state.bird.collides_with(&top, &state.config)
            || state.bird.collides_with(&bottom, &state.config)
        {
            return Some(CrashCause::Obstacle);
        }
        i += 1;
    }
    None
}

/// Ground band at the bottom of the field, then the mirrored ceiling band above it
fn boundary_crash(state: &GameState) -> Option<CrashCause> {
    let config = &state.config;
    let ground = Rect::new(
        0.0,
        config.height - config.ground_height,
        config.width,
        config.ground_height,
    );
    let ceiling = Rect::new(0.0, -config.ground_height, config.width, config.ground_height);

    if state.bird.collides_with(&ground, config) {
        Some(CrashCause::Ground)
    } else if state.bird.collides_with(&ceiling, config) {
        Some(CrashCause::Ceiling)
    } else {
        None
    }
}

fn emit_particles(state: &mut GameState) {
    let chance = state.config.particle_chance;
    for obstacle in &mut state.obstacles {
        if state.fx_rng.random_bool(chance) {
            obstacle.emit_particle(&mut state.fx_rng);
        }
    }
}

/// Start runs on its own, then flap whenever the hitbox sinks too far below
/// the next gap (or the middle of the open field when none is in view)
fn autopilot_wants_activate(state: &GameState) -> bool {
    match state.phase {
        GamePhase::Start => true,
        GamePhase::Playing => {
            let config = &state.config;
            let target = state
                .next_obstacle()
                .map(|o| o.gap_y)
                .unwrap_or((config.height - config.ground_height) / 2.0);
            state.bird.center(config).y - target > config.gap_height * AUTOPILOT_SLACK
        }
        GamePhase::GameOver => false,
    }
}
