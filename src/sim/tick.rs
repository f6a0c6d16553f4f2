//! Fixed-timestep simulation tick
//!
//! One call advances the whole session by `SIM_DT`:
//! - session transitions (start / pause / reset)
//! - vehicle physics against the effective top speed
//! - pickup and ramp collisions in the chunks around the player
//! - wall containment against the nearest centerline sample
//! - progress resolution, track extension, competitor lifecycle
//!
//! The caller owns the clock. Running the same input sequence against the
//! same seed reproduces the session exactly.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::chunk::ObstacleKind;
use super::sampler::{self, TrackSample};
use super::state::{GameState, GameStatus};
use super::vehicle::Controls;
use crate::consts::*;
use crate::flat_distance;

/// Everything the outside world feeds into one tick
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub controls: Controls,
    /// Edge-triggered: begin the race from IDLE
    pub start: bool,
    /// Edge-triggered: toggle RACING <-> PAUSED
    pub pause: bool,
    /// Edge-triggered: abandon the session and return to IDLE
    pub reset: bool,
}

/// Advance the session by one fixed step
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.time_ticks += 1;

    if input.reset {
        state.reset();
        return;
    }
    if input.start {
        state.start();
    }
    if input.pause {
        state.toggle_pause();
    }

    match state.status {
        GameStatus::Idle => {
            // Park at the grid until the race starts
            if !state.vehicle.is_at_origin() {
                state.vehicle.reset();
            }
        }
        GameStatus::Paused => {
            // Translation and timers freeze; momentum still drains
            state.vehicle.decay_speed(&state.tuning);
        }
        GameStatus::Finished => {
            state.vehicle.decay_speed(&state.tuning);
            state.vehicle.apply_vertical(&state.tuning);
            state.vehicle.advance();
        }
        GameStatus::Racing => racing_tick(state, input.controls),
    }
}

fn racing_tick(state: &mut GameState, controls: Controls) {
    state.tick_timers();
    if state.status != GameStatus::Racing {
        return;
    }

    let current_max = state
        .tuning
        .current_max_speed(state.boost_timer, state.penalty_timer);
    state.vehicle.apply_longitudinal(controls, current_max, &state.tuning);
    state.vehicle.apply_steering(controls, &state.tuning);
    state.vehicle.apply_vertical(&state.tuning);
    state.vehicle.advance();

    resolve_pickups(state);
    resolve_competitor_bumps(state);

    // Containment runs last so no other correction can leave the car outside
    let sample = sampler::sample_track(&state.chunks, state.vehicle.position, state.player_chunk);
    clamp_to_track(state, &sample);

    state.update_progress(sample.chunk_id, sample.progress);
    state.advance_competitors();
}

/// Push the car back inside the drivable band and scrape off some speed.
/// Airborne cars clear the walls.
fn clamp_to_track(state: &mut GameState, sample: &TrackSample) {
    if !state.vehicle.is_grounded(&state.tuning) {
        return;
    }
    let allowed = TRACK_WIDTH / 2.0 - state.tuning.car_half_width;
    if sample.distance <= allowed {
        return;
    }

    let pos = state.vehicle.position;
    let away = Vec3::new(pos.x - sample.point.x, 0.0, pos.z - sample.point.z).normalize_or_zero();
    if away == Vec3::ZERO {
        return;
    }
    let clamped = sample.point + away * allowed;
    state.vehicle.position.x = clamped.x;
    state.vehicle.position.z = clamped.z;
    state.vehicle.speed *= state.tuning.wall_scrape;
}

/// Quiz markers, coins, and ramps in the chunks around the player
fn resolve_pickups(state: &mut GameState) {
    let pos = state.vehicle.position;
    let player = state.player_chunk;
    let tuning = &state.tuning;

    let mut item_hit = None;
    let mut coin_hits = Vec::new();
    let mut ramp_hit = false;

    for chunk in state.chunks.iter().filter(|c| c.id.abs_diff(player) <= 1) {
        for item in &chunk.items {
            // 3D distance: a car launched over the gate must not answer
            if !item.is_collected && item.position.distance(pos) < tuning.item_radius {
                item_hit = Some((chunk.id, item.id));
            }
        }
        for obstacle in &chunk.obstacles {
            match obstacle.kind {
                // Coins are volumetric: arc coins over a ramp need air time
                ObstacleKind::Coin { collected: false } => {
                    if obstacle.position.distance(pos) < tuning.coin_radius {
                        coin_hits.push((chunk.id, obstacle.id));
                    }
                }
                ObstacleKind::Coin { collected: true } => {}
                ObstacleKind::Ramp => {
                    if flat_distance(obstacle.position, pos) < tuning.ramp_radius
                        && pos.y < 1.0
                        && state.vehicle.speed.abs() > tuning.min_drive_speed
                    {
                        ramp_hit = true;
                    }
                }
            }
        }
    }

    // Markers are exclusive per quiz gate; one pickup answers the question
    if let Some((chunk_id, item_id)) = item_hit
        && let Some(correct) = state.collect_item(chunk_id, item_id)
    {
        state.answer(correct);
    }
    for (chunk_id, coin_id) in coin_hits {
        state.collect_coin(chunk_id, coin_id);
    }
    if ramp_hit {
        state.vehicle.velocity_y = state.tuning.jump_force;
        let cap = state.tuning.max_speed * state.tuning.ramp_speed_ceiling;
        state.vehicle.speed = (state.vehicle.speed * state.tuning.ramp_boost).min(cap);
    }
}

/// Soft body-to-body collision with bots: a lateral shove plus a speed hit
fn resolve_competitor_bumps(state: &mut GameState) {
    let pos = state.vehicle.position;
    let mut push = Vec3::ZERO;
    let mut bumped = false;

    for c in &state.competitors {
        let Some(chunk) = state.chunk(c.chunk_id) else {
            continue;
        };
        let Some((bot_pos, _)) = c.world_position(chunk) else {
            continue;
        };
        if flat_distance(bot_pos, pos) < state.tuning.bot_radius {
            let away = Vec3::new(pos.x - bot_pos.x, 0.0, pos.z - bot_pos.z).normalize_or_zero();
            push += away * state.tuning.bot_push;
            bumped = true;
        }
    }

    if bumped {
        state.vehicle.position += push;
        state.vehicle.speed *= state.tuning.bot_bump_damping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuestionPool;
    use crate::tuning::Tuning;

    fn racing_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed, QuestionPool::default(), Tuning::default());
        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
        );
        assert_eq!(state.status, GameStatus::Racing);
        state
    }

    fn forward() -> TickInput {
        TickInput {
            controls: Controls {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_full_throttle_reaches_max_speed() {
        // 100 ticks stays inside the canonical straight opening chunk
        let mut state = racing_state(1);
        let mut last_z = state.vehicle.position.z;
        for _ in 0..100 {
            tick(&mut state, &forward());
            assert!(state.vehicle.position.z > last_z);
            last_z = state.vehicle.position.z;
        }
        assert!((state.vehicle.speed - state.tuning.max_speed).abs() < 1e-6);
    }

    #[test]
    fn test_coasting_decays_to_rest() {
        let mut state = racing_state(1);
        for _ in 0..120 {
            tick(&mut state, &forward());
        }
        for _ in 0..600 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.vehicle.speed, 0.0);
    }

    #[test]
    fn test_car_stays_inside_walls() {
        let mut state = racing_state(2);
        let allowed = TRACK_WIDTH / 2.0 - state.tuning.car_half_width;
        let input = TickInput {
            controls: Controls {
                forward: true,
                left: true,
                ..Default::default()
            },
            ..Default::default()
        };
        for _ in 0..900 {
            tick(&mut state, &input);
            if state.vehicle.is_grounded(&state.tuning) {
                let sample = sampler::sample_track(
                    &state.chunks,
                    state.vehicle.position,
                    state.player_chunk,
                );
                assert!(
                    sample.distance <= allowed + 1e-3,
                    "escaped to {} at tick {}",
                    sample.distance,
                    state.time_ticks
                );
            }
        }
    }

    #[test]
    fn test_correct_marker_pickup_grants_boost() {
        let mut state = racing_state(3);
        for i in 1..=9 {
            state.update_progress(i, 0.0);
        }
        let (position, item_id) = {
            let chunk = state.chunk(10).expect("quiz chunk in window");
            let item = chunk
                .items
                .iter()
                .find(|i| i.is_correct)
                .expect("one correct marker per quiz chunk");
            (item.position, item.id)
        };
        state.player_chunk = 10;
        state.vehicle.position = Vec3::new(position.x, 0.0, position.z);
        state.vehicle.speed = 0.2;

        tick(&mut state, &forward());

        assert!(state.boost_timer > 0);
        assert_eq!(state.penalty_timer, 0);
        assert!(state.feedback.is_some());
        let collected = state
            .chunk(10)
            .and_then(|c| c.items.iter().find(|i| i.id == item_id).map(|i| i.is_collected));
        assert_eq!(collected, Some(true));
    }

    #[test]
    fn test_airborne_car_flies_over_markers() {
        let mut state = racing_state(3);
        for i in 1..=9 {
            state.update_progress(i, 0.0);
        }
        let position = {
            let chunk = state.chunk(10).expect("quiz chunk in window");
            chunk
                .items
                .iter()
                .find(|i| i.is_correct)
                .expect("one correct marker per quiz chunk")
                .position
        };
        state.player_chunk = 10;
        // Directly above the marker, well outside the pickup radius
        state.vehicle.position = Vec3::new(position.x, 6.0, position.z);
        state.vehicle.speed = 0.2;

        tick(&mut state, &forward());

        assert_eq!(state.boost_timer, 0);
        assert_eq!(state.penalty_timer, 0);
        assert!(state.feedback.is_none());
        assert!(state.chunk(10).unwrap().has_uncollected_items());
    }

    #[test]
    fn test_wrong_marker_pickup_applies_penalty() {
        let mut state = racing_state(3);
        for i in 1..=9 {
            state.update_progress(i, 0.0);
        }
        let position = {
            let chunk = state.chunk(10).expect("quiz chunk in window");
            chunk
                .items
                .iter()
                .find(|i| !i.is_correct)
                .expect("wrong markers exist")
                .position
        };
        state.player_chunk = 10;
        state.vehicle.position = Vec3::new(position.x, 0.0, position.z);

        tick(&mut state, &forward());

        assert!(state.penalty_timer > 0);
        assert_eq!(state.boost_timer, 0);
        assert!(state.feedback.as_deref().unwrap().contains("WRONG"));
    }

    #[test]
    fn test_ramp_launches_the_car() {
        // Scan a long stretch of track for a ramp chunk
        let mut state = racing_state(11);
        let mut ramp = None;
        for i in 1..200 {
            state.update_progress(i, 0.0);
            if let Some((id, pos)) = state.chunks.iter().find_map(|c| {
                c.obstacles
                    .iter()
                    .find(|o| matches!(o.kind, ObstacleKind::Ramp))
                    .map(|o| (c.id, o.position))
            }) {
                ramp = Some((id, pos));
                break;
            }
        }
        let (chunk_id, position) = ramp.expect("ramp within 200 chunks");

        state.player_chunk = chunk_id;
        state.vehicle.position = Vec3::new(position.x, 0.0, position.z);
        state.vehicle.speed = 0.3;
        tick(&mut state, &forward());

        assert!(state.vehicle.velocity_y > 0.0);
        assert!(state.vehicle.speed > 0.3);
        // Airborne a few ticks later
        for _ in 0..5 {
            tick(&mut state, &forward());
        }
        assert!(state.vehicle.position.y > 0.0);
    }

    #[test]
    fn test_pause_freezes_translation() {
        let mut state = racing_state(4);
        for _ in 0..120 {
            tick(&mut state, &forward());
        }
        tick(
            &mut state,
            &TickInput {
                pause: true,
                ..Default::default()
            },
        );
        assert_eq!(state.status, GameStatus::Paused);

        let frozen = state.vehicle.position;
        let boost = state.boost_timer;
        for _ in 0..60 {
            tick(&mut state, &forward());
        }
        assert_eq!(state.vehicle.position, frozen);
        assert_eq!(state.boost_timer, boost);
        // Momentum still drains while paused
        assert!(state.vehicle.speed < state.tuning.max_speed);

        tick(
            &mut state,
            &TickInput {
                pause: true,
                ..Default::default()
            },
        );
        assert_eq!(state.status, GameStatus::Racing);
    }

    #[test]
    fn test_reset_returns_to_idle_at_origin() {
        let mut state = racing_state(5);
        for _ in 0..240 {
            tick(&mut state, &forward());
        }
        tick(
            &mut state,
            &TickInput {
                reset: true,
                ..Default::default()
            },
        );
        assert_eq!(state.status, GameStatus::Idle);
        tick(&mut state, &TickInput::default());
        assert!(state.vehicle.is_at_origin());
        assert_eq!(state.distance_score, 0);
    }

    #[test]
    fn test_finished_car_rolls_out() {
        let tuning = Tuning {
            race_clock_ticks: Some(30),
            ..Default::default()
        };
        let mut state = GameState::new(6, QuestionPool::default(), tuning);
        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
        );
        for _ in 0..120 {
            tick(&mut state, &forward());
        }
        assert_eq!(state.status, GameStatus::Finished);
        // Still translating while momentum lasts, then at rest
        for _ in 0..600 {
            tick(&mut state, &forward());
        }
        assert_eq!(state.vehicle.speed, 0.0);
    }

    #[test]
    fn test_same_seed_same_inputs_same_session() {
        let mut a = racing_state(99);
        let mut b = racing_state(99);
        for i in 0u32..600 {
            let input = TickInput {
                controls: Controls {
                    forward: true,
                    left: i % 120 < 30,
                    drift: i % 200 < 40,
                    ..Default::default()
                },
                ..Default::default()
            };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.vehicle.position, b.vehicle.position);
        assert_eq!(a.vehicle.facing, b.vehicle.facing);
        assert_eq!(a.distance_score, b.distance_score);
        assert_eq!(a.player_chunk, b.player_chunk);
        let types_a: Vec<_> = a.chunks.iter().map(|c| c.chunk_type).collect();
        let types_b: Vec<_> = b.chunks.iter().map(|c| c.chunk_type).collect();
        assert_eq!(types_a, types_b);
        assert_eq!(a.competitors.len(), b.competitors.len());
    }

    #[test]
    fn test_progress_advances_with_the_car() {
        let mut state = racing_state(7);
        for _ in 0..3000 {
            tick(&mut state, &forward());
        }
        assert!(state.player_chunk >= 1, "crossed into a later chunk");
        assert!(state.distance_score > 0);
    }
}
