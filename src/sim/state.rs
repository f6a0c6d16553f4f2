//! Session state and the gameplay state machine
//!
//! `GameState` is the single aggregate the simulation controller owns. All
//! mutation happens through its methods during `tick()`; external readers
//! (renderer, HUD) only ever see immutable `Snapshot`s taken between ticks.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::chunk::{ChunkGenerator, ObstacleKind, TrackChunk};
use super::competitor::{self, Competitor};
use super::vehicle::VehicleState;
use crate::consts::*;
use crate::quiz::{QuestionPool, QuizQuestion};
use crate::tuning::Tuning;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStatus {
    /// Menu / reset; the car snaps back to the origin
    Idle,
    Racing,
    Paused,
    /// Race clock expired (clock variant only)
    Finished,
}

/// Decorrelates the competitor RNG stream from the track stream
const COMPETITOR_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Complete session state, owned by the simulation core
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed; pins track generation and competitor spawns
    pub seed: u64,
    pub status: GameStatus,
    pub tuning: Tuning,
    pub vehicle: VehicleState,

    /// Live track window, id order, pruned from the front
    pub chunks: Vec<TrackChunk>,
    /// Chunk the player currently occupies
    pub player_chunk: u32,
    /// Normalized progress within that chunk
    pub progress_in_chunk: f32,

    /// Distance covered in world units, floored; running maximum
    pub distance_score: u32,
    /// Coin bonus
    pub bonus_score: u32,
    /// Running best of total score this session (persisted externally)
    pub best_score: u32,

    /// Mutually exclusive countdowns; at most one is ever positive
    pub boost_timer: u32,
    pub penalty_timer: u32,
    /// Remaining race time, `None` for the endless variant
    pub race_clock: Option<u32>,

    /// Transient quiz feedback plus its display countdown
    pub feedback: Option<String>,
    pub feedback_ticks: u32,
    /// Question shown to the player (belongs to the next quiz chunk)
    pub current_question: QuizQuestion,

    pub competitors: Vec<Competitor>,
    pub time_ticks: u64,

    pool: QuestionPool,
    generator: ChunkGenerator,
    rng: Pcg32,
    next_bot_id: u32,
}

impl GameState {
    /// Build a session with its initial track. `tuning` must already be
    /// validated; the hot path trusts it.
    pub fn new(seed: u64, pool: QuestionPool, tuning: Tuning) -> Self {
        let current_question = pool.first();
        let mut state = Self {
            seed,
            status: GameStatus::Idle,
            tuning,
            vehicle: VehicleState::default(),
            chunks: Vec::new(),
            player_chunk: 0,
            progress_in_chunk: 0.0,
            distance_score: 0,
            bonus_score: 0,
            best_score: 0,
            boost_timer: 0,
            penalty_timer: 0,
            race_clock: None,
            feedback: None,
            feedback_ticks: 0,
            current_question,
            competitors: Vec::new(),
            time_ticks: 0,
            pool,
            generator: ChunkGenerator::new(seed),
            rng: Pcg32::seed_from_u64(seed.wrapping_add(COMPETITOR_STREAM)),
            next_bot_id: 1,
        };
        state.generate_initial_track();
        state
    }

    /// Canonical first chunk plus the opening stretch
    pub fn generate_initial_track(&mut self) {
        self.generator.reset();
        self.chunks.clear();
        self.chunks.push(self.generator.first_chunk());
        for _ in 0..INITIAL_CHUNKS_AHEAD {
            self.extend_track();
        }
        self.player_chunk = 0;
        self.progress_in_chunk = 0.0;
        self.boost_timer = 0;
        self.penalty_timer = 0;
        self.bonus_score = 0;
        self.competitors.clear();
    }

    /// IDLE -> RACING: zero the scoreboard, line up the starting grid
    pub fn start(&mut self) {
        if self.status != GameStatus::Idle {
            return;
        }
        if self.chunks.is_empty() {
            self.generate_initial_track();
        }
        self.distance_score = 0;
        self.bonus_score = 0;
        self.boost_timer = 0;
        self.penalty_timer = 0;
        self.feedback = None;
        self.feedback_ticks = 0;
        self.race_clock = self.tuning.race_clock_ticks;
        self.competitors = competitor::starting_grid();
        self.next_bot_id = self.competitors.len() as u32 + 1;
        self.status = GameStatus::Racing;
        log::info!("race started (seed {})", self.seed);
    }

    /// Back to IDLE, discarding all mutable session state. The same seed
    /// regenerates the same opening track.
    pub fn reset(&mut self) {
        self.generate_initial_track();
        self.vehicle.reset();
        self.status = GameStatus::Idle;
        self.distance_score = 0;
        self.feedback = None;
        self.feedback_ticks = 0;
        self.race_clock = None;
        log::info!("session reset");
    }

    pub fn toggle_pause(&mut self) {
        self.status = match self.status {
            GameStatus::Racing => GameStatus::Paused,
            GameStatus::Paused => GameStatus::Racing,
            other => other,
        };
    }

    pub fn chunk(&self, id: u32) -> Option<&TrackChunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    pub fn chunk_mut(&mut self, id: u32) -> Option<&mut TrackChunk> {
        self.chunks.iter_mut().find(|c| c.id == id)
    }

    pub fn total_score(&self) -> u32 {
        self.distance_score + self.bonus_score
    }

    /// Boost and penalty are structurally exclusive: setting either always
    /// clears the other.
    pub fn set_boost(&mut self) {
        self.boost_timer = self.tuning.effect_ticks;
        self.penalty_timer = 0;
    }

    pub fn set_penalty(&mut self) {
        self.penalty_timer = self.tuning.effect_ticks;
        self.boost_timer = 0;
    }

    /// Dispatch a quiz answer: timers plus transient feedback
    pub fn answer(&mut self, correct: bool) {
        if correct {
            self.set_boost();
            self.feedback = Some("CORRECT! NITRO BOOST!".to_string());
        } else {
            self.set_penalty();
            self.feedback = Some("WRONG! SPEED DOWN!".to_string());
        }
        self.feedback_ticks = self.tuning.feedback_ticks;
    }

    /// Mark a quiz marker collected. Returns whether it was the correct
    /// option, or `None` if the marker was already collected or missing.
    pub fn collect_item(&mut self, chunk_id: u32, item_id: u32) -> Option<bool> {
        let item = self.chunk_mut(chunk_id)?.item_mut(item_id)?;
        if item.is_collected {
            return None;
        }
        item.is_collected = true;
        Some(item.is_correct)
    }

    /// Mark a coin collected and bank its bonus. No-op on double collection.
    pub fn collect_coin(&mut self, chunk_id: u32, obstacle_id: u32) -> bool {
        let Some(obstacle) = self
            .chunk_mut(chunk_id)
            .and_then(|c| c.obstacle_mut(obstacle_id))
        else {
            return false;
        };
        match obstacle.kind {
            ObstacleKind::Coin { collected: false } => {
                obstacle.kind = ObstacleKind::Coin { collected: true };
                self.bonus_score += self.tuning.coin_bonus;
                true
            }
            _ => false,
        }
    }

    /// Decrement countdowns; runs only while RACING
    pub fn tick_timers(&mut self) {
        self.boost_timer = self.boost_timer.saturating_sub(1);
        self.penalty_timer = self.penalty_timer.saturating_sub(1);

        if self.feedback_ticks > 0 {
            self.feedback_ticks -= 1;
            if self.feedback_ticks == 0 {
                self.feedback = None;
            }
        }

        if let Some(clock) = &mut self.race_clock {
            *clock = clock.saturating_sub(1);
            if *clock == 0 {
                self.status = GameStatus::Finished;
                log::info!("race clock expired, final score {}", self.total_score());
            }
        }
    }

    /// Record the sampled player position. Crossing into a new chunk appends
    /// one chunk at the back and prunes the front.
    pub fn update_progress(&mut self, active_chunk: u32, progress: f32) {
        if active_chunk > self.player_chunk {
            self.player_chunk = active_chunk;
            self.extend_track();
            self.prune_track();
        }
        self.progress_in_chunk = progress;

        // Running max keeps the distance score monotonic even if the car
        // reverses inside a chunk
        let distance =
            (active_chunk as f32 * CHUNK_LENGTH + progress * CHUNK_LENGTH).floor() as u32;
        self.distance_score = self.distance_score.max(distance);
        self.best_score = self.best_score.max(self.total_score());

        self.select_question(active_chunk);
    }

    /// Times generation had to force a straight fallback this session
    pub fn generation_fallbacks(&self) -> u32 {
        self.generator.forced_fallbacks()
    }

    /// Append one chunk, patching the previous chunk's trailing ghost point
    fn extend_track(&mut self) {
        let Some(last) = self.chunks.last() else {
            return;
        };
        let next = self.generator.generate(last, &self.pool);
        if let Some(last) = self.chunks.last_mut() {
            ChunkGenerator::patch_ghost(last, &next);
        }
        self.chunks.push(next);
    }

    /// Drop chunks that have fallen behind the render window
    fn prune_track(&mut self) {
        let player = self.player_chunk;
        self.chunks.retain(|c| c.id + PRUNE_MARGIN >= player);
    }

    /// Keep `current_question` pointed at the next quiz chunk the player can
    /// still answer. Past 60% of the active quiz chunk, look ahead to the
    /// following one. Keyed off the sampled chunk, which can lag
    /// `player_chunk` by one, so the 60% check always compares against the
    /// chunk the progress value belongs to.
    fn select_question(&mut self, active_chunk: u32) {
        let progress = self.progress_in_chunk;

        let mut next_quiz = self
            .chunks
            .iter()
            .find(|c| c.id >= active_chunk && c.question.is_some() && c.has_uncollected_items());
        if let Some(chunk) = next_quiz
            && chunk.id == active_chunk
            && progress > 0.6
        {
            next_quiz = self
                .chunks
                .iter()
                .find(|c| c.id > active_chunk && c.question.is_some());
        }

        if let Some(question) = next_quiz.and_then(|c| c.question.clone()) {
            self.current_question = question;
        }
    }

    /// One tick of the competitor lifecycle against the player's position
    pub fn advance_competitors(&mut self) {
        competitor::update_competitors(
            &mut self.competitors,
            self.player_chunk,
            &mut self.next_bot_id,
            &mut self.rng,
            &self.tuning,
        );
    }

    /// Read-only view for rendering/UI, taken between ticks
    pub fn snapshot(&self) -> Snapshot {
        let low = self.player_chunk.saturating_sub(SNAPSHOT_BEHIND);
        let high = self.player_chunk + SNAPSHOT_AHEAD;
        let chunks = self
            .chunks
            .iter()
            .filter(|c| c.id >= low && c.id <= high)
            .cloned()
            .collect();

        let competitors = self
            .competitors
            .iter()
            .filter_map(|c| {
                // A bot on a pruned chunk is skipped this tick, not an error
                let chunk = self.chunk(c.chunk_id)?;
                let (position, heading) = c.world_position(chunk)?;
                Some(CompetitorView {
                    id: c.id,
                    position,
                    heading,
                    color: c.color,
                })
            })
            .collect();

        Snapshot {
            status: self.status,
            chunks,
            player: PlayerView {
                position: self.vehicle.position,
                facing: self.vehicle.facing,
                course: self.vehicle.course,
                speed: self.vehicle.speed,
                height: self.vehicle.position.y,
            },
            competitors,
            current_question: self.current_question.clone(),
            feedback: self.feedback.clone(),
            boost_timer: self.boost_timer,
            penalty_timer: self.penalty_timer,
            distance_score: self.distance_score,
            bonus_score: self.bonus_score,
            best_score: self.best_score,
            race_clock: self.race_clock,
        }
    }
}

/// Player pose exposed to renderers
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub position: Vec3,
    pub facing: f32,
    pub course: f32,
    pub speed: f32,
    pub height: f32,
}

/// A competitor resolved to world coordinates
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorView {
    pub id: u32,
    pub position: Vec3,
    pub heading: f32,
    pub color: [f32; 3],
}

/// Per-tick view: the windowed track plus everything the HUD shows
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: GameStatus,
    pub chunks: Vec<TrackChunk>,
    pub player: PlayerView,
    pub competitors: Vec<CompetitorView>,
    pub current_question: QuizQuestion,
    pub feedback: Option<String>,
    pub boost_timer: u32,
    pub penalty_timer: u32,
    pub distance_score: u32,
    pub bonus_score: u32,
    pub best_score: u32,
    pub race_clock: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, QuestionPool::default(), Tuning::default())
    }

    #[test]
    fn test_initial_track_shape() {
        let state = new_state(1);
        assert_eq!(state.chunks.len(), 1 + INITIAL_CHUNKS_AHEAD);
        assert_eq!(state.chunks[0].id, 0);
        assert_eq!(state.status, GameStatus::Idle);
    }

    #[test]
    fn test_boost_penalty_mutual_exclusion() {
        let mut state = new_state(1);
        state.set_boost();
        assert!(state.boost_timer > 0);
        assert_eq!(state.penalty_timer, 0);

        state.set_penalty();
        assert_eq!(state.boost_timer, 0);
        assert!(state.penalty_timer > 0);

        state.set_boost();
        assert!(state.boost_timer > 0);
        assert_eq!(state.penalty_timer, 0);
    }

    #[test]
    fn test_answer_sets_feedback_and_timers() {
        let mut state = new_state(1);
        state.answer(true);
        assert_eq!(state.boost_timer, state.tuning.effect_ticks);
        assert_eq!(state.penalty_timer, 0);
        assert!(state.feedback.as_deref().unwrap().contains("CORRECT"));

        state.answer(false);
        assert_eq!(state.penalty_timer, state.tuning.effect_ticks);
        assert_eq!(state.boost_timer, 0);
    }

    #[test]
    fn test_feedback_clears_after_countdown() {
        let mut state = new_state(1);
        state.answer(true);
        for _ in 0..state.tuning.feedback_ticks {
            state.tick_timers();
        }
        assert!(state.feedback.is_none());
        assert_eq!(state.feedback_ticks, 0);
    }

    #[test]
    fn test_coin_collection_is_idempotent() {
        // Walk far enough that some chunk carries coins
        let mut state = new_state(17);
        for i in 1..30 {
            state.update_progress(i, 0.0);
        }
        let (chunk_id, coin_id) = state
            .chunks
            .iter()
            .flat_map(|c| c.obstacles.iter().map(move |o| (c.id, o)))
            .find(|(_, o)| matches!(o.kind, ObstacleKind::Coin { collected: false }))
            .map(|(id, o)| (id, o.id))
            .expect("a generated chunk should carry coins");

        assert!(state.collect_coin(chunk_id, coin_id));
        let bonus = state.bonus_score;
        assert_eq!(bonus, state.tuning.coin_bonus);

        // Second collection: no state change, no score
        assert!(!state.collect_coin(chunk_id, coin_id));
        assert_eq!(state.bonus_score, bonus);
    }

    #[test]
    fn test_item_collection_is_write_once() {
        let mut state = new_state(2);
        // Advance so chunk 10 (first quiz chunk) is generated and in window
        for i in 1..=9 {
            state.update_progress(i, 0.0);
        }
        let quiz_id = 10;
        let item_id = state
            .chunk(quiz_id)
            .expect("quiz chunk in window")
            .items
            .first()
            .expect("quiz chunk carries markers")
            .id;
        let first = state.collect_item(quiz_id, item_id);
        assert!(first.is_some());
        assert_eq!(state.collect_item(quiz_id, item_id), None);
    }

    #[test]
    fn test_progress_extends_and_prunes() {
        let mut state = new_state(3);
        let initial_len = state.chunks.len();
        for i in 1..=10 {
            state.update_progress(i, 0.5);
        }
        // One appended per crossing, front pruned behind the margin
        assert!(state.chunks.iter().all(|c| c.id + PRUNE_MARGIN >= 10));
        assert!(state.chunks.len() <= initial_len + PRUNE_MARGIN as usize + 1);
        // Ids stay gap-free in the live window
        for pair in state.chunks.windows(2) {
            assert_eq!(pair[1].id, pair[0].id + 1);
        }
    }

    #[test]
    fn test_distance_score_is_monotonic() {
        let mut state = new_state(4);
        state.update_progress(2, 0.9);
        let score = state.distance_score;
        // Reversing inside the chunk must not lower the score
        state.update_progress(2, 0.2);
        assert_eq!(state.distance_score, score);
        state.update_progress(3, 0.1);
        assert!(state.distance_score >= score);
    }

    #[test]
    fn test_best_score_survives_reset() {
        let mut state = new_state(5);
        state.update_progress(3, 0.0);
        let best = state.best_score;
        assert_eq!(best, state.total_score());
        state.reset();
        assert_eq!(state.best_score, best);
        assert_eq!(state.distance_score, 0);
    }

    #[test]
    fn test_race_clock_finishes_session() {
        let tuning = Tuning {
            race_clock_ticks: Some(3),
            ..Default::default()
        };
        let mut state = GameState::new(1, QuestionPool::default(), tuning);
        state.start();
        assert_eq!(state.race_clock, Some(3));
        for _ in 0..3 {
            state.tick_timers();
        }
        assert_eq!(state.status, GameStatus::Finished);
    }

    #[test]
    fn test_start_requires_idle() {
        let mut state = new_state(1);
        state.start();
        assert_eq!(state.status, GameStatus::Racing);
        assert_eq!(state.competitors.len(), 3);
        state.distance_score = 100;
        state.start();
        // No restart mid-race
        assert_eq!(state.distance_score, 100);
    }

    #[test]
    fn test_snapshot_windows_the_track() {
        let mut state = new_state(6);
        for i in 1..=12 {
            state.update_progress(i, 0.0);
        }
        let snapshot = state.snapshot();
        assert!(!snapshot.chunks.is_empty());
        for chunk in &snapshot.chunks {
            assert!(chunk.id + SNAPSHOT_BEHIND >= 12);
            assert!(chunk.id <= 12 + SNAPSHOT_AHEAD);
        }
    }

    #[test]
    fn test_live_track_never_self_intersects_despite_pruning() {
        // Generation validates against the generator's own history, so the
        // live list being pruned to a short window must not let the track
        // loop back onto itself
        let mut state = new_state(121);
        let mut archive: Vec<TrackChunk> = state.chunks.clone();
        for i in 1..=150 {
            state.update_progress(i, 0.0);
            for chunk in &state.chunks {
                if archive.iter().all(|a| a.id != chunk.id) {
                    archive.push(chunk.clone());
                }
            }
        }
        if state.generation_fallbacks() > 0 {
            // The unconditional straight fallback is the one permitted exception
            return;
        }
        archive.sort_by_key(|c| c.id);
        for (i, a) in archive.iter().enumerate() {
            for b in archive.iter().skip(i + 3) {
                if b.id < 5 || b.id - a.id > HISTORY_WINDOW as u32 - 2 {
                    continue;
                }
                for p1 in &a.control_points {
                    for p2 in &b.control_points {
                        assert!(
                            p1.distance(*p2) >= SAFE_DISTANCE,
                            "chunks {} and {} overlap",
                            a.id,
                            b.id
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_question_lookahead_keys_off_sampled_chunk() {
        fn question(id: u32) -> crate::quiz::QuizQuestion {
            crate::quiz::QuizQuestion {
                id,
                prompt: format!("q{id}"),
                options: ["a".into(), "b".into(), "c".into()],
                correct_index: 0,
            }
        }

        // Find a seed whose first two quiz chunks drew different questions
        for seed in 0..32 {
            let pool = QuestionPool::new((0..8).map(question).collect());
            let mut state = GameState::new(seed, pool, Tuning::default());
            for i in 1..=12 {
                state.update_progress(i, 0.0);
            }
            let q10 = state.chunk(10).and_then(|c| c.question.clone()).unwrap();
            let q20 = state.chunk(20).and_then(|c| c.question.clone()).unwrap();
            if q10 == q20 {
                continue;
            }

            assert_eq!(state.current_question, q20);

            // The sampler resolves quiz chunk 10 while player_chunk sits at
            // 12: selection must key off the sampled chunk, so its still
            // uncollected markers take the display back
            state.update_progress(10, 0.5);
            assert_eq!(state.current_question, q10);

            // Past 60% of the sampled quiz chunk the display looks ahead
            state.update_progress(10, 0.7);
            assert_eq!(state.current_question, q20);
            return;
        }
        panic!("no seed produced distinct quiz questions");
    }

    #[test]
    fn test_reset_regenerates_same_opening_track() {
        let mut state = new_state(77);
        let opening: Vec<_> = state.chunks.iter().map(|c| c.chunk_type).collect();
        for i in 1..=6 {
            state.update_progress(i, 0.0);
        }
        state.reset();
        let regenerated: Vec<_> = state.chunks.iter().map(|c| c.chunk_type).collect();
        assert_eq!(opening, regenerated);
        assert_eq!(state.player_chunk, 0);
    }
}
