//! Track chunks and the procedural chunk generator
//!
//! Chunks are appended strictly sequentially: each one starts exactly at the
//! previous chunk's end point and heading. The generator picks a weighted
//! random chunk type, walks fixed-length segments to produce control points,
//! rejects candidates that come too close to older track, and falls back to a
//! straight segment when nothing validates.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::spline::Spline;
use crate::consts::*;
use crate::quiz::{QuestionPool, QuizQuestion};

/// Closed set of chunk geometries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkType {
    Straight,
    Left,
    Right,
    UTurnLeft,
    UTurnRight,
}

impl ChunkType {
    /// Constant heading change applied per generated segment
    pub fn angle_delta(self) -> f32 {
        match self {
            ChunkType::Straight => 0.0,
            ChunkType::Left => 0.15,
            ChunkType::Right => -0.15,
            ChunkType::UTurnLeft => 0.5,
            ChunkType::UTurnRight => -0.5,
        }
    }

    pub fn is_u_turn(self) -> bool {
        matches!(self, ChunkType::UTurnLeft | ChunkType::UTurnRight)
    }
}

/// A quiz answer marker placed across the track at a quiz chunk's midpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBox {
    /// Index of this marker within its chunk (0..3)
    pub id: u32,
    pub position: Vec3,
    /// Option text displayed on the marker
    pub text: String,
    pub is_correct: bool,
    /// Write-once: collection never un-happens
    pub is_collected: bool,
}

/// Obstacle payloads; only coins carry collection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Coin { collected: bool },
    Ramp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    /// Index of this obstacle within its chunk
    pub id: u32,
    pub kind: ObstacleKind,
    pub position: Vec3,
    /// Heading of the track tangent where the obstacle sits
    pub heading: f32,
}

/// One fixed-length segment of procedurally generated track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackChunk {
    /// Monotonic, never reused
    pub id: u32,
    pub chunk_type: ChunkType,
    pub start_point: Vec3,
    pub end_point: Vec3,
    /// Headings in radians
    pub start_angle: f32,
    pub end_angle: f32,
    /// This chunk's own centerline spline points; first equals the previous
    /// chunk's end point
    pub control_points: Vec<Vec3>,
    /// Control points extended by one ghost point on each side, used only for
    /// seam-free interpolation across chunk boundaries. The trailing ghost is
    /// patched once the next chunk exists.
    pub render_points: Vec<Vec3>,
    /// Quiz answer markers (empty or exactly 3)
    pub items: Vec<ItemBox>,
    pub obstacles: Vec<Obstacle>,
    /// Question assigned to a quiz chunk
    pub question: Option<QuizQuestion>,
}

impl TrackChunk {
    /// Quiz chunks sit on a fixed id interval past the opening stretch
    pub fn is_quiz_id(id: u32) -> bool {
        id > QUIZ_MIN_ID && id % QUIZ_INTERVAL == 0
    }

    /// Centerline spline over this chunk's own control points
    pub fn centerline(&self) -> Option<Spline<'_>> {
        Spline::new(&self.control_points)
    }

    /// Spline over the ghost-extended point list (for rendering/competitors)
    pub fn render_spline(&self) -> Option<Spline<'_>> {
        Spline::new(&self.render_points)
    }

    pub fn item_mut(&mut self, item_id: u32) -> Option<&mut ItemBox> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    pub fn obstacle_mut(&mut self, obstacle_id: u32) -> Option<&mut Obstacle> {
        self.obstacles.iter_mut().find(|o| o.id == obstacle_id)
    }

    pub fn has_uncollected_items(&self) -> bool {
        self.items.iter().any(|i| !i.is_collected)
    }
}

/// Result of walking one candidate geometry
struct Walk {
    points: Vec<Vec3>,
    end_point: Vec3,
    end_angle: f32,
    angle_delta: f32,
}

/// Procedural track generator. Owns its RNG stream so a session seed pins the
/// exact generated sequence, and its own geometry history so self-intersection
/// validation keeps working after the live chunk list is pruned for rendering.
#[derive(Debug, Clone)]
pub struct ChunkGenerator {
    seed: u64,
    next_id: u32,
    rng: Pcg32,
    forced_fallbacks: u32,
    /// Id of the most recent u-turn chunk
    last_u_turn: Option<u32>,
    /// Control points of the last `HISTORY_WINDOW` generated chunks, oldest
    /// first; outlives render pruning
    history: VecDeque<Vec<Vec3>>,
}

impl ChunkGenerator {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            seed,
            next_id: 0,
            rng: Pcg32::seed_from_u64(seed),
            forced_fallbacks: 0,
            last_u_turn: None,
            history: VecDeque::new(),
        }
    }

    /// Restart id assignment and the RNG stream from the session seed
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    /// Times the generator had to force a straight segment because every
    /// candidate came too close to older track
    pub fn forced_fallbacks(&self) -> u32 {
        self.forced_fallbacks
    }

    /// The canonical opening chunk: dead straight from the origin, no content
    pub fn first_chunk(&mut self) -> TrackChunk {
        let id = self.next_id;
        self.next_id += 1;

        let start = Vec3::ZERO;
        let end = Vec3::new(0.0, 0.0, CHUNK_LENGTH);
        self.record_history(&[start, end]);
        TrackChunk {
            id,
            chunk_type: ChunkType::Straight,
            start_point: start,
            end_point: end,
            start_angle: 0.0,
            end_angle: 0.0,
            control_points: vec![start, end],
            render_points: vec![
                Vec3::new(0.0, 0.0, -CHUNK_LENGTH),
                start,
                end,
                Vec3::new(0.0, 0.0, CHUNK_LENGTH * 2.0),
            ],
            items: Vec::new(),
            obstacles: Vec::new(),
            question: None,
        }
    }

    /// Generate the next chunk, geometrically continuous with `prev`.
    /// Self-intersection is validated against the generator's own recorded
    /// history, so callers may prune their live chunk list freely.
    pub fn generate(&mut self, prev: &TrackChunk, pool: &QuestionPool) -> TrackChunk {
        let id = self.next_id;
        self.next_id += 1;

        let is_quiz = Self::quiz_gate(id);
        let is_pre_quiz = Self::quiz_gate(id + 1);

        let start_point = prev.end_point;
        let start_angle = prev.end_angle;

        let candidates = if is_quiz || is_pre_quiz {
            vec![ChunkType::Straight]
        } else {
            self.pick_candidates(id)
        };

        let mut chosen: Option<(ChunkType, Walk)> = None;
        for candidate in candidates {
            let walk = walk_geometry(start_point, start_angle, candidate);
            if !self.collides_with_history(&walk.points) {
                chosen = Some((candidate, walk));
                break;
            }
        }

        let (chunk_type, walk) = chosen.unwrap_or_else(|| {
            // Last resort: a straight segment, accepted unconditionally
            self.forced_fallbacks += 1;
            log::debug!("chunk {id}: no candidate validated, forcing straight");
            (
                ChunkType::Straight,
                walk_geometry(start_point, start_angle, ChunkType::Straight),
            )
        });

        if chunk_type.is_u_turn() {
            self.last_u_turn = Some(id);
        }
        self.record_history(&walk.points);

        let render_points = ghost_extended(prev, &walk);

        let mut chunk = TrackChunk {
            id,
            chunk_type,
            start_point,
            end_point: walk.end_point,
            start_angle,
            end_angle: walk.end_angle,
            control_points: walk.points,
            render_points,
            items: Vec::new(),
            obstacles: Vec::new(),
            question: None,
        };

        if is_quiz {
            self.place_quiz_markers(&mut chunk, pool);
        } else if id > 2 {
            self.place_obstacles(&mut chunk);
        }

        chunk
    }

    /// Patch the previous chunk's trailing ghost point now that its successor
    /// exists, so interpolation is seam-free across the boundary.
    pub fn patch_ghost(prev: &mut TrackChunk, next: &TrackChunk) {
        if let (Some(last), Some(&second)) =
            (prev.render_points.last_mut(), next.control_points.get(1))
        {
            *last = second;
        }
    }

    fn quiz_gate(id: u32) -> bool {
        TrackChunk::is_quiz_id(id)
    }

    /// Candidate rejection: any candidate point within the safety distance of
    /// any recorded control point is a self-intersection. The last two
    /// recorded chunks are geometrically adjacent by construction and are
    /// excluded; validation only starts once the history is warm.
    fn collides_with_history(&self, points: &[Vec3]) -> bool {
        if self.history.len() < 5 {
            return false;
        }
        let end = self.history.len() - 2;
        for recorded in self.history.iter().take(end) {
            for p1 in points {
                for p2 in recorded {
                    if p1.distance(*p2) < SAFE_DISTANCE {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn record_history(&mut self, points: &[Vec3]) {
        self.history.push_back(points.to_vec());
        while self.history.len() > HISTORY_WINDOW {
            self.history.pop_front();
        }
    }

    /// Weighted type selection with the u-turn cooldown applied
    fn pick_candidates(&mut self, id: u32) -> Vec<ChunkType> {
        let can_u_turn = self
            .last_u_turn
            .is_none_or(|last| id - last > UTURN_COOLDOWN);

        let roll: f32 = self.rng.random();
        let preferred = if can_u_turn && roll < 0.1 {
            ChunkType::UTurnLeft
        } else if can_u_turn && roll < 0.2 {
            ChunkType::UTurnRight
        } else if roll < 0.5 {
            ChunkType::Left
        } else if roll < 0.8 {
            ChunkType::Right
        } else {
            ChunkType::Straight
        };

        let mut candidates = vec![preferred];
        if preferred != ChunkType::Straight {
            candidates.push(ChunkType::Straight);
        }
        if preferred != ChunkType::Left && preferred != ChunkType::Right {
            candidates.push(ChunkType::Left);
        }
        candidates
    }

    /// Quiz chunks: one drawn question, three markers spaced across the track
    /// at the chunk midpoint, exactly one correct.
    fn place_quiz_markers(&mut self, chunk: &mut TrackChunk, pool: &QuestionPool) {
        let question = pool.draw(&mut self.rng);

        let Some(curve) = chunk.centerline() else {
            return;
        };
        let mid = chunk.control_points[chunk.control_points.len() / 2];
        let side = curve.side_at(0.5);
        let spacing = TRACK_WIDTH / 3.0;

        for (i, option) in question.options.iter().enumerate() {
            // Markers run left-to-right across the track: -spacing, 0, +spacing
            let lateral = (i as f32 - 1.0) * spacing;
            chunk.items.push(ItemBox {
                id: i as u32,
                position: mid + side * lateral,
                text: option.clone(),
                is_correct: question.correct_index == i,
                is_collected: false,
            });
        }
        chunk.question = Some(question);
    }

    /// Non-quiz content: occasionally a ramp with an arc of coins over it
    /// (straight chunks only), more often a short run of coins, often nothing.
    fn place_obstacles(&mut self, chunk: &mut TrackChunk) {
        let roll: f32 = self.rng.random();

        // Sample the curve into a local list first; pushing onto the chunk
        // while its centerline is borrowed would alias it
        let mut obstacles = Vec::new();
        let Some(curve) = chunk.centerline() else {
            return;
        };

        if roll < 0.15 && chunk.chunk_type == ChunkType::Straight {
            let pos = curve.point_at(0.5);
            let tangent = curve.tangent_at(0.5);
            let heading = tangent.x.atan2(tangent.z);

            obstacles.push(Obstacle {
                id: 0,
                kind: ObstacleKind::Ramp,
                position: pos,
                heading,
            });

            // Three coins in an ascending arc past the ramp lip
            for i in 0..3u32 {
                let forward = 4.0 + i as f32 * 2.5;
                let height = 3.5 + (i as f32 * 1.5).sin() * 1.5;
                let mut coin_pos = pos + tangent * forward;
                coin_pos.y += height;
                obstacles.push(Obstacle {
                    id: 1 + i,
                    kind: ObstacleKind::Coin { collected: false },
                    position: coin_pos,
                    heading,
                });
            }
        } else if roll < 0.75 {
            let zig_zag = self.rng.random::<f32>() <= 0.5;
            for k in 0..5u32 {
                let t = 0.3 + k as f32 * 0.1;
                let offset = if zig_zag { (k as f32).sin() * 3.0 } else { 0.0 };
                let tangent = curve.tangent_at(t);
                let heading = tangent.x.atan2(tangent.z);
                let mut pos = curve.point_at(t) + curve.side_at(t) * offset;
                pos.y = 0.6;
                obstacles.push(Obstacle {
                    id: k,
                    kind: ObstacleKind::Coin { collected: false },
                    position: pos,
                    heading,
                });
            }
        }

        chunk.obstacles = obstacles;
    }
}

/// Walk fixed-length segments from the start pose, turning by the type's
/// angular delta each segment.
fn walk_geometry(start_point: Vec3, start_angle: f32, chunk_type: ChunkType) -> Walk {
    let segment_length = CHUNK_LENGTH / CHUNK_SEGMENTS as f32;
    let d_angle = chunk_type.angle_delta();

    let mut points = Vec::with_capacity(CHUNK_SEGMENTS + 1);
    points.push(start_point);
    let mut angle = start_angle;
    let mut pos = start_point;
    for _ in 0..CHUNK_SEGMENTS {
        angle += d_angle;
        pos += crate::heading_to_dir(angle) * segment_length;
        points.push(pos);
    }

    Walk {
        points,
        end_point: pos,
        end_angle: angle,
        angle_delta: d_angle,
    }
}

/// Ghost points: reuse the previous chunk's penultimate point before the
/// start, extrapolate one segment past the end. The trailing ghost is
/// provisional until `patch_ghost` runs for the next chunk.
fn ghost_extended(prev: &TrackChunk, walk: &Walk) -> Vec<Vec3> {
    let segment_length = CHUNK_LENGTH / CHUNK_SEGMENTS as f32;

    let ghost_start = if prev.control_points.len() >= 2 {
        prev.control_points[prev.control_points.len() - 2]
    } else {
        walk.points[0] - crate::heading_to_dir(prev.end_angle) * segment_length
    };

    let ghost_angle = walk.end_angle + walk.angle_delta;
    let ghost_end = walk.end_point + crate::heading_to_dir(ghost_angle) * segment_length;

    let mut render = Vec::with_capacity(walk.points.len() + 2);
    render.push(ghost_start);
    render.extend_from_slice(&walk.points);
    render.push(ghost_end);
    render
}
