//! AI competitors
//!
//! Bots live as (chunk id, progress) pairs and only resolve to world
//! coordinates on demand, so they survive track pruning gracefully: a bot
//! whose chunk is gone simply skips physics and rendering that tick.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chunk::TrackChunk;
use crate::consts::{CHUNK_LENGTH, TRACK_WIDTH};
use crate::tuning::Tuning;

/// One AI kart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub id: u32,
    /// Chunk the bot currently occupies
    pub chunk_id: u32,
    /// Fraction of that chunk already covered (0..1)
    pub progress: f32,
    /// Signed lateral offset from the centerline
    pub lane_offset: f32,
    /// Forward speed (world units per tick)
    pub speed: f32,
    /// Cosmetic body color (linear RGB)
    pub color: [f32; 3],
}

impl Competitor {
    /// Resolve the bot's world position and heading on its chunk's spline.
    /// Progress maps into the interior span of the ghost-extended point list
    /// so bots glide smoothly across chunk seams.
    pub fn world_position(&self, chunk: &TrackChunk) -> Option<(Vec3, f32)> {
        let curve = chunk.render_spline()?;
        let len = chunk.render_points.len();
        if len < 4 {
            return None;
        }
        let t_start = 1.0 / (len - 1) as f32;
        let t_end = (len - 2) as f32 / (len - 1) as f32;
        let t = t_start + self.progress.clamp(0.0, 1.0) * (t_end - t_start);

        let point = curve.point_at(t);
        let tangent = curve.tangent_at(t);
        let side = Vec3::Y.cross(tangent).normalize_or_zero();
        let heading = tangent.x.atan2(tangent.z);
        Some((point + side * self.lane_offset, heading))
    }
}

/// The fixed roster lined up at race start: two on the opening chunk, one a
/// chunk ahead, distinct lanes and speeds.
pub fn starting_grid() -> Vec<Competitor> {
    vec![
        Competitor {
            id: 1,
            chunk_id: 0,
            progress: 0.8,
            lane_offset: -5.0,
            speed: 0.35,
            color: [1.0, 0.0, 0.0],
        },
        Competitor {
            id: 2,
            chunk_id: 0,
            progress: 0.6,
            lane_offset: 5.0,
            speed: 0.45,
            color: [0.0, 1.0, 0.0],
        },
        Competitor {
            id: 3,
            chunk_id: 1,
            progress: 0.2,
            lane_offset: 0.0,
            speed: 0.5,
            color: [1.0, 1.0, 0.0],
        },
    ]
}

/// Spawn a replacement bot ahead of the player with randomized lane, speed,
/// and color.
fn spawn(rng: &mut Pcg32, id: u32, chunk_id: u32, tuning: &Tuning) -> Competitor {
    Competitor {
        id,
        chunk_id,
        progress: 0.0,
        lane_offset: rng.random::<f32>() * TRACK_WIDTH - TRACK_WIDTH / 2.0,
        speed: rng.random_range(tuning.bot_speed_min..tuning.bot_speed_max),
        color: [rng.random(), rng.random(), rng.random()],
    }
}

/// One tick of the competitor lifecycle: cull stragglers, top up the field
/// ahead of the player, advance everyone along their chunk.
pub fn update_competitors(
    competitors: &mut Vec<Competitor>,
    player_chunk: u32,
    next_bot_id: &mut u32,
    rng: &mut Pcg32,
    tuning: &Tuning,
) {
    // Cull bots more than one chunk behind the player
    competitors.retain(|c| c.chunk_id + 1 >= player_chunk);

    let ahead = competitors
        .iter()
        .filter(|c| c.chunk_id > player_chunk)
        .count();
    if ahead < tuning.bot_target_ahead {
        let id = *next_bot_id;
        *next_bot_id += 1;
        let chunk_id = player_chunk + tuning.bot_spawn_ahead;
        competitors.push(spawn(rng, id, chunk_id, tuning));
    }

    for c in competitors.iter_mut() {
        c.progress += c.speed * tuning.bot_rate / CHUNK_LENGTH;
        if c.progress >= 1.0 {
            c.progress -= 1.0;
            c.chunk_id += 1;
        }
    }
}
