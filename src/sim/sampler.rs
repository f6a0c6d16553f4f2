//! Nearest-centerline and progress resolution
//!
//! Given a world position and the chunks near the player, find the closest
//! sampled centerline point (flat, ground-plane distance) and the chunk id /
//! normalized progress it belongs to. A sample only claims the active chunk
//! when it falls inside a broad-phase band around the track, so a far-off
//! chunk whose centerline happens to be nearest in absolute terms never
//! captures the player.

use glam::Vec3;

use super::chunk::TrackChunk;
use crate::consts::*;
use crate::flat_distance;

/// Broad-phase band: half the track plus a margin
const BROAD_PHASE: f32 = TRACK_WIDTH / 2.0 + 10.0;

/// Result of resolving a world position against the track
#[derive(Debug, Clone, Copy)]
pub struct TrackSample {
    /// Ground-plane distance to the nearest sampled centerline point
    pub distance: f32,
    /// That nearest centerline point (on the ground plane)
    pub point: Vec3,
    /// Chunk whose centerline claimed the position
    pub chunk_id: u32,
    /// Normalized progress (0..1) within that chunk
    pub progress: f32,
}

/// Resolve `position` against all chunks within ±1 of the player's chunk.
/// Falls back to the player's current chunk at progress 0 when nothing is in
/// broad-phase range (e.g. launched off a ramp far from the track).
pub fn sample_track(chunks: &[TrackChunk], position: Vec3, player_chunk: u32) -> TrackSample {
    let mut sample = TrackSample {
        distance: f32::INFINITY,
        point: Vec3::ZERO,
        chunk_id: player_chunk,
        progress: 0.0,
    };

    for chunk in chunks {
        if chunk.id.abs_diff(player_chunk) > 1 {
            continue;
        }
        let Some(curve) = chunk.centerline() else {
            continue;
        };

        for i in 0..=SAMPLE_DIVISIONS {
            let t = i as f32 / SAMPLE_DIVISIONS as f32;
            let p = curve.point_at(t);
            let flat = Vec3::new(p.x, 0.0, p.z);
            let d = flat_distance(flat, position);

            if d < sample.distance {
                sample.distance = d;
                sample.point = flat;
                if d < BROAD_PHASE {
                    sample.chunk_id = chunk.id;
                    sample.progress = t;
                }
            }
        }
    }

    sample
}
