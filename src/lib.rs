//! Quiz Kart - an endless-runner kart simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track generation, physics, competitors, game state)
//! - `tuning`: Data-driven gameplay balance
//! - `quiz`: Question pool supplied by the caller, drawn by quiz chunks
//! - `persistence`: Best score / lesson selection through an opaque key-value surface
//!
//! Rendering, audio, HUD, and raw input are external collaborators: the
//! simulation consumes a pre-normalized control vector and exposes read-only
//! snapshots once per completed tick.

pub mod persistence;
pub mod quiz;
pub mod sim;
pub mod tuning;

pub use quiz::{QuestionPool, QuizQuestion};
pub use tuning::Tuning;

use glam::Vec3;

/// Shared geometry and timing constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Total track width (wall to wall)
    pub const TRACK_WIDTH: f32 = 12.0;
    /// Length of one track chunk along its centerline
    pub const CHUNK_LENGTH: f32 = 40.0;
    /// Fixed-length segments walked per chunk during generation
    pub const CHUNK_SEGMENTS: usize = 5;

    /// Chunks generated ahead of the canonical first chunk at track init
    pub const INITIAL_CHUNKS_AHEAD: usize = 8;
    /// Quiz chunks occur at id > QUIZ_MIN_ID and id % QUIZ_INTERVAL == 0
    pub const QUIZ_MIN_ID: u32 = 4;
    pub const QUIZ_INTERVAL: u32 = 10;
    /// Minimum id gap between u-turn chunks (prevents self-intersecting spirals)
    pub const UTURN_COOLDOWN: u32 = 8;
    /// History window scanned for self-intersection during generation
    pub const HISTORY_WINDOW: usize = 50;
    /// Candidate points closer than this to older track are rejected
    pub const SAFE_DISTANCE: f32 = TRACK_WIDTH * 2.0;

    /// Centerline subdivisions sampled per chunk when resolving position
    pub const SAMPLE_DIVISIONS: usize = 20;

    /// Chunks kept behind the player before pruning from the front
    pub const PRUNE_MARGIN: u32 = 2;
    /// Render snapshot window relative to the player chunk
    pub const SNAPSHOT_BEHIND: u32 = 2;
    pub const SNAPSHOT_AHEAD: u32 = 6;
}

/// Normalize an angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Unit direction on the ground plane for a heading angle.
///
/// Heading 0 points down +Z; positive headings turn toward +X.
#[inline]
pub fn heading_to_dir(heading: f32) -> Vec3 {
    Vec3::new(heading.sin(), 0.0, heading.cos())
}

/// Ground-plane (XZ) distance between two points, ignoring height
#[inline]
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}
