//! Deterministic kart simulation core
//!
//! Everything that decides gameplay lives here, behind a fixed 60 Hz tick:
//! - [`chunk`]: procedural track generation (chunk chain, quiz gates, coins,
//!   ramps) with self-intersection avoidance
//! - [`spline`]: Catmull-Rom centerline sampling
//! - [`sampler`]: nearest-centerline resolution for collision and progress
//! - [`vehicle`]: arcade car physics with the two-angle drift model
//! - [`competitor`]: AI karts that follow the track on rails
//! - [`state`]: the session aggregate and its quiz / scoring state machine
//! - [`tick`]: the per-frame orchestrator
//!
//! Rendering and input mapping stay outside; callers drive the sim through
//! [`tick::tick`] and read it back through [`state::GameState::snapshot`].

pub mod chunk;
pub mod competitor;
pub mod sampler;
pub mod spline;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use chunk::{ChunkGenerator, ChunkType, ItemBox, Obstacle, ObstacleKind, TrackChunk};
pub use competitor::Competitor;
pub use sampler::{TrackSample, sample_track};
pub use spline::Spline;
pub use state::{GameState, GameStatus, Snapshot};
pub use tick::{TickInput, tick};
pub use vehicle::{Controls, VehicleState};
