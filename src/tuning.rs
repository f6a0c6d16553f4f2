//! Data-driven gameplay balance
//!
//! Every tuned threshold and multiplier the simulation consumes lives here as
//! a named field so callers can override it. Defaults reproduce the intended
//! arcade feel. Validation happens once when the config is supplied; the
//! per-tick path assumes a valid `Tuning`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tuning value that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidTuning {
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTuning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid tuning: {} {}", self.field, self.reason)
    }
}

impl std::error::Error for InvalidTuning {}

/// Gameplay tuning. Speeds and accelerations are in world units per tick at
/// the fixed 60 Hz step; durations are in ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    // === Longitudinal ===
    /// Base top speed (boost/penalty multiply this)
    pub max_speed: f32,
    /// Speed gained per tick on forward input
    pub acceleration: f32,
    /// Speed lost per tick on backward input
    pub braking: f32,
    /// Passive speed decay per tick with no input
    pub friction: f32,

    // === Steering & drift ===
    /// Base turn rate (radians per tick)
    pub turn_speed: f32,
    /// Ticks of same-direction hold for the steer ramp to saturate (~0.6 s)
    pub steer_ramp_ticks: u32,
    /// Turn-rate multiplier at full steer ramp
    pub steer_ramp_max: f32,
    /// Drift multiplier at the instant drift is engaged
    pub drift_mult_min: f32,
    /// Drift multiplier after a long-held power slide
    pub drift_mult_max: f32,
    /// Ticks of held drift to reach `drift_mult_max`
    pub drift_ramp_ticks: u32,
    /// Minimum speed for drift (and ramp launches) to engage
    pub min_drive_speed: f32,
    /// Course-follows-facing blend rate per tick
    pub grip: f32,
    /// Blend rate while drifting (lower = more oversteer)
    pub drift_grip: f32,

    // === Vertical ===
    /// Downward acceleration per tick while airborne
    pub gravity: f32,
    /// Upward impulse applied by a ramp
    pub jump_force: f32,
    /// Below this height the car counts as grounded for steering/walls
    pub ground_ceiling: f32,

    // === Quiz effects ===
    /// Top-speed multiplier while the boost timer runs
    pub boost_multiplier: f32,
    /// Top-speed multiplier while the penalty timer runs
    pub penalty_multiplier: f32,
    /// Duration of either effect, in ticks (~10 s)
    pub effect_ticks: u32,
    /// How long feedback messages stay visible, in ticks (~2 s)
    pub feedback_ticks: u32,

    // === Collision radii ===
    /// Pickup radius for quiz answer markers
    pub item_radius: f32,
    /// Pickup radius for coins
    pub coin_radius: f32,
    /// Trigger radius for ramps
    pub ramp_radius: f32,
    /// Forward speed multiplier on a ramp launch
    pub ramp_boost: f32,
    /// Ramp boost ceiling, as a multiple of the current max speed
    pub ramp_speed_ceiling: f32,
    /// Half the car's width, subtracted from the half track width for walls
    pub car_half_width: f32,
    /// Speed multiplier applied while scraping a wall
    pub wall_scrape: f32,
    /// Bonus score per collected coin
    pub coin_bonus: u32,

    // === Competitors ===
    /// Bots kept strictly ahead of the player
    pub bot_target_ahead: usize,
    /// Chunks ahead of the player where replacements spawn
    pub bot_spawn_ahead: u32,
    /// Bot forward speed range (world units per tick)
    pub bot_speed_min: f32,
    pub bot_speed_max: f32,
    /// Per-tick progress normalization factor (speed * rate / chunk length)
    pub bot_rate: f32,
    /// Soft-collision radius between the car and a bot
    pub bot_radius: f32,
    /// Distance the car is pushed per soft collision
    pub bot_push: f32,
    /// Speed multiplier applied on a bot bump
    pub bot_bump_damping: f32,

    // === Session ===
    /// Race clock in ticks; `None` runs the endless variant
    pub race_clock_ticks: Option<u32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_speed: 0.4,
            acceleration: 0.006,
            braking: 0.02,
            friction: 0.002,

            turn_speed: 0.0125,
            steer_ramp_ticks: 36,
            steer_ramp_max: 1.8,
            drift_mult_min: 1.1,
            drift_mult_max: 4.0,
            drift_ramp_ticks: 90,
            min_drive_speed: 0.1,
            grip: 0.18,
            drift_grip: 0.05,

            gravity: 0.015,
            jump_force: 0.35,
            ground_ceiling: 2.0,

            boost_multiplier: 1.5,
            penalty_multiplier: 0.5,
            effect_ticks: 600,
            feedback_ticks: 120,

            item_radius: 2.5,
            coin_radius: 2.0,
            ramp_radius: 3.0,
            ramp_boost: 1.2,
            ramp_speed_ceiling: 1.5,
            car_half_width: 1.0,
            wall_scrape: 0.95,
            coin_bonus: 50,

            bot_target_ahead: 3,
            bot_spawn_ahead: 4,
            bot_speed_min: 0.35,
            bot_speed_max: 0.55,
            bot_rate: 0.5,
            bot_radius: 2.0,
            bot_push: 0.5,
            bot_bump_damping: 0.8,

            race_clock_ticks: None,
        }
    }
}

impl Tuning {
    /// Check the config once at supply time so the per-tick path never has to
    pub fn validate(&self) -> Result<(), InvalidTuning> {
        let positive: [(&'static str, f32); 8] = [
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("turn_speed", self.turn_speed),
            ("gravity", self.gravity),
            ("jump_force", self.jump_force),
            ("item_radius", self.item_radius),
            ("coin_radius", self.coin_radius),
            ("ramp_radius", self.ramp_radius),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(InvalidTuning {
                    field,
                    reason: "must be positive and finite",
                });
            }
        }
        if self.penalty_multiplier <= 0.0 || self.penalty_multiplier >= 1.0 {
            return Err(InvalidTuning {
                field: "penalty_multiplier",
                reason: "must be in (0, 1)",
            });
        }
        if self.boost_multiplier <= 1.0 {
            return Err(InvalidTuning {
                field: "boost_multiplier",
                reason: "must exceed 1",
            });
        }
        if self.drift_mult_max < self.drift_mult_min {
            return Err(InvalidTuning {
                field: "drift_mult_max",
                reason: "must be >= drift_mult_min",
            });
        }
        if self.bot_speed_max < self.bot_speed_min {
            return Err(InvalidTuning {
                field: "bot_speed_max",
                reason: "must be >= bot_speed_min",
            });
        }
        if self.car_half_width >= crate::consts::TRACK_WIDTH / 2.0 {
            return Err(InvalidTuning {
                field: "car_half_width",
                reason: "must be less than the half track width",
            });
        }
        Ok(())
    }

    /// Effective top speed for the current boost/penalty timers
    pub fn current_max_speed(&self, boost_timer: u32, penalty_timer: u32) -> f32 {
        if boost_timer > 0 {
            self.max_speed * self.boost_multiplier
        } else if penalty_timer > 0 {
            self.max_speed * self.penalty_multiplier
        } else {
            self.max_speed
        }
    }
}
