//! Player vehicle state and per-tick integration
//!
//! The drift feel comes from a two-angle model: `facing` responds to steering
//! immediately, while `course` (the direction the car actually travels) chases
//! facing through an exponential blend. Drifting lowers the blend rate, so the
//! car visibly oversteers relative to its path.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::normalize_angle;
use crate::tuning::Tuning;

/// Pre-normalized control vector; no raw key codes reach the simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub drift: bool,
}

/// Player vehicle; owned and mutated exclusively by the simulation tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Vec3,
    /// Visual heading, follows steering input immediately
    pub facing: f32,
    /// Direction of travel, lags facing (drift inertia)
    pub course: f32,
    /// Signed forward speed (world units per tick)
    pub speed: f32,
    /// Vertical velocity while airborne
    pub velocity_y: f32,
    /// Ticks drift has been held above the minimum speed
    pub drift_ticks: u32,
    /// Ticks the current steer direction has been held
    pub steer_ticks: u32,
    /// Last non-zero steer direction (+1 left, -1 right)
    pub last_steer: i8,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            facing: 0.0,
            course: 0.0,
            speed: 0.0,
            velocity_y: 0.0,
            drift_ticks: 0,
            steer_ticks: 0,
            last_steer: 0,
        }
    }
}

impl VehicleState {
    /// Back to the starting grid (IDLE detects any offset and calls this)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_at_origin(&self) -> bool {
        self.position == Vec3::ZERO && self.speed == 0.0
    }

    /// Grounded enough for steering, walls, and ramp triggers
    pub fn is_grounded(&self, tuning: &Tuning) -> bool {
        self.position.y < tuning.ground_ceiling
    }

    /// Accelerate / brake / coast against the effective top speed
    pub fn apply_longitudinal(&mut self, controls: Controls, current_max: f32, tuning: &Tuning) {
        if controls.forward {
            if self.speed < current_max {
                self.speed = (self.speed + tuning.acceleration).min(current_max);
            }
        } else if controls.backward {
            self.speed = (self.speed - tuning.braking).max(-current_max / 2.0);
        } else if self.speed > 0.0 {
            self.speed = (self.speed - tuning.friction).max(0.0);
        } else if self.speed < 0.0 {
            self.speed = (self.speed + tuning.friction).min(0.0);
        }

        // A multiplier change can leave us above the new max; bleed it off
        // rather than snapping
        if self.speed > current_max {
            self.speed = current_max.max(self.speed - tuning.friction * 2.0);
        }
    }

    /// Steering, the steer ramp, drift, and the facing→course blend
    pub fn apply_steering(&mut self, controls: Controls, tuning: &Tuning) {
        let steer = controls.left as i8 - controls.right as i8;

        let drifting = controls.drift && self.speed.abs() > tuning.min_drive_speed;
        if drifting {
            self.drift_ticks = self.drift_ticks.saturating_add(1);
        } else {
            // Releasing drift snaps the multiplier back to 1x
            self.drift_ticks = 0;
        }

        let moving = self.speed.abs() > 0.01;
        if steer != 0 && moving && self.is_grounded(tuning) {
            if steer == self.last_steer {
                self.steer_ticks = (self.steer_ticks + 1).min(tuning.steer_ramp_ticks);
            } else {
                // Direction reversal restarts the ramp
                self.steer_ticks = 0;
            }
            self.last_steer = steer;

            let reverse = if self.speed > 0.0 { 1.0 } else { -1.0 };
            let rate =
                tuning.turn_speed * self.steer_ramp(tuning) * self.drift_multiplier(tuning);
            self.facing += rate * steer as f32 * reverse;
        } else {
            // Released: the ramp decays much faster than it builds
            self.steer_ticks = self.steer_ticks.saturating_sub(4);
        }

        let grip = if drifting { tuning.drift_grip } else { tuning.grip };
        self.course += normalize_angle(self.facing - self.course) * grip;
    }

    /// Turn-rate multiplier from holding one steer direction (~0.6 s to saturate)
    pub fn steer_ramp(&self, tuning: &Tuning) -> f32 {
        let t = self.steer_ticks as f32 / tuning.steer_ramp_ticks as f32;
        1.0 + t.min(1.0) * (tuning.steer_ramp_max - 1.0)
    }

    /// Drift turn multiplier: engages at `drift_mult_min`, climbs toward
    /// `drift_mult_max` the longer the slide is held
    pub fn drift_multiplier(&self, tuning: &Tuning) -> f32 {
        if self.drift_ticks == 0 {
            return 1.0;
        }
        let t = (self.drift_ticks as f32 / tuning.drift_ramp_ticks as f32).min(1.0);
        tuning.drift_mult_min + t * (tuning.drift_mult_max - tuning.drift_mult_min)
    }

    /// Gravity integration; landing clamps to the ground and zeroes velocity
    pub fn apply_vertical(&mut self, tuning: &Tuning) {
        self.position.y += self.velocity_y;
        if self.position.y > 0.0 {
            self.velocity_y -= tuning.gravity;
        }
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity_y = 0.0;
        }
    }

    /// Translate along the course direction
    pub fn advance(&mut self) {
        self.position += crate::heading_to_dir(self.course) * self.speed;
    }

    /// Roll out with no steering (FINISHED and PAUSED)
    pub fn decay_speed(&mut self, tuning: &Tuning) {
        self.speed = (self.speed - tuning.friction * 2.0).max(0.0);
    }

    /// Cosmetic body roll target for the renderer
    pub fn lean_angle(&self, controls: Controls) -> f32 {
        let steer = controls.left as i8 - controls.right as i8;
        let lean = if controls.drift { 1.5 } else { 0.8 };
        -(steer as f32) * self.speed * lean
    }

    /// Cosmetic nose pitch while airborne
    pub fn pitch(&self) -> f32 {
        self.velocity_y * 0.5
    }
}
