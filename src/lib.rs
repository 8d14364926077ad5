//! Team Clubs - hoop-toss simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (trajectories, bounces, hoops, spawning, rounds)
//! - `config`: Data-driven tuning loaded from JSON
//! - `effects`: Named effect cues routed through an injected table

pub mod config;
pub mod effects;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use effects::{Effect, EffectChannel, EffectCue, EffectTable};

use glam::Vec3;

/// Simulation configuration constants
pub mod consts {
    /// Fixed trajectory integration step (seconds of simulated time)
    pub const TIME_STEP: f32 = 0.01;
    /// Simulated seconds that pass per host second while a ball is in flight
    pub const TIME_ACCELERATION: f32 = 0.75;
    /// Host loop fixed delta (50 Hz)
    pub const FIXED_DT: f32 = 1.0 / 50.0;

    /// Surfaces whose normal has at least this dot with up are floor-like
    pub const FLOOR_DOT_THRESHOLD: f32 = 0.8;
    /// Distance a ball is lifted off a surface after bouncing
    pub const RAY_SKIN: f32 = 1e-4;

    /// Default gravity along Y (units/s²)
    pub const GRAVITY_Y: f32 = -9.8;

    /// Round length in seconds
    pub const ROUND_TIME: f32 = 30.0;
    /// How long a started effect lingers before it is ended
    pub const EFFECT_LINGER: f32 = 1.0;

    /// Moving hoop defaults
    pub const MOVING_HOOP_SPEED: f32 = 2.0;
    pub const MOVING_HOOP_THRESHOLD: f32 = 0.1;
    pub const MOVING_HOOP_UNITS: i32 = 1;

    /// Fallback cell count along an axis when its cell size is not positive
    pub const FALLBACK_CELL_COUNT: i32 = 5;
}

/// World up axis
pub const UP: Vec3 = Vec3::Y;

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Where `value` sits between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_delta || dist <= f32::EPSILON {
        target
    } else {
        current + delta / dist * max_delta
    }
}

/// Distance of `offset` from the axis through the origin along `axis`
///
/// `axis` must be unit length. Used for cylinder tests: the offset is
/// projected onto the plane normal to the axis.
#[inline]
pub fn planar_distance(offset: Vec3, axis: Vec3) -> f32 {
    let along = offset.dot(axis);
    (offset.length_squared() - along * along).max(0.0).sqrt()
}
