//! Aim mapping
//!
//! Turns a normalized aim (`heading`, `power`, both in `[0, 1]`) into
//! release parameters. Heading sweeps the launch direction across the
//! forward half plane from `-X` through `+Z` to `+X`; power picks the
//! forward speed through a response curve. The elevation angle is fixed.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::ball::BallSettings;
use super::curve::Curve;
use super::trajectory::ReleaseParameters;
use crate::{UP, lerp};

/// Normalized player input
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AimInput {
    pub heading: f32,
    pub power: f32,
}

impl AimInput {
    pub fn new(heading: f32, power: f32) -> Self {
        Self { heading, power }
    }

    /// Straight ahead at the given power
    pub fn straight(power: f32) -> Self {
        Self::new(0.5, power)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimSettings {
    /// Maps the (range-remapped) power to a fraction of `max_forward_speed`
    pub speed_curve: Curve,
    /// Horizontal launch speed at full power
    pub max_forward_speed: f32,
    pub elevation_deg: f32,
    /// Heading input is remapped into this sub-range of `[0, 1]`
    pub heading_range: Vec2,
    /// Power input is remapped into this sub-range of `[0, 1]`
    pub power_range: Vec2,
}

impl Default for AimSettings {
    fn default() -> Self {
        Self {
            speed_curve: Curve::new([(0.0, 0.0), (1.0, 1.0)]),
            max_forward_speed: 9.0,
            elevation_deg: 45.0,
            heading_range: Vec2::new(0.1, 0.9),
            power_range: Vec2::new(0.3, 1.0),
        }
    }
}

impl AimSettings {
    /// Horizontal launch direction for a heading input
    pub fn heading_direction(&self, heading: f32) -> Vec3 {
        let t = lerp(self.heading_range.x, self.heading_range.y, heading.clamp(0.0, 1.0));
        let angle = std::f32::consts::PI * t;
        Vec3::new(-angle.cos(), 0.0, angle.sin())
    }

    /// Launch speed vector in the throw's own frame: `(0, vy, vx)`
    pub fn input_speed(&self, power: f32) -> Vec3 {
        let t = lerp(self.power_range.x, self.power_range.y, power.clamp(0.0, 1.0));
        let vx = self.speed_curve.evaluate(t) * self.max_forward_speed;
        let vy = self.elevation_deg.to_radians().tan() * vx;
        Vec3::new(0.0, vy, vx)
    }

    pub fn release(&self, input: AimInput, ball: &BallSettings) -> ReleaseParameters {
        let input_speed = self.input_speed(input.power);
        let elevation = self.elevation_deg.to_radians();
        let direction =
            self.heading_direction(input.heading) * elevation.cos() + UP * elevation.sin();

        ReleaseParameters {
            initial_position: ball.rest_position,
            initial_velocity: direction * input_speed.length(),
            input_speed,
            gravity: ball.gravity,
            bounce_count: ball.bounce_count,
            velocity_reduction_factor: ball.velocity_reduction_factor,
            gravity_modulation: ball.gravity_modulation,
            bounce_filter: ball.bounce_filter,
        }
    }
}
