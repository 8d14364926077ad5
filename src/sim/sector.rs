//! Scoring sector geometry
//!
//! A hoop scores through a vertical cylindrical sector standing on the hoop
//! base: bounded above and below by rings `height` apart, radially by an
//! inner and an outer radius, and angularly by a field of view centred on
//! the hoop's forward axis. A body scores only when every gate passes in
//! the same tick and it is moving down through the hoop.
//!
//! All sidedness tests are strict: a body exactly on a boundary is outside.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::planar_distance;

/// Shape of a scoring sector, in the hoop's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringSector {
    pub height: f32,
    pub outer_radius: f32,
    /// Bodies this close to the axis are rejected (rim grazes)
    pub inner_radius: f32,
    /// Full angular width in degrees, centred on forward
    pub fov_deg: f32,
    /// Minimum `dot(velocity_dir, -up)` for a shot to count as from the top
    pub success_threshold: f32,
}

impl Default for ScoringSector {
    fn default() -> Self {
        Self {
            height: 1.0,
            outer_radius: 1.0,
            inner_radius: 0.1,
            fov_deg: 90.0,
            success_threshold: 0.5,
        }
    }
}

/// Result of every individual gate for one body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringGates {
    pub within_right: bool,
    pub within_left: bool,
    pub within_bottom: bool,
    pub within_top: bool,
    pub inside_radius: bool,
    pub outside_inner_radius: bool,
    pub from_top: bool,
}

impl ScoringGates {
    /// A score registers only when every gate passes
    pub fn passed(&self) -> bool {
        self.within_right
            && self.within_left
            && self.within_bottom
            && self.within_top
            && self.inside_radius
            && self.outside_inner_radius
            && self.from_top
    }
}

/// Sign of `cross(v, edge)` measured along `axis`
#[inline]
fn side(v: Vec3, edge: Vec3, axis: Vec3) -> f32 {
    v.cross(edge).dot(axis)
}

impl ScoringSector {
    /// Sector edge directions `(min_left, max_right)` for a hoop orientation
    ///
    /// These are forward rotated by `∓fov/2` about the hoop's up axis.
    pub fn boundary_directions(&self, orientation: Quat) -> (Vec3, Vec3) {
        let right = orientation * Vec3::X;
        let forward = orientation * Vec3::Z;
        let half = (self.fov_deg * 0.5).to_radians();
        let (sin, cos) = half.sin_cos();
        (forward * cos - right * sin, forward * cos + right * sin)
    }

    /// Evaluate every gate for a body at `position` moving with `velocity`
    ///
    /// `base` and `orientation` place the sector: local +Y is up, +Z is
    /// forward, +X is right.
    pub fn evaluate(
        &self,
        base: Vec3,
        orientation: Quat,
        position: Vec3,
        velocity: Vec3,
    ) -> ScoringGates {
        let up = orientation * Vec3::Y;
        let right = orientation * Vec3::X;
        let forward = orientation * Vec3::Z;
        let (min_left, max_right) = self.boundary_directions(orientation);

        let from_base = position - base;
        let from_top_ring = position - (base + up * self.height);
        let dir_base = from_base.normalize_or_zero();
        let dir_top = from_top_ring.normalize_or_zero();

        let radial = planar_distance(from_base, up);

        ScoringGates {
            within_right: side(dir_base, max_right, up) > 0.0,
            within_left: side(dir_base, min_left, up) < 0.0,
            within_bottom: side(dir_base, forward, right) > 0.0,
            within_top: side(dir_top, forward, right) < 0.0,
            inside_radius: radial <= self.outer_radius,
            outside_inner_radius: radial > self.inner_radius,
            from_top: velocity.normalize_or_zero().dot(-up) > self.success_threshold,
        }
    }

    pub fn scores(&self, base: Vec3, orientation: Quat, position: Vec3, velocity: Vec3) -> bool {
        self.evaluate(base, orientation, position, velocity).passed()
    }
}
