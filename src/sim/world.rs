//! Environment queries consumed by the simulation
//!
//! The stepper and hoop triggers only ever talk to the world through two
//! queries: a ray cast (for bounce surfaces) and an oriented-box overlap
//! (for hoop triggers). A host engine implements [`RayCaster`] and
//! [`OverlapQuery`]; [`Scene`] is a small analytic implementation used by
//! tests and the headless demo.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Well-known layer indices used by the default configuration
pub mod layers {
    pub const FLOOR: u32 = 0;
    pub const BOARD: u32 = 1;
    pub const BALL: u32 = 2;
}

/// Bit mask selecting which layers a query considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceFilter(pub u32);

impl SurfaceFilter {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// Filter containing a single layer
    pub const fn layer(index: u32) -> Self {
        Self(1 << index)
    }

    pub const fn with(self, index: u32) -> Self {
        Self(self.0 | (1 << index))
    }

    #[inline]
    pub fn contains_layer(&self, index: u32) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }
}

/// Result of a successful ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Surface normal facing the incoming ray
    pub normal: Vec3,
    pub distance: f32,
}

/// Ray intersection against bounce surfaces
pub trait RayCaster {
    /// Nearest hit along `direction` (unit length) within `max_distance`
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: SurfaceFilter,
    ) -> Option<RayHit>;
}

/// A moving body that can be reported by overlap queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub layer: u32,
}

/// Oriented box overlap against bodies
pub trait OverlapQuery {
    fn overlap_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        orientation: Quat,
        filter: SurfaceFilter,
    ) -> Vec<Body>;
}

impl OverlapQuery for [Body] {
    fn overlap_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        orientation: Quat,
        filter: SurfaceFilter,
    ) -> Vec<Body> {
        let bounds = OrientedBox {
            center,
            half_extents,
            orientation,
        };
        self.iter()
            .filter(|b| filter.contains_layer(b.layer) && bounds.contains(b.position))
            .copied()
            .collect()
    }
}

/// Reflect a direction off a surface with unit normal `normal`
#[inline]
pub fn reflect(v: Vec3, normal: Vec3) -> Vec3 {
    v - 2.0 * v.dot(normal) * normal
}

/// Box with arbitrary orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    #[serde(default = "identity")]
    pub orientation: Quat,
}

fn identity() -> Quat {
    Quat::IDENTITY
}

impl OrientedBox {
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            orientation: Quat::IDENTITY,
        }
    }

    /// Check if a point lies inside the box (inclusive)
    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.orientation.inverse() * (point - self.center);
        local.abs().cmple(self.half_extents).all()
    }
}

/// Analytic bounce surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Surface {
    /// Infinite plane through `point`
    Plane { point: Vec3, normal: Vec3, layer: u32 },
    /// Finite rectangle in the local XY plane of `orientation`, facing local +Z
    Quad {
        center: Vec3,
        orientation: Quat,
        half_size: Vec2,
        layer: u32,
    },
}

impl Surface {
    pub fn layer(&self) -> u32 {
        match self {
            Surface::Plane { layer, .. } | Surface::Quad { layer, .. } => *layer,
        }
    }

    fn intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let (point, normal) = match self {
            Surface::Plane { point, normal, .. } => (*point, normal.normalize_or_zero()),
            Surface::Quad {
                center, orientation, ..
            } => (*center, *orientation * Vec3::Z),
        };

        let denom = direction.dot(normal);
        if denom.abs() <= f32::EPSILON {
            return None;
        }
        let t = (point - origin).dot(normal) / denom;
        if t <= 0.0 || t > max_distance {
            return None;
        }

        let hit_point = origin + direction * t;
        if let Surface::Quad {
            center,
            orientation,
            half_size,
            ..
        } = self
        {
            let local = orientation.inverse() * (hit_point - *center);
            if local.x.abs() > half_size.x || local.y.abs() > half_size.y {
                return None;
            }
        }

        // Two-sided: report the normal facing the incoming ray
        let normal = if denom > 0.0 { -normal } else { normal };
        Some(RayHit {
            point: hit_point,
            normal,
            distance: t,
        })
    }
}

/// Static collection of bounce surfaces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub surfaces: Vec<Surface>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Horizontal floor at `height`
    pub fn with_floor(mut self, height: f32, layer: u32) -> Self {
        self.surfaces.push(Surface::Plane {
            point: Vec3::new(0.0, height, 0.0),
            normal: Vec3::Y,
            layer,
        });
        self
    }

    /// Vertical board centred at `center` facing `-Z` (back toward the thrower)
    pub fn with_backboard(mut self, center: Vec3, half_size: Vec2, layer: u32) -> Self {
        self.surfaces.push(Surface::Quad {
            center,
            orientation: Quat::from_rotation_y(std::f32::consts::PI),
            half_size,
            layer,
        });
        self
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surfaces.push(surface);
        self
    }
}

impl RayCaster for Scene {
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: SurfaceFilter,
    ) -> Option<RayHit> {
        self.surfaces
            .iter()
            .filter(|s| filter.contains_layer(s.layer()))
            .filter_map(|s| s.intersect(origin, direction, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_off_floor() {
        let v = reflect(Vec3::new(1.0, -2.0, 0.5), Vec3::Y);
        assert_eq!(v, Vec3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_floor_hit_and_filter() {
        let scene = Scene::new().with_floor(0.0, layers::FLOOR);
        let hit = scene
            .cast(
                Vec3::new(0.0, 1.0, 0.0),
                -Vec3::Y,
                5.0,
                SurfaceFilter::layer(layers::FLOOR),
            )
            .unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-6);
        assert_eq!(hit.normal, Vec3::Y);

        // Filtered out
        assert!(
            scene
                .cast(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 5.0, SurfaceFilter::layer(layers::BOARD))
                .is_none()
        );
        // Too short
        assert!(
            scene
                .cast(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 0.5, SurfaceFilter::ALL)
                .is_none()
        );
    }

    #[test]
    fn test_ray_leaving_surface_does_not_rehit() {
        let scene = Scene::new().with_floor(0.0, layers::FLOOR);
        assert!(scene.cast(Vec3::ZERO, Vec3::Y, 10.0, SurfaceFilter::ALL).is_none());
    }

    #[test]
    fn test_sloped_plane_surface() {
        let normal = Vec3::new(0.0, 1.0, -1.0).normalize();
        let scene = Scene::new().with_surface(Surface::Plane {
            point: Vec3::ZERO,
            normal,
            layer: layers::FLOOR,
        });
        let hit = scene
            .cast(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 5.0, SurfaceFilter::ALL)
            .unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!((hit.normal - normal).length() < 1e-5);
    }

    #[test]
    fn test_backboard_bounds_and_normal() {
        let scene = Scene::new().with_backboard(
            Vec3::new(0.0, 3.0, 10.0),
            Vec2::new(1.0, 1.0),
            layers::BOARD,
        );
        let hit = scene
            .cast(Vec3::new(0.0, 3.0, 9.0), Vec3::Z, 2.0, SurfaceFilter::ALL)
            .unwrap();
        assert!((hit.point.z - 10.0).abs() < 1e-5);
        assert!(hit.normal.dot(-Vec3::Z) > 0.99);

        // Passes beside the board
        assert!(
            scene
                .cast(Vec3::new(3.0, 3.0, 9.0), Vec3::Z, 2.0, SurfaceFilter::ALL)
                .is_none()
        );
    }

    #[test]
    fn test_overlap_box_filters_bodies() {
        let bodies = [
            Body {
                id: 1,
                position: Vec3::new(0.2, 0.0, 0.0),
                velocity: Vec3::ZERO,
                layer: layers::BALL,
            },
            Body {
                id: 2,
                position: Vec3::new(5.0, 0.0, 0.0),
                velocity: Vec3::ZERO,
                layer: layers::BALL,
            },
            Body {
                id: 3,
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                layer: layers::FLOOR,
            },
        ];
        let found = bodies.overlap_box(
            Vec3::ZERO,
            Vec3::splat(0.5),
            Quat::IDENTITY,
            SurfaceFilter::layer(layers::BALL),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_oriented_box_rotation() {
        let b = OrientedBox {
            center: Vec3::ZERO,
            half_extents: Vec3::new(2.0, 0.5, 0.5),
            orientation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        };
        // Long axis now lies along world Z
        assert!(b.contains(Vec3::new(0.0, 0.0, 1.5)));
        assert!(!b.contains(Vec3::new(1.5, 0.0, 0.0)));
    }
}
