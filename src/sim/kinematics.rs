//! Closed-form projectile kinematics
//!
//! Everything here is pure math over constant acceleration. The stepper
//! samples `velocity_at` every fixed step; `time_of_flight` is the single
//! source for "how long until the arc returns to launch height", used by
//! path previews and to re-seed the preview budget after a bounce.

use glam::Vec3;

/// Instantaneous velocity `u + g*t`
#[inline]
pub fn velocity_at(u: Vec3, g: Vec3, t: f32) -> Vec3 {
    u + g * t
}

/// Displacement from the launch point after `t` seconds: `u*t + ½g*t²`
#[inline]
pub fn displacement_at(u: Vec3, g: Vec3, t: f32) -> Vec3 {
    u * t + 0.5 * g * t * t
}

/// Peak height gained above the launch point, `-u_y² / 2g_y`
///
/// Zero when gravity does not pull down or the launch is not upward.
pub fn apex_height(u: Vec3, g: Vec3) -> f32 {
    if g.y >= 0.0 || u.y <= 0.0 {
        return 0.0;
    }
    -(u.y * u.y) / (2.0 * g.y)
}

/// Time for an arc launched with `u` under `g` to return to launch height
///
/// Solves `a·t² + b·t + c = 0` with `a = g_y`, `b = 2u_y`, `c = -2h` where
/// `h` is the apex height, then doubles the largest non-negative root.
/// A negative discriminant clamps to zero; no vertical gravity means the
/// arc never comes back and the flight time is reported as zero.
pub fn time_of_flight(u: Vec3, g: Vec3) -> f32 {
    if g.y == 0.0 {
        return 0.0;
    }
    let h = -(u.y * u.y) / (2.0 * g.y);
    let a = g.y;
    let b = 2.0 * u.y;
    let c = -2.0 * h;
    let disc = (b * b - 4.0 * a * c).max(0.0);
    let sqrt_disc = disc.sqrt();

    let t1 = (-b + sqrt_disc) / (2.0 * a);
    let t2 = (-b - sqrt_disc) / (2.0 * a);

    2.0 * t1.max(t2).max(0.0)
}

/// Time to cover `s` along one axis starting at speed `u` with acceleration `a`
///
/// Solves `s = u·t + ½a·t²` for the smallest positive root. Returns `None`
/// when the distance is never reached (no real root, or only negative ones).
pub fn time_to_travel(s: f32, u: f32, a: f32) -> Option<f32> {
    if s == 0.0 {
        return Some(0.0);
    }
    if a.abs() <= f32::EPSILON {
        if u == 0.0 {
            return None;
        }
        let t = s / u;
        return (t > 0.0).then_some(t);
    }

    // ½a·t² + u·t - s = 0
    let qa = 0.5 * a;
    let disc = u * u + 4.0 * qa * s;
    if disc < 0.0 {
        return None;
    }
    // Stable form: avoids cancellation when `a` is tiny
    let q = -0.5 * (u + u.signum() * disc.sqrt());
    let r1 = q / qa;
    let r2 = if q != 0.0 { -s / q } else { r1 };

    [r1, r2]
        .into_iter()
        .filter(|t| *t > 0.0)
        .min_by(|a, b| a.total_cmp(b))
}
