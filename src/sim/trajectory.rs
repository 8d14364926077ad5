//! Fixed-step trajectory with bounces
//!
//! A released ball's whole path is a pure function of its
//! [`ReleaseParameters`] and the elapsed simulated time: the stepper starts
//! at `t = 0` and walks fixed steps up to "now", casting a ray along each
//! step to find bounce surfaces. [`Trajectory`] keeps the last stepped
//! prefix so advancing time only walks the new steps; asking for an earlier
//! time replays from scratch and gives the same answer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::kinematics::{time_of_flight, velocity_at};
use super::world::{RayCaster, SurfaceFilter, reflect};
use crate::consts::*;
use crate::UP;

/// How the ball moves between bounces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrajectoryMode {
    /// Free-fall arc under gravity
    #[default]
    Projectile,
    /// Straight glide at a fixed velocity after hitting a steep surface
    Sliding,
}

/// Everything needed to replay a throw; fixed once the ball is released
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReleaseParameters {
    pub initial_position: Vec3,
    pub initial_velocity: Vec3,
    /// Launch speed vector from the aim; its length sets post-bounce speed
    pub input_speed: Vec3,
    pub gravity: Vec3,
    pub bounce_count: u32,
    /// Fraction of launch speed kept after a floor bounce, in [0, 1]
    pub velocity_reduction_factor: f32,
    /// Fraction of gravity added to the glide after a steep bounce, in [0, 1]
    pub gravity_modulation: f32,
    pub bounce_filter: SurfaceFilter,
}

/// Snapshot of a ball at some elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub remaining_bounces: u32,
    pub elapsed_time: f32,
    pub mode: TrajectoryMode,
}

impl BallState {
    /// A ball resting at `position` before release
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            remaining_bounces: 0,
            elapsed_time: 0.0,
            mode: TrajectoryMode::Projectile,
        }
    }
}

/// Stepper tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepperConfig {
    /// Simulated seconds per step
    pub time_step: f32,
    /// Simulated seconds per host second
    pub time_acceleration: f32,
    /// Minimum `dot(normal, up)` for a surface to count as floor
    pub floor_dot_threshold: f32,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            time_step: TIME_STEP,
            time_acceleration: TIME_ACCELERATION,
            floor_dot_threshold: FLOOR_DOT_THRESHOLD,
        }
    }
}

/// Which kind of surface a bounce hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BounceKind {
    /// Near-horizontal: relaunch as a new arc
    Floor,
    /// Steep (backboard-like): glide
    Board,
}

/// One reflection along the path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceEvent {
    /// Simulated time of the step that hit
    pub time: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub kind: BounceKind,
    /// Velocity the ball leaves the surface with
    pub outgoing: Vec3,
}

/// Resumable stepping state
#[derive(Debug, Clone)]
struct Stepper {
    steps: u32,
    position: Vec3,
    /// Base velocity of the current segment (launch velocity for arcs)
    segment_velocity: Vec3,
    /// Simulated time the current segment started
    segment_start: f32,
    /// Velocity actually used by the last step
    velocity: Vec3,
    mode: TrajectoryMode,
    remaining_bounces: u32,
    bounces: Vec<BounceEvent>,
}

impl Stepper {
    fn start(params: &ReleaseParameters) -> Self {
        Self {
            steps: 0,
            position: params.initial_position,
            segment_velocity: params.initial_velocity,
            segment_start: 0.0,
            velocity: params.initial_velocity,
            mode: TrajectoryMode::Projectile,
            remaining_bounces: params.bounce_count,
            bounces: Vec::new(),
        }
    }

    /// Advance one fixed step, returning the bounce it produced (if any)
    fn step(
        &mut self,
        params: &ReleaseParameters,
        config: &StepperConfig,
        world: &impl RayCaster,
    ) -> Option<BounceEvent> {
        let dt = config.time_step;
        let now = self.steps as f32 * dt;
        self.steps += 1;

        let candidate = match self.mode {
            TrajectoryMode::Projectile => {
                velocity_at(self.segment_velocity, params.gravity, now - self.segment_start)
            }
            TrajectoryMode::Sliding => self.segment_velocity,
        };

        let travel = candidate.length() * dt;
        let hit = if self.remaining_bounces > 0 && travel > 0.0 {
            world.cast(self.position, candidate.normalize(), travel, params.bounce_filter)
        } else {
            None
        };

        let Some(hit) = hit else {
            self.position += candidate * dt;
            self.velocity = candidate;
            return None;
        };

        // Lift off the surface so the next cast does not find it again
        self.position = hit.point + hit.normal * RAY_SKIN;
        let reflected = reflect(candidate.normalize_or_zero(), hit.normal).normalize_or_zero();

        let kind = if hit.normal.dot(UP) >= config.floor_dot_threshold {
            self.segment_velocity =
                reflected * (params.input_speed.length() * params.velocity_reduction_factor);
            self.segment_start = now;
            self.mode = TrajectoryMode::Projectile;
            BounceKind::Floor
        } else {
            self.segment_velocity = reflected + params.gravity * params.gravity_modulation;
            self.mode = TrajectoryMode::Sliding;
            BounceKind::Board
        };

        self.velocity = self.segment_velocity;
        self.remaining_bounces -= 1;

        let event = BounceEvent {
            time: now,
            point: hit.point,
            normal: hit.normal,
            kind,
            outgoing: self.velocity,
        };
        self.bounces.push(event);
        Some(event)
    }

    /// Step until the step clock reaches `elapsed`
    fn run_to(
        &mut self,
        elapsed: f32,
        params: &ReleaseParameters,
        config: &StepperConfig,
        world: &impl RayCaster,
    ) {
        if config.time_step <= 0.0 {
            return;
        }
        while (self.steps as f32) * config.time_step < elapsed {
            self.step(params, config, world);
        }
    }

    fn snapshot(&self, elapsed: f32) -> BallState {
        BallState {
            position: self.position,
            velocity: self.velocity,
            remaining_bounces: self.remaining_bounces,
            elapsed_time: elapsed,
            mode: self.mode,
        }
    }
}

/// Replay a throw from scratch up to `elapsed` simulated seconds
pub fn simulate(
    params: &ReleaseParameters,
    config: &StepperConfig,
    elapsed: f32,
    world: &impl RayCaster,
) -> BallState {
    let mut stepper = Stepper::start(params);
    stepper.run_to(elapsed, params, config, world);
    stepper.snapshot(elapsed)
}

/// A released throw with a cached stepped prefix
#[derive(Debug, Clone)]
pub struct Trajectory {
    params: ReleaseParameters,
    config: StepperConfig,
    cache: Stepper,
    cached_elapsed: f32,
}

impl Trajectory {
    pub fn new(params: ReleaseParameters, config: StepperConfig) -> Self {
        Self {
            cache: Stepper::start(&params),
            params,
            config,
            cached_elapsed: 0.0,
        }
    }

    /// Ball state after `elapsed` simulated seconds
    ///
    /// Identical to [`simulate`] with the same arguments.
    pub fn state_at(&mut self, elapsed: f32, world: &impl RayCaster) -> BallState {
        if elapsed < self.cached_elapsed {
            self.cache = Stepper::start(&self.params);
        }
        self.cache.run_to(elapsed, &self.params, &self.config, world);
        self.cached_elapsed = elapsed;
        self.cache.snapshot(elapsed)
    }

    /// Bounces up to the last requested time, oldest first
    pub fn bounces(&self) -> &[BounceEvent] {
        &self.cache.bounces
    }
}

/// Sample the path a throw would take, for aim previews
///
/// The budget starts at the launch arc's time of flight and is re-seeded
/// from the outgoing velocity on every floor bounce. Sampling stops when
/// the budget runs out or `max_points` positions have been collected.
pub fn preview_path(
    params: &ReleaseParameters,
    config: &StepperConfig,
    world: &impl RayCaster,
    max_points: usize,
) -> Vec<Vec3> {
    let mut stepper = Stepper::start(params);
    let mut points = Vec::with_capacity(max_points.min(1024));
    if max_points == 0 || config.time_step <= 0.0 {
        return points;
    }
    points.push(stepper.position);

    let mut budget = time_of_flight(params.initial_velocity, params.gravity);
    while budget > 0.0 && points.len() < max_points {
        let bounce = stepper.step(params, config, world);
        budget -= config.time_step;
        if let Some(BounceEvent {
            kind: BounceKind::Floor,
            outgoing,
            ..
        }) = bounce
        {
            budget = time_of_flight(outgoing, params.gravity);
        }
        points.push(stepper.position);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::kinematics::apex_height;
    use crate::sim::world::{Scene, layers};
    use glam::Vec2;

    const G: Vec3 = Vec3::new(0.0, -9.8, 0.0);

    fn throw(velocity: Vec3, bounces: u32) -> ReleaseParameters {
        ReleaseParameters {
            initial_position: Vec3::new(0.0, 1.0, 0.0),
            initial_velocity: velocity,
            input_speed: velocity,
            gravity: G,
            bounce_count: bounces,
            velocity_reduction_factor: 0.5,
            gravity_modulation: 1.0,
            bounce_filter: SurfaceFilter::ALL,
        }
    }

    fn floor() -> Scene {
        Scene::new().with_floor(0.0, layers::FLOOR)
    }

    #[test]
    fn test_unobstructed_arc_peaks_at_half_flight() {
        let params = ReleaseParameters {
            initial_position: Vec3::ZERO,
            ..throw(Vec3::new(0.0, 5.0, 5.0), 0)
        };
        let config = StepperConfig::default();
        let empty = Scene::new();
        let tof = time_of_flight(params.initial_velocity, G);

        let mid = simulate(&params, &config, tof / 2.0, &empty);
        let early = simulate(&params, &config, tof / 4.0, &empty);
        let late = simulate(&params, &config, tof * 0.75, &empty);

        let expected = apex_height(params.initial_velocity, G);
        assert!((mid.position.y - expected).abs() < 0.05, "apex {}", mid.position.y);
        assert!(mid.position.y > early.position.y);
        assert!(mid.position.y > late.position.y);
        assert_eq!(mid.mode, TrajectoryMode::Projectile);
        // Forward motion is uniform
        assert!((mid.position.z - 5.0 * tof / 2.0).abs() < 0.1);
    }

    #[test]
    fn test_zero_elapsed_is_release_point() {
        let params = throw(Vec3::new(0.0, 3.0, 2.0), 2);
        let state = simulate(&params, &StepperConfig::default(), 0.0, &floor());
        assert_eq!(state.position, params.initial_position);
        assert_eq!(state.velocity, params.initial_velocity);
        assert_eq!(state.remaining_bounces, 2);
    }

    #[test]
    fn test_floor_bounce_relaunches_at_reduced_speed() {
        let params = throw(Vec3::new(0.0, 2.0, 3.0), 1);
        let config = StepperConfig::default();
        let mut trajectory = Trajectory::new(params, config);
        let state = trajectory.state_at(1.5, &floor());

        let bounces = trajectory.bounces();
        assert_eq!(bounces.len(), 1);
        assert_eq!(bounces[0].kind, BounceKind::Floor);
        assert!(bounces[0].point.y.abs() < 1e-4);
        let expected = params.input_speed.length() * params.velocity_reduction_factor;
        assert!((bounces[0].outgoing.length() - expected).abs() < 1e-4);
        assert!(bounces[0].outgoing.y > 0.0);
        assert_eq!(state.remaining_bounces, 0);
    }

    #[test]
    fn test_exhausted_budget_falls_through_floor() {
        let params = throw(Vec3::new(0.0, 0.0, 1.0), 0);
        let state = simulate(&params, &StepperConfig::default(), 2.0, &floor());
        assert!(state.position.y < 0.0);
        assert_eq!(state.remaining_bounces, 0);
    }

    #[test]
    fn test_backboard_hit_switches_to_sliding() {
        let scene = Scene::new().with_backboard(
            Vec3::new(0.0, 1.0, 2.0),
            Vec2::new(2.0, 2.0),
            layers::BOARD,
        );
        let mut params = throw(Vec3::new(0.0, 0.0, 8.0), 1);
        params.gravity = Vec3::ZERO;
        params.gravity_modulation = 0.5;

        let mut trajectory = Trajectory::new(params, StepperConfig::default());
        let state = trajectory.state_at(0.5, &scene);

        assert_eq!(state.mode, TrajectoryMode::Sliding);
        assert_eq!(trajectory.bounces()[0].kind, BounceKind::Board);
        // Reflected direction, not rescaled to launch speed
        assert!((state.velocity - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
        assert!(state.position.z < 2.0);
    }

    #[test]
    fn test_cached_replay_matches_fresh_replay() {
        let params = throw(Vec3::new(0.5, 4.0, 3.0), 3);
        let config = StepperConfig::default();
        let scene = floor();
        let mut trajectory = Trajectory::new(params, config);

        for elapsed in [0.1, 0.37, 0.9, 1.4, 2.2, 0.6, 3.0] {
            let cached = trajectory.state_at(elapsed, &scene);
            let fresh = simulate(&params, &config, elapsed, &scene);
            assert_eq!(cached, fresh, "diverged at {elapsed}");
        }
    }

    #[test]
    fn test_preview_follows_bounces() {
        let params = throw(Vec3::new(0.0, 3.0, 2.0), 1);
        let config = StepperConfig::default();
        let points = preview_path(&params, &config, &floor(), 10_000);

        assert_eq!(points[0], params.initial_position);
        // Budget is re-seeded at the bounce, so the preview runs past the first landing
        let landing = points.iter().position(|p| p.y.abs() < 1e-3).unwrap();
        assert!(points.len() > landing + 1);
        assert!(points[..landing].iter().all(|p| p.y > 0.0));
        assert!(points[landing + 1..].iter().any(|p| p.y > 0.1));

        let capped = preview_path(&params, &config, &floor(), 5);
        assert_eq!(capped.len(), 5);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn floor_bounce_speed_is_input_speed_times_factor(
                vy in -6.0f32..-0.5,
                vz in 0.0f32..6.0,
                speed in 0.5f32..15.0,
                factor in 0.0f32..=1.0,
            ) {
                let mut params = throw(Vec3::new(0.0, vy, vz), 1);
                params.input_speed = Vec3::new(0.0, speed, 0.0);
                params.velocity_reduction_factor = factor;

                let mut trajectory = Trajectory::new(params, StepperConfig::default());
                trajectory.state_at(3.0, &floor());
                let bounce = trajectory.bounces()[0];
                prop_assert_eq!(bounce.kind, BounceKind::Floor);
                let expected = speed * factor;
                let error = (bounce.outgoing.length() - expected).abs();
                prop_assert!(error <= 1e-4 * (1.0 + expected));
            }
        }
    }
}
