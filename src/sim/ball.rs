//! Ball controller
//!
//! Owns the current throw and the accumulated ball clock. Each host tick
//! advances the clock by `dt * time_acceleration` and re-derives the state
//! from the release parameters, so the ball's placement never depends on
//! anything but `(params, elapsed)`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::trajectory::{BallState, BounceEvent, ReleaseParameters, StepperConfig, Trajectory};
use super::world::{Body, RayCaster, SurfaceFilter, layers};
use crate::consts::GRAVITY_Y;

/// Physical tuning shared by every throw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSettings {
    pub rest_position: Vec3,
    pub gravity: Vec3,
    pub bounce_count: u32,
    pub velocity_reduction_factor: f32,
    pub gravity_modulation: f32,
    pub bounce_filter: SurfaceFilter,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            rest_position: Vec3::new(0.0, 1.0, 0.0),
            gravity: Vec3::new(0.0, GRAVITY_Y, 0.0),
            bounce_count: 2,
            velocity_reduction_factor: 0.5,
            gravity_modulation: 0.1,
            bounce_filter: SurfaceFilter::layer(layers::FLOOR).with(layers::BOARD),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    rest_position: Vec3,
    config: StepperConfig,
    trajectory: Option<Trajectory>,
    elapsed: f32,
    state: BallState,
    /// Bounces already handed out by `advance`
    reported_bounces: usize,
}

impl Ball {
    pub fn new(id: u32, rest_position: Vec3, config: StepperConfig) -> Self {
        Self {
            id,
            rest_position,
            config,
            trajectory: None,
            elapsed: 0.0,
            state: BallState::at_rest(rest_position),
            reported_bounces: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.trajectory.is_some()
    }

    /// Throw the ball. Ignored (returns false) while a throw is in flight.
    pub fn release(&mut self, params: ReleaseParameters) -> bool {
        if self.trajectory.is_some() {
            log::debug!("Ball {} already in flight, release ignored", self.id);
            return false;
        }
        self.trajectory = Some(Trajectory::new(params, self.config));
        self.elapsed = 0.0;
        self.reported_bounces = 0;
        self.state = BallState {
            position: params.initial_position,
            velocity: params.initial_velocity,
            remaining_bounces: params.bounce_count,
            elapsed_time: 0.0,
            mode: Default::default(),
        };
        true
    }

    /// Advance the ball clock by `dt` host seconds
    ///
    /// Returns the bounces that happened since the previous call.
    pub fn advance(&mut self, dt: f32, world: &impl RayCaster) -> Vec<BounceEvent> {
        let Some(trajectory) = self.trajectory.as_mut() else {
            return Vec::new();
        };

        // The ball clock never runs backwards
        self.elapsed += dt.max(0.0) * self.config.time_acceleration;
        self.state = trajectory.state_at(self.elapsed, world);

        let start = self.reported_bounces.min(trajectory.bounces().len());
        let fresh = trajectory.bounces()[start..].to_vec();
        self.reported_bounces = trajectory.bounces().len();
        for bounce in &fresh {
            log::debug!(
                "Ball {} bounce {:?} at {:?} (t={:.2})",
                self.id,
                bounce.kind,
                bounce.point,
                bounce.time
            );
        }
        fresh
    }

    pub fn current_state(&self) -> BallState {
        self.state
    }

    /// Drop the throw and put the ball back at its rest position
    pub fn reset(&mut self) {
        self.trajectory = None;
        self.elapsed = 0.0;
        self.reported_bounces = 0;
        self.state = BallState::at_rest(self.rest_position);
    }

    /// The ball as an overlap-query body
    pub fn body(&self) -> Body {
        Body {
            id: self.id,
            position: self.state.position,
            velocity: self.state.velocity,
            layer: layers::BALL,
        }
    }
}
