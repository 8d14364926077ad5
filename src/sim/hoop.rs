//! Hoops: spawned scoring targets
//!
//! A hoop is a scoring sector placed at a grid cell. Static hoops stay put;
//! axis movers ping-pong between their spawn cell and one neighbouring
//! cell. Each tick the hoop asks the world which bodies are inside its
//! trigger box and tests only those against the sector.

use glam::{IVec3, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::SpawnGrid;
use super::sector::ScoringSector;
use super::world::{Body, OrientedBox, OverlapQuery, SurfaceFilter};
use crate::consts::*;
use crate::move_towards;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> IVec3 {
        match self {
            Axis::X => IVec3::X,
            Axis::Y => IVec3::Y,
            Axis::Z => IVec3::Z,
        }
    }

    #[inline]
    pub fn component(self, v: IVec3) -> i32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HoopBehavior {
    #[default]
    Static,
    MoveAlongAxis(Axis),
}

impl HoopBehavior {
    pub fn axis(&self) -> Option<Axis> {
        match self {
            HoopBehavior::Static => None,
            HoopBehavior::MoveAlongAxis(axis) => Some(*axis),
        }
    }

    pub fn is_moving(&self) -> bool {
        self.axis().is_some()
    }
}

/// Per-behaviour hoop blueprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoopTemplate {
    pub behavior: HoopBehavior,
    pub sector: ScoringSector,
    pub orientation: Quat,
    /// Trigger box centre relative to the hoop base, in the hoop frame
    pub trigger_offset: Vec3,
    pub trigger_half_extents: Vec3,
    pub move_speed: f32,
    /// How many cells an axis mover travels
    pub move_units: i32,
    pub move_threshold: f32,
}

impl Default for HoopTemplate {
    fn default() -> Self {
        Self {
            behavior: HoopBehavior::Static,
            sector: ScoringSector::default(),
            orientation: Quat::IDENTITY,
            trigger_offset: Vec3::new(0.0, 0.5, 0.5),
            trigger_half_extents: Vec3::new(1.0, 0.5, 1.0),
            move_speed: MOVING_HOOP_SPEED,
            move_units: MOVING_HOOP_UNITS,
            move_threshold: MOVING_HOOP_THRESHOLD,
        }
    }
}

/// What the scheduler recorded when it placed a hoop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoopSpec {
    pub id: u32,
    pub behavior: HoopBehavior,
    pub sector: ScoringSector,
    pub cell: IVec3,
}

/// Two-point oscillator for axis movers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    pub origin: Vec3,
    pub target: Vec3,
    pub target_cell: IVec3,
    /// Cells travelled along the axis
    pub units: i32,
    speed: f32,
    threshold: f32,
    outbound: bool,
}

impl Oscillator {
    /// Step `position` toward the current endpoint, flipping on arrival
    pub fn advance(&mut self, position: Vec3, dt: f32) -> Vec3 {
        let goal = if self.outbound { self.target } else { self.origin };
        let next = move_towards(position, goal, dt * self.speed);
        if next.distance(goal) < self.threshold {
            self.outbound = !self.outbound;
        }
        next
    }

    pub fn is_outbound(&self) -> bool {
        self.outbound
    }
}

/// Neighbour cell a mover travels to
///
/// Direction is random; if that would leave the grid along `axis` it is
/// reflected, and the result is clamped into the grid.
pub fn target_cell(
    cell: IVec3,
    axis: Axis,
    units: i32,
    counts: IVec3,
    rng: &mut impl Rng,
) -> IVec3 {
    let along = axis.component(cell);
    let count = axis.component(counts);

    let mut direction = if rng.random_bool(0.5) { -1 } else { 1 };
    let stepped = along + direction * units;
    if stepped < 0 || stepped >= count {
        direction = -direction;
    }
    let moved = (along + direction * units).clamp(0, (count - 1).max(0));
    cell + axis.unit() * (moved - along)
}

/// A live hoop in the world
#[derive(Debug, Clone)]
pub struct Hoop {
    pub spec: HoopSpec,
    pub position: Vec3,
    pub orientation: Quat,
    trigger_offset: Vec3,
    trigger_half_extents: Vec3,
    motion: Option<Oscillator>,
}

impl Hoop {
    pub fn spawn(
        id: u32,
        template: &HoopTemplate,
        cell: IVec3,
        grid: &SpawnGrid,
        rng: &mut impl Rng,
    ) -> Self {
        let position = grid.cell_position(cell);
        let motion = template.behavior.axis().map(|axis| {
            let target_cell = target_cell(cell, axis, template.move_units, grid.counts(), rng);
            Oscillator {
                origin: position,
                target: grid.cell_position(target_cell),
                target_cell,
                units: template.move_units,
                speed: template.move_speed,
                threshold: template.move_threshold,
                outbound: true,
            }
        });

        Self {
            spec: HoopSpec {
                id,
                behavior: template.behavior,
                sector: template.sector,
                cell,
            },
            position,
            orientation: template.orientation,
            trigger_offset: template.trigger_offset,
            trigger_half_extents: template.trigger_half_extents,
            motion,
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.spec.id
    }

    pub fn motion(&self) -> Option<&Oscillator> {
        self.motion.as_ref()
    }

    /// Cells `cell ± k·axis` for `k` in `1..=units`
    pub fn axis_neighbours(cell: IVec3, axis: Axis, units: i32) -> impl Iterator<Item = IVec3> {
        let unit = axis.unit();
        (1..=units.max(0)).flat_map(move |k| [cell + unit * k, cell - unit * k])
    }

    /// Cells a mover sweeps through besides its own
    pub fn swept_neighbours(&self) -> Vec<IVec3> {
        match (self.spec.behavior.axis(), self.motion.as_ref()) {
            (Some(axis), Some(motion)) => {
                Self::axis_neighbours(self.spec.cell, axis, motion.units).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Move along the oscillator path (no-op for static hoops)
    pub fn update(&mut self, dt: f32) {
        if let Some(motion) = self.motion.as_mut() {
            self.position = motion.advance(self.position, dt);
        }
    }

    pub fn trigger_bounds(&self) -> OrientedBox {
        OrientedBox {
            center: self.position + self.orientation * self.trigger_offset,
            half_extents: self.trigger_half_extents,
            orientation: self.orientation,
        }
    }

    /// First body inside the trigger that passes every sector gate
    pub fn detect<Q: OverlapQuery + ?Sized>(
        &self,
        bodies: &Q,
        filter: SurfaceFilter,
    ) -> Option<Body> {
        let bounds = self.trigger_bounds();
        bodies
            .overlap_box(bounds.center, bounds.half_extents, bounds.orientation, filter)
            .into_iter()
            .find(|body| {
                self.spec
                    .sector
                    .scores(self.position, self.orientation, body.position, body.velocity)
            })
    }
}
