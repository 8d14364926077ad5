//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (trajectories re-derived from t = 0)
//! - Seeded RNG only
//! - Stable iteration order (hoops by ascending id)
//! - No rendering, audio or platform dependencies; the world is reached
//!   through the `RayCaster` and `OverlapQuery` traits

pub mod aim;
pub mod ball;
pub mod curve;
pub mod grid;
pub mod hoop;
pub mod kinematics;
pub mod sector;
pub mod session;
pub mod shuffle;
pub mod spawn;
pub mod state;
pub mod timers;
pub mod trajectory;
pub mod world;

pub use aim::{AimInput, AimSettings};
pub use ball::{Ball, BallSettings};
pub use curve::{Curve, DifficultyCurves, Keyframe, TypeWeight};
pub use grid::{GridConfig, SpawnGrid};
pub use hoop::{Axis, Hoop, HoopBehavior, HoopSpec, HoopTemplate};
pub use sector::{ScoringGates, ScoringSector};
pub use session::{Session, SessionSettings, TickInput};
pub use shuffle::shuffle;
pub use spawn::SpawnScheduler;
pub use state::{RngState, RoundState, SessionEvent, SessionPhase};
pub use timers::{TimerId, TimerQueue};
pub use trajectory::{
    BallState, BounceEvent, BounceKind, ReleaseParameters, StepperConfig, Trajectory,
    TrajectoryMode, preview_path, simulate,
};
pub use world::{
    Body, OrientedBox, OverlapQuery, RayCaster, RayHit, Scene, Surface, SurfaceFilter, layers,
    reflect,
};
