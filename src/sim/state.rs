//! Session state and events
//!
//! Everything a host needs to present a round (score, timer, phase) plus
//! the events a tick produces. All of it is plain data and serializable.

use glam::{IVec3, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::effects::{Effect, EffectCue};

/// Where the session is in its round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Timer running, throws accepted
    #[default]
    Playing,
    /// Timer ran out with the target reached
    Won,
    /// Timer ran out short of the target
    Lost,
}

impl SessionPhase {
    pub fn is_over(&self) -> bool {
        !matches!(self, SessionPhase::Playing)
    }
}

/// Per-round progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// 0-based
    pub round_number: u32,
    pub score: u32,
    pub target_score: u32,
    /// Seconds left on the round timer
    pub remaining_time: f32,
}

impl RoundState {
    pub fn new(round_number: u32, target_score: u32, time: f32) -> Self {
        Self {
            round_number,
            score: 0,
            target_score,
            remaining_time: time,
        }
    }

    pub fn target_reached(&self) -> bool {
        self.score >= self.target_score
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    RoundStarted {
        round: u32,
        target_score: u32,
    },
    BatchSpawned {
        round: u32,
        hoop_ids: Vec<u32>,
    },
    Released {
        velocity: Vec3,
    },
    Scored {
        hoop_id: u32,
        points: u32,
        cell: IVec3,
    },
    /// Last hoop of a batch scored; seconds added to the timer
    TimeBonus {
        seconds: f32,
    },
    /// Ball left the play area and was reset
    BallOut {
        position: Vec3,
    },
    PlayEffect {
        effect: Effect,
        cue: EffectCue,
    },
    EffectEnded {
        effect: Effect,
    },
    RoundEnded {
        round: u32,
        phase: SessionPhase,
        score: u32,
        target_score: u32,
    },
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}
