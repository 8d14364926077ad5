//! Effect cues
//!
//! Gameplay names the effects it wants with [`Effect`]; what actually plays
//! (a sound, a particle burst) is looked up in an [`EffectTable`] injected
//! through configuration. The simulation never plays anything itself, it
//! only emits start/end events carrying the resolved cue.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Effect identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Effect {
    /// Ball bounced off a floor-like surface
    BallBounce,
    /// Ball hit a steep surface (backboard)
    BallHitBoard,
    Score,
    RoundWon,
    RoundLost,
    /// Looping background track for a round
    RoundMusic,
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::BallBounce,
        Effect::BallHitBoard,
        Effect::Score,
        Effect::RoundWon,
        Effect::RoundLost,
        Effect::RoundMusic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::BallBounce => "ballBounce",
            Effect::BallHitBoard => "ballHitBoard",
            Effect::Score => "score",
            Effect::RoundWon => "roundWon",
            Effect::RoundLost => "roundLost",
            Effect::RoundMusic => "roundMusic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str().eq_ignore_ascii_case(s))
    }
}

/// Output route for a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EffectChannel {
    /// Background music: one at a time, runs until stopped
    Bgm,
    /// One-shot effects
    #[default]
    Sfx,
}

/// What to play for an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectCue {
    /// Host resource name (clip, prefab, ...)
    pub resource: String,
    #[serde(default)]
    pub channel: EffectChannel,
    #[serde(default = "full_volume")]
    pub volume: f32,
}

fn full_volume() -> f32 {
    1.0
}

impl EffectCue {
    pub fn sfx(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            channel: EffectChannel::Sfx,
            volume: 1.0,
        }
    }

    pub fn bgm(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            channel: EffectChannel::Bgm,
            volume: 1.0,
        }
    }
}

/// Effect → cue mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectTable {
    cues: BTreeMap<Effect, EffectCue>,
}

impl Default for EffectTable {
    fn default() -> Self {
        Self::empty()
            .with(Effect::BallBounce, EffectCue::sfx("sfx/ball_bounce"))
            .with(Effect::BallHitBoard, EffectCue::sfx("sfx/ball_hit_board"))
            .with(Effect::Score, EffectCue::sfx("sfx/score"))
            .with(Effect::RoundWon, EffectCue::sfx("sfx/round_won"))
            .with(Effect::RoundLost, EffectCue::sfx("sfx/round_lost"))
            .with(Effect::RoundMusic, EffectCue::bgm("bgm/round"))
    }
}

impl EffectTable {
    pub fn empty() -> Self {
        Self {
            cues: BTreeMap::new(),
        }
    }

    pub fn with(mut self, effect: Effect, cue: EffectCue) -> Self {
        self.cues.insert(effect, cue);
        self
    }

    /// Cue for an effect; a missing cue is logged and yields `None`
    pub fn resolve(&self, effect: Effect) -> Option<&EffectCue> {
        let cue = self.cues.get(&effect);
        if cue.is_none() {
            log::error!("Effect {} has no cue", effect.as_str());
        }
        cue
    }

    /// Effects without a cue, in declaration order
    pub fn missing(&self) -> Vec<Effect> {
        Effect::ALL
            .into_iter()
            .filter(|e| !self.cues.contains_key(e))
            .collect()
    }
}
