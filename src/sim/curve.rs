//! Difficulty curves
//!
//! A curve maps the round number to a tuning value through sorted
//! keyframes with linear interpolation between them. Inputs before the
//! first key or after the last one clamp to that key's value.

use serde::{Deserialize, Serialize};

use super::hoop::{Axis, HoopBehavior};
use crate::{inverse_lerp, lerp};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    /// Build a curve from `(time, value)` pairs, which must be sorted by time
    pub fn new(keys: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|(time, value)| Keyframe { time, value })
                .collect(),
        }
    }

    pub fn constant(value: f32) -> Self {
        Self::new([(0.0, value)])
    }

    /// Straight line from `(0, from)` to `(at, to)`, flat afterwards
    pub fn ramp(from: f32, to: f32, at: f32) -> Self {
        Self::new([(0.0, from), (at, to)])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Why the curve cannot be evaluated, if it cannot
    pub fn problem(&self) -> Option<&'static str> {
        if self.keys.is_empty() {
            return Some("curve has no keys");
        }
        if self.keys.iter().any(|k| !k.time.is_finite() || !k.value.is_finite()) {
            return Some("curve has a non-finite key");
        }
        if self.keys.windows(2).any(|w| w[0].time > w[1].time) {
            return Some("curve keys are not sorted by time");
        }
        None
    }

    /// Value at `time`; an empty curve evaluates to 0
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; the one before it brackets from below
        let upper = self.keys.partition_point(|k| k.time <= time);
        let (a, b) = (self.keys[upper - 1], self.keys[upper]);
        lerp(a.value, b.value, inverse_lerp(a.time, b.time, time))
    }

    /// Convenience for round-indexed lookups
    pub fn at_round(&self, round: u32) -> f32 {
        self.evaluate(round as f32)
    }
}

/// Spawn weight of one hoop behaviour, as a function of the round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeWeight {
    pub behavior: HoopBehavior,
    pub weight: Curve,
}

/// Every round-indexed tuning value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyCurves {
    pub score_target: Curve,
    pub spawn_min: Curve,
    pub spawn_max: Curve,
    /// Seconds added when the last hoop of a batch is scored
    pub time_bonus: Curve,
    /// Points for a hoop, indexed by its distance cell (`cell.z`)
    pub score_by_distance: Curve,
    pub type_weights: Vec<TypeWeight>,
}

impl Default for DifficultyCurves {
    fn default() -> Self {
        Self {
            score_target: Curve::ramp(3.0, 30.0, 10.0),
            spawn_min: Curve::constant(1.0),
            spawn_max: Curve::ramp(2.0, 5.0, 10.0),
            time_bonus: Curve::ramp(5.0, 2.0, 10.0),
            score_by_distance: Curve::ramp(1.0, 5.0, 4.0),
            type_weights: vec![
                TypeWeight {
                    behavior: HoopBehavior::Static,
                    weight: Curve::constant(1.0),
                },
                TypeWeight {
                    behavior: HoopBehavior::MoveAlongAxis(Axis::X),
                    weight: Curve::ramp(0.0, 1.0, 5.0),
                },
            ],
        }
    }
}

impl DifficultyCurves {
    /// Inclusive spawn count range for a round
    pub fn spawn_range(&self, round: u32) -> (usize, usize) {
        let as_count = |v: f32| v.round().max(0.0) as usize;
        let min = as_count(self.spawn_min.at_round(round));
        let max = as_count(self.spawn_max.at_round(round)).max(min);
        (min, max)
    }

    pub fn target_score(&self, round: u32) -> u32 {
        self.score_target.at_round(round).round().max(0.0) as u32
    }

    pub fn points_for_distance(&self, distance_index: i32) -> u32 {
        self.score_by_distance
            .evaluate(distance_index as f32)
            .round()
            .max(0.0) as u32
    }

    /// `(behavior, weight)` pairs with negative weights clamped to zero
    pub fn weights(&self, round: u32) -> Vec<(HoopBehavior, f32)> {
        self.type_weights
            .iter()
            .map(|t| (t.behavior, t.weight.at_round(round).max(0.0)))
            .collect()
    }

    /// Every curve with a problem, labelled
    pub fn problems(&self) -> Vec<(String, &'static str)> {
        let named = [
            ("score_target", &self.score_target),
            ("spawn_min", &self.spawn_min),
            ("spawn_max", &self.spawn_max),
            ("time_bonus", &self.time_bonus),
            ("score_by_distance", &self.score_by_distance),
        ];
        let mut found: Vec<(String, &'static str)> = named
            .into_iter()
            .filter_map(|(name, c)| c.problem().map(|p| (name.to_string(), p)))
            .collect();
        for t in &self.type_weights {
            if let Some(p) = t.weight.problem() {
                found.push((format!("type_weights[{:?}]", t.behavior), p));
            }
        }
        found
    }
}
