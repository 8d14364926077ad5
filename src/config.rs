//! Game configuration
//!
//! All tuning is data: one JSON document with a section per subsystem.
//! Every section falls back to defaults field by field, so a config file
//! only needs the values it changes. [`GameConfig::validate`] runs once at
//! startup; a session never sees a config that failed it.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::effects::EffectTable;
use crate::sim::aim::AimSettings;
use crate::sim::ball::BallSettings;
use crate::sim::curve::DifficultyCurves;
use crate::sim::grid::GridConfig;
use crate::sim::hoop::{Axis, HoopBehavior, HoopTemplate};
use crate::sim::session::SessionSettings;
use crate::sim::trajectory::StepperConfig;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TEAM_CLUBS_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    /// A difficulty or aim curve cannot be evaluated
    Curve {
        name: String,
        problem: &'static str,
    },
    /// `spawn_min` exceeds `spawn_max` for some round
    SpawnRange {
        round: u32,
        min: f32,
        max: f32,
    },
    /// A behaviour can be drawn but has no hoop template
    MissingTemplate(HoopBehavior),
    OutOfRange {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {path}: {source}"),
            Self::Parse(e) => write!(f, "invalid config JSON: {e}"),
            Self::Curve { name, problem } => write!(f, "{name}: {problem}"),
            Self::SpawnRange { round, min, max } => {
                write!(f, "round {round}: spawn_min {min} exceeds spawn_max {max}")
            }
            Self::MissingTemplate(behavior) => {
                write!(f, "{behavior:?} has a spawn weight but no hoop template")
            }
            Self::OutOfRange {
                field,
                value,
                expected,
            } => write!(f, "{field} = {value}, expected {expected}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Run seed for reproducibility
    pub seed: u64,
    pub stepper: StepperConfig,
    pub ball: BallSettings,
    pub aim: AimSettings,
    pub grid: GridConfig,
    /// One template per behaviour that can spawn
    pub hoops: Vec<HoopTemplate>,
    pub difficulty: DifficultyCurves,
    pub session: SessionSettings,
    pub effects: EffectTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x7EA5_C1B5,
            stepper: StepperConfig::default(),
            ball: BallSettings::default(),
            aim: AimSettings::default(),
            grid: GridConfig::default(),
            hoops: vec![
                HoopTemplate::default(),
                HoopTemplate {
                    behavior: HoopBehavior::MoveAlongAxis(Axis::X),
                    ..Default::default()
                },
            ],
            difficulty: DifficultyCurves::default(),
            session: SessionSettings::default(),
            effects: EffectTable::default(),
        }
    }
}

fn check(
    field: &'static str,
    value: f32,
    ok: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    check(field, value, (0.0..=1.0).contains(&value), "a value in [0, 1]")
}

impl GameConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Config from the file named by [`CONFIG_ENV`], or defaults when unset
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the simulation cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.stepper;
        check("stepper.time_step", s.time_step, s.time_step > 0.0, "> 0")?;
        check(
            "stepper.time_acceleration",
            s.time_acceleration,
            s.time_acceleration > 0.0,
            "> 0",
        )?;
        check(
            "stepper.floor_dot_threshold",
            s.floor_dot_threshold,
            (-1.0..=1.0).contains(&s.floor_dot_threshold),
            "a value in [-1, 1]",
        )?;

        unit_interval("ball.velocity_reduction_factor", self.ball.velocity_reduction_factor)?;
        unit_interval("ball.gravity_modulation", self.ball.gravity_modulation)?;

        let a = &self.aim;
        if let Some(problem) = a.speed_curve.problem() {
            return Err(ConfigError::Curve {
                name: "aim.speed_curve".into(),
                problem,
            });
        }
        check("aim.max_forward_speed", a.max_forward_speed, a.max_forward_speed > 0.0, "> 0")?;
        check(
            "aim.elevation_deg",
            a.elevation_deg,
            a.elevation_deg > 0.0 && a.elevation_deg < 90.0,
            "a value in (0, 90)",
        )?;

        for (field, value) in [
            ("grid.size.x", self.grid.size.x),
            ("grid.size.y", self.grid.size.y),
            ("grid.size.z", self.grid.size.z),
        ] {
            check(field, value, value > 0.0, "> 0")?;
        }
        for (field, size, cell) in [
            ("grid.cell_size.x", self.grid.size.x, self.grid.cell_size.x),
            ("grid.cell_size.y", self.grid.size.y, self.grid.cell_size.y),
            ("grid.cell_size.z", self.grid.size.z, self.grid.cell_size.z),
        ] {
            // Zero falls back to a fixed count; otherwise at least one cell must fit
            check(
                field,
                cell,
                cell == 0.0 || (cell > 0.0 && (size / cell).round() >= 1.0),
                "0 or a size that fits at least one cell",
            )?;
        }

        for template in &self.hoops {
            let sector = &template.sector;
            check("hoops.sector.height", sector.height, sector.height > 0.0, "> 0")?;
            check(
                "hoops.sector.outer_radius",
                sector.outer_radius,
                sector.outer_radius > 0.0,
                "> 0",
            )?;
            check(
                "hoops.sector.inner_radius",
                sector.inner_radius,
                sector.inner_radius >= 0.0 && sector.inner_radius < sector.outer_radius,
                "a value in [0, outer_radius)",
            )?;
            check(
                "hoops.sector.fov_deg",
                sector.fov_deg,
                sector.fov_deg > 0.0 && sector.fov_deg <= 180.0,
                "a value in (0, 180]",
            )?;
            check(
                "hoops.sector.success_threshold",
                sector.success_threshold,
                (-1.0..=1.0).contains(&sector.success_threshold),
                "a value in [-1, 1]",
            )?;
            if template.behavior.is_moving() {
                check("hoops.move_speed", template.move_speed, template.move_speed > 0.0, "> 0")?;
                check(
                    "hoops.move_units",
                    template.move_units as f32,
                    template.move_units >= 1,
                    ">= 1",
                )?;
            }
        }

        self.validate_difficulty()?;

        let sess = &self.session;
        check("session.start_time", sess.start_time, sess.start_time > 0.0, "> 0")?;
        check("session.effect_linger", sess.effect_linger, sess.effect_linger >= 0.0, ">= 0")?;

        for effect in self.effects.missing() {
            log::warn!("No cue configured for effect {}", effect.as_str());
        }
        Ok(())
    }

    fn validate_difficulty(&self) -> Result<(), ConfigError> {
        let d = &self.difficulty;
        if let Some((name, problem)) = d.problems().into_iter().next() {
            return Err(ConfigError::Curve { name, problem });
        }

        // Past the last key every curve is flat, so checking up to there covers all rounds
        let horizon = [&d.spawn_min, &d.spawn_max]
            .iter()
            .filter_map(|c| c.keys().last())
            .map(|k| k.time.max(0.0).ceil() as u32)
            .max()
            .unwrap_or(0);
        for round in 0..=horizon {
            let (min, max) = (d.spawn_min.at_round(round), d.spawn_max.at_round(round));
            if min > max || min < 0.0 {
                return Err(ConfigError::SpawnRange { round, min, max });
            }
        }

        for weight in &d.type_weights {
            let ever_drawn = weight.weight.keys().iter().any(|k| k.value > 0.0);
            if ever_drawn && !self.hoops.iter().any(|t| t.behavior == weight.behavior) {
                return Err(ConfigError::MissingTemplate(weight.behavior));
            }
        }
        Ok(())
    }
}
