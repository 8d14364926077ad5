//! Team Clubs headless runner
//!
//! Plays scripted throws through a few rounds and logs the event stream.
//! Usage: `team-clubs [config.json]` (falls back to `TEAM_CLUBS_CONFIG`,
//! then to built-in defaults). Set `RUST_LOG=info` or `debug` to see output.

use std::process::ExitCode;

use glam::{Vec2, Vec3};
use team_clubs::consts::FIXED_DT;
use team_clubs::sim::{AimInput, Scene, Session, SessionEvent, SessionPhase, TickInput, layers};
use team_clubs::{ConfigError, GameConfig};

/// Host frame length the fixed step is fed from
const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_SUBSTEPS: u32 = 4;
const ROUNDS: u32 = 3;

fn load_config() -> Result<GameConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => GameConfig::load(path),
        None => GameConfig::from_env(),
    }
}

fn arena() -> Scene {
    Scene::new()
        .with_floor(0.0, layers::FLOOR)
        .with_backboard(Vec3::new(0.0, 3.0, 16.0), Vec2::new(6.0, 3.0), layers::BOARD)
}

/// Sweep heading and power so successive throws cover the grid
fn scripted_aim(throw: u32) -> AimInput {
    let heading = 0.5 + 0.2 * ((throw as f32) * 0.9).sin();
    let power = 0.35 + 0.6 * (((throw * 7) % 10) as f32 / 10.0);
    AimInput::new(heading, power)
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::PlayEffect { effect, cue } => {
            log::debug!("effect {} -> {}", effect.as_str(), cue.resource)
        }
        SessionEvent::EffectEnded { effect } => log::debug!("effect {} ended", effect.as_str()),
        other => log::info!("{other:?}"),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Cannot start session: {e}");
            return ExitCode::FAILURE;
        }
    };

    let world = arena();
    let mut accumulator = 0.0;
    let mut throws = 0;

    for round in 0..ROUNDS {
        while !session.phase().is_over() {
            accumulator += FRAME_DT;
            let mut substeps = 0;
            while accumulator >= FIXED_DT && substeps < MAX_SUBSTEPS {
                let input = if session.ball().is_moving() {
                    TickInput::default()
                } else {
                    throws += 1;
                    TickInput::throw(scripted_aim(throws))
                };
                session.tick(&input, FIXED_DT, &world);
                accumulator -= FIXED_DT;
                substeps += 1;
            }
            session.drain_events().iter().for_each(log_event);
        }

        let state = session.round();
        println!(
            "Round {round}: {} with {}/{} after {throws} throws",
            match session.phase() {
                SessionPhase::Won => "won",
                _ => "lost",
            },
            state.score,
            state.target_score
        );
        if session.phase() == SessionPhase::Won {
            session.next_round();
        } else {
            session.restart();
        }
    }
    ExitCode::SUCCESS
}
