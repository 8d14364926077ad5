//! Fixed timestep round loop
//!
//! A [`Session`] owns everything that changes during play: the ball, the
//! spawn grid, the round timer, pending effect timers and the seeded RNG.
//! `tick` advances all of it by one host step in a fixed order, so the same
//! config, seed and inputs always produce the same event stream.

use glam::Vec3;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::aim::AimInput;
use super::ball::Ball;
use super::grid::SpawnGrid;
use super::spawn::SpawnScheduler;
use super::state::{RngState, RoundState, SessionEvent, SessionPhase};
use super::timers::TimerQueue;
use super::trajectory::{BounceKind, preview_path};
use super::world::{Body, OrientedBox, RayCaster, SurfaceFilter, layers};
use crate::config::{ConfigError, GameConfig};
use crate::consts::{EFFECT_LINGER, ROUND_TIME};
use crate::effects::{Effect, EffectChannel};

const BALL_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Round length in seconds
    pub start_time: f32,
    /// Seconds a one-shot effect runs before its end is emitted
    pub effect_linger: f32,
    /// A ball entering any of these is reset
    pub kill_volumes: Vec<OrientedBox>,
    /// Layers hoops score
    pub score_filter: SurfaceFilter,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            start_time: ROUND_TIME,
            effect_linger: EFFECT_LINGER,
            kill_volumes: vec![OrientedBox::axis_aligned(
                Vec3::new(0.0, -6.0, 0.0),
                Vec3::new(100.0, 5.0, 100.0),
            )],
            score_filter: SurfaceFilter::layer(layers::BALL),
        }
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Throw with this aim (ignored while the ball is in flight)
    pub release: Option<AimInput>,
    /// Put the ball back at rest
    pub reset_ball: bool,
}

impl TickInput {
    pub fn throw(aim: AimInput) -> Self {
        Self {
            release: Some(aim),
            reset_ball: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    config: GameConfig,
    rng: Pcg32,
    ball: Ball,
    scheduler: SpawnScheduler,
    round: RoundState,
    phase: SessionPhase,
    timers: TimerQueue<Effect>,
    music_playing: bool,
    events: Vec<SessionEvent>,
}

impl Session {
    /// Validate `config` and start round 0
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rest = config.ball.rest_position;
        let grid = SpawnGrid::new(&config.grid, rest);
        log::info!(
            "Session seed {:#x}, grid {} cells ({})",
            config.seed,
            grid.total_cells(),
            grid.counts()
        );

        let mut session = Self {
            rng: RngState::new(config.seed).to_rng(),
            ball: Ball::new(BALL_ID, rest, config.stepper),
            scheduler: SpawnScheduler::new(grid),
            round: RoundState::new(0, 0, config.session.start_time),
            phase: SessionPhase::Playing,
            timers: TimerQueue::new(),
            music_playing: false,
            events: Vec::new(),
            config,
        };
        session.begin_round(0);
        Ok(session)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the session by `dt` host seconds
    pub fn tick(&mut self, input: &TickInput, dt: f32, world: &impl RayCaster) {
        // Effect ends keep firing after a round is over
        for effect in self.timers.advance(dt) {
            self.events.push(SessionEvent::EffectEnded { effect });
        }

        if self.phase.is_over() {
            return;
        }

        if input.reset_ball {
            self.ball.reset();
        }
        if let Some(aim) = input.release {
            self.release(aim);
        }

        if self.scheduler.is_empty() {
            let hoop_ids = self.scheduler.populate_grid(
                self.round.round_number,
                &self.config.difficulty,
                &self.config.hoops,
                &mut self.rng,
            );
            self.events.push(SessionEvent::BatchSpawned {
                round: self.round.round_number,
                hoop_ids,
            });
        }
        self.scheduler.update(dt);

        for bounce in self.ball.advance(dt, world) {
            let effect = match bounce.kind {
                BounceKind::Floor => Effect::BallBounce,
                BounceKind::Board => Effect::BallHitBoard,
            };
            self.play_effect(effect);
        }

        if self.ball.is_moving() {
            self.check_kill_volumes();
        }
        if self.ball.is_moving() {
            self.check_scoring();
        }

        self.round.remaining_time -= dt;
        if self.round.remaining_time <= 0.0 {
            self.round.remaining_time = 0.0;
            self.finish_round();
        }
    }

    /// Throw the ball; false while it is already in flight or the round is over
    pub fn release(&mut self, aim: AimInput) -> bool {
        if self.phase.is_over() {
            return false;
        }
        let params = self.config.aim.release(aim, &self.config.ball);
        if !self.ball.release(params) {
            return false;
        }
        self.events.push(SessionEvent::Released {
            velocity: params.initial_velocity,
        });
        true
    }

    /// Path the ball would follow for `aim`
    pub fn preview(&self, aim: AimInput, world: &impl RayCaster, max_points: usize) -> Vec<Vec3> {
        let params = self.config.aim.release(aim, &self.config.ball);
        preview_path(&params, &self.config.stepper, world, max_points)
    }

    pub fn next_round(&mut self) {
        self.begin_round(self.round.round_number + 1);
    }

    /// Back to round 0 with the RNG re-seeded
    pub fn restart(&mut self) {
        self.rng = RngState::new(self.config.seed).to_rng();
        self.begin_round(0);
    }

    /// Start `effect`; one-shot cues end after the configured linger
    pub fn play_effect(&mut self, effect: Effect) {
        let Some(cue) = self.config.effects.resolve(effect).cloned() else {
            return;
        };
        match cue.channel {
            EffectChannel::Sfx => {
                self.timers.schedule(self.config.session.effect_linger, effect);
            }
            EffectChannel::Bgm => self.music_playing = true,
        }
        self.events.push(SessionEvent::PlayEffect { effect, cue });
    }

    fn stop_music(&mut self) {
        if self.music_playing {
            self.music_playing = false;
            self.events.push(SessionEvent::EffectEnded {
                effect: Effect::RoundMusic,
            });
        }
    }

    fn begin_round(&mut self, round_number: u32) {
        self.timers.cancel_all();
        self.stop_music();
        self.ball.reset();
        self.scheduler.clear_grid();

        let target_score = self.config.difficulty.target_score(round_number);
        self.round = RoundState::new(round_number, target_score, self.config.session.start_time);
        self.phase = SessionPhase::Playing;
        log::info!("Round {round_number} started, target {target_score}");

        self.events.push(SessionEvent::RoundStarted {
            round: round_number,
            target_score,
        });
        self.play_effect(Effect::RoundMusic);
    }

    fn finish_round(&mut self) {
        self.phase = if self.round.target_reached() {
            SessionPhase::Won
        } else {
            SessionPhase::Lost
        };
        log::info!(
            "Round {} over: {:?} ({}/{})",
            self.round.round_number,
            self.phase,
            self.round.score,
            self.round.target_score
        );

        self.timers.cancel_all();
        self.ball.reset();
        self.events.push(SessionEvent::RoundEnded {
            round: self.round.round_number,
            phase: self.phase,
            score: self.round.score,
            target_score: self.round.target_score,
        });
        self.stop_music();
        self.play_effect(match self.phase {
            SessionPhase::Won => Effect::RoundWon,
            _ => Effect::RoundLost,
        });
    }

    fn check_kill_volumes(&mut self) {
        let position = self.ball.current_state().position;
        if self
            .config
            .session
            .kill_volumes
            .iter()
            .any(|v| v.contains(position))
        {
            log::debug!("Ball out at {position}");
            self.ball.reset();
            self.events.push(SessionEvent::BallOut { position });
        }
    }

    fn check_scoring(&mut self) {
        let bodies: [Body; 1] = [self.ball.body()];
        let Some((hoop_id, _)) = self
            .scheduler
            .detect(&bodies[..], self.config.session.score_filter)
        else {
            return;
        };

        let spec = self.scheduler.remove(hoop_id);
        let points = self.config.difficulty.points_for_distance(spec.cell.z);
        self.round.score += points;
        self.ball.reset();
        log::info!(
            "Hoop {hoop_id} scored {points} at {}, total {}",
            spec.cell,
            self.round.score
        );
        self.events.push(SessionEvent::Scored {
            hoop_id,
            points,
            cell: spec.cell,
        });
        self.play_effect(Effect::Score);

        if self.scheduler.is_empty() {
            let seconds = self.config.difficulty.time_bonus.at_round(self.round.round_number);
            self.round.remaining_time += seconds;
            self.events.push(SessionEvent::TimeBonus { seconds });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FIXED_DT;
    use crate::sim::curve::{Curve, TypeWeight};
    use crate::sim::hoop::{HoopBehavior, HoopTemplate};
    use crate::sim::sector::ScoringSector;
    use crate::sim::world::Scene;
    use glam::Vec2;

    fn idle() -> TickInput {
        TickInput::default()
    }

    /// Hoops far above any throw
    fn out_of_reach() -> GameConfig {
        let mut config = GameConfig::default();
        config.grid.offset = Vec3::new(0.0, 50.0, 0.0);
        config
    }

    fn run(session: &mut Session, ticks: usize, world: &Scene) -> Vec<SessionEvent> {
        for _ in 0..ticks {
            session.tick(&idle(), FIXED_DT, world);
        }
        session.drain_events()
    }

    #[test]
    fn test_new_session_starts_round_zero() {
        let mut session = Session::new(GameConfig::default()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.round().round_number, 0);
        assert_eq!(session.round().target_score, 3);
        assert!(session.scheduler().is_empty());

        let events = session.drain_events();
        assert!(matches!(
            events[0],
            SessionEvent::RoundStarted {
                round: 0,
                target_score: 3
            }
        ));
        assert!(matches!(
            events[1],
            SessionEvent::PlayEffect {
                effect: Effect::RoundMusic,
                ..
            }
        ));
        // Background music has no end timer
        assert_eq!(session.pending_timers(), 0);

        session.tick(&idle(), FIXED_DT, &Scene::new());
        let events = session.drain_events();
        let Some(SessionEvent::BatchSpawned { hoop_ids, .. }) = events.first() else {
            panic!("expected a batch, got {events:?}");
        };
        assert!(!hoop_ids.is_empty());
        assert_eq!(session.scheduler().active_hoops().len(), hoop_ids.len());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = GameConfig::default();
        config.session.start_time = 0.0;
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn test_round_lost_when_timer_runs_out() {
        let mut config = out_of_reach();
        config.session.start_time = 0.5;
        let mut session = Session::new(config).unwrap();
        let events = run(&mut session, 30, &Scene::new());

        assert_eq!(session.phase(), SessionPhase::Lost);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::RoundEnded {
                phase: SessionPhase::Lost,
                score: 0,
                ..
            }
        )));
        assert!(events.contains(&SessionEvent::EffectEnded {
            effect: Effect::RoundMusic
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::PlayEffect {
                effect: Effect::RoundLost,
                ..
            }
        )));

        // Throws are refused until a new round starts
        assert!(!session.release(AimInput::straight(1.0)));

        session.next_round();
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.round().round_number, 1);
        assert_eq!(session.round().score, 0);
        assert_eq!(session.round().remaining_time, 0.5);
        assert_eq!(
            session.round().target_score,
            session.config().difficulty.target_score(1)
        );
        assert!(session.scheduler().is_empty());

        session.restart();
        assert_eq!(session.round().round_number, 0);
    }

    #[test]
    fn test_zero_target_wins() {
        let mut config = out_of_reach();
        config.session.start_time = 0.1;
        config.difficulty.score_target = Curve::constant(0.0);
        let mut session = Session::new(config).unwrap();
        run(&mut session, 10, &Scene::new());
        assert_eq!(session.phase(), SessionPhase::Won);
    }

    /// One hoop directly in the path of a straight throw, no floor
    fn scoring_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.grid.size = Vec3::ONE;
        config.grid.cell_size = Vec3::ONE;
        config.grid.offset = Vec3::new(0.0, -3.0, 4.0);
        config.hoops = vec![HoopTemplate {
            sector: ScoringSector {
                height: 3.0,
                outer_radius: 3.0,
                inner_radius: 0.0,
                fov_deg: 180.0,
                success_threshold: 0.0,
            },
            trigger_offset: Vec3::new(0.0, 1.5, 1.5),
            trigger_half_extents: Vec3::new(3.5, 2.0, 3.5),
            ..Default::default()
        }];
        config.difficulty.type_weights = vec![TypeWeight {
            behavior: HoopBehavior::Static,
            weight: Curve::constant(1.0),
        }];
        config.aim.max_forward_speed = 4.0;
        config.aim.power_range = Vec2::new(1.0, 1.0);
        config.session.kill_volumes.clear();
        config
    }

    #[test]
    fn test_throw_scores_and_clears_batch() {
        let world = Scene::new();
        let mut session = Session::new(scoring_config()).unwrap();
        session.tick(&idle(), FIXED_DT, &world);
        assert_eq!(session.scheduler().active_hoops().len(), 1);
        let hoop = &session.scheduler().active_hoops()[0];
        assert!((hoop.position - Vec3::new(0.0, -2.0, 4.5)).length() < 1e-5);
        session.drain_events();

        session.tick(&TickInput::throw(AimInput::straight(1.0)), FIXED_DT, &world);
        let before = session.round().remaining_time;
        let mut events = session.drain_events();
        for _ in 0..200 {
            session.tick(&idle(), FIXED_DT, &world);
            events.extend(session.drain_events());
            if session.round().score > 0 {
                break;
            }
        }

        assert_eq!(session.round().score, 1);
        assert!(!session.ball().is_moving());
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::Scored {
                points: 1,
                cell,
                ..
            } if *cell == glam::IVec3::ZERO
        )));
        assert!(events.contains(&SessionEvent::TimeBonus { seconds: 5.0 }));
        assert!(session.round().remaining_time > before);
        assert!(session.scheduler().occupancy_is_consistent());
    }

    #[test]
    fn test_bounce_effect_ends_after_linger() {
        let world = Scene::new().with_floor(0.0, layers::FLOOR);
        let mut config = out_of_reach();
        config.session.kill_volumes.clear();
        let mut session = Session::new(config).unwrap();
        session.drain_events();
        assert!(session.release(AimInput::straight(1.0)));

        let mut started = None;
        let mut ended = None;
        for tick in 0..600 {
            session.tick(&idle(), FIXED_DT, &world);
            for event in session.drain_events() {
                match event {
                    SessionEvent::PlayEffect {
                        effect: Effect::BallBounce,
                        ..
                    } if started.is_none() => started = Some(tick),
                    SessionEvent::EffectEnded {
                        effect: Effect::BallBounce,
                    } if ended.is_none() => ended = Some(tick),
                    _ => {}
                }
            }
        }

        let (started, ended) = (started.unwrap(), ended.unwrap());
        let linger_ticks = (EFFECT_LINGER / FIXED_DT).round() as usize;
        assert!(ended >= started + linger_ticks - 1);
        assert!(ended <= started + linger_ticks + 1);
    }

    #[test]
    fn test_kill_volume_resets_ball() {
        let mut session = Session::new(out_of_reach()).unwrap();
        session.drain_events();
        assert!(session.release(AimInput::straight(1.0)));
        let events = run(&mut session, 400, &Scene::new());

        let out = events.iter().find_map(|e| match e {
            SessionEvent::BallOut { position } => Some(*position),
            _ => None,
        });
        let position = out.unwrap();
        assert!(position.y < -1.0);
        assert!(!session.ball().is_moving());
    }

    #[test]
    fn test_new_round_cancels_pending_effects() {
        let mut session = Session::new(out_of_reach()).unwrap();
        session.play_effect(Effect::Score);
        assert_eq!(session.pending_timers(), 1);

        session.next_round();
        assert_eq!(session.pending_timers(), 0);
        let events = run(&mut session, 100, &Scene::new());
        assert!(!events.contains(&SessionEvent::EffectEnded {
            effect: Effect::Score
        }));
    }

    #[test]
    fn test_same_seed_same_events() {
        let world = Scene::new().with_floor(0.0, layers::FLOOR);
        let script = |session: &mut Session| {
            let mut events = Vec::new();
            for tick in 0..600 {
                let input = if tick % 150 == 1 {
                    TickInput::throw(AimInput::new(0.3 + tick as f32 / 2000.0, 0.8))
                } else {
                    idle()
                };
                session.tick(&input, FIXED_DT, &world);
                events.extend(session.drain_events());
            }
            events
        };

        let mut a = Session::new(GameConfig::default()).unwrap();
        let mut b = Session::new(GameConfig::default()).unwrap();
        assert_eq!(script(&mut a), script(&mut b));
    }

    #[test]
    fn test_preview_starts_at_rest_position() {
        let session = Session::new(GameConfig::default()).unwrap();
        let world = Scene::new().with_floor(0.0, layers::FLOOR);
        let path = session.preview(AimInput::straight(0.5), &world, 64);
        assert!(!path.is_empty() && path.len() <= 64);
        assert_eq!(path[0], session.config().ball.rest_position);
    }
}
