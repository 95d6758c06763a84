//! Stuck detection and escalating recovery.
//!
//! State flow: `Clear → Suspected → Stuck → Recovering → Clear`.
//!
//! - Every `check_interval` the position is sampled into a ring of
//!   [`WINDOW_SIZE`]. When the summed travel across the ring is below the
//!   movement threshold the stuck timer grows by one interval, otherwise it
//!   decays by half an interval.
//! - Once the timer passes the threshold the worker is stuck. The detector
//!   then owns movement: it walks the worker sideways at reduced speed,
//!   picking a fresh random heading each time an attempt window runs out.
//! - After the last attempt the worker is relocated outright.
//!
//! Recovery ends when the worker gets `reset_distance` away from where it got
//! stuck, or when the caller reports arrival through [`StuckDetector::reset`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::StuckConfig;
use crate::geometry::Vec2;
use crate::motion::Body;
use crate::obstacles::{ExcludeSet, ObstacleQuery};

/// Number of samples in the displacement window.
pub const WINDOW_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StuckState {
    #[default]
    Clear,
    /// Recent samples show little movement; the timer is running.
    Suspected,
    /// Flagged this tick.
    Stuck,
    Recovering,
}

/// What the detector did this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StuckAction {
    None,
    /// The worker was just flagged at `origin`.
    Detected { origin: Vec2 },
    /// Recovery movement was applied. `escalated` carries the new attempt
    /// number when a fresh direction was drawn this tick.
    Recover {
        direction: Vec2,
        speed_factor: f32,
        escalated: Option<u32>,
    },
    /// Last-resort jump. `fallback` is set when the preferred spot was
    /// occupied and the opposite direction was used blindly.
    Relocate { to: Vec2, fallback: bool },
    /// Moved far enough from the stuck origin.
    Recovered { distance: f32 },
}

impl StuckAction {
    /// True when the detector moved (or froze) the worker this tick.
    pub fn owns_movement(&self) -> bool {
        matches!(
            self,
            StuckAction::Detected { .. } | StuckAction::Recover { .. } | StuckAction::Relocate { .. }
        )
    }
}

/// Read-only surroundings for one detector update.
pub struct RecoveryEnv<'a> {
    pub query: &'a dyn ObstacleQuery,
    pub exclude: &'a ExcludeSet,
    /// Where the worker is trying to go, if anywhere.
    pub destination: Option<Vec2>,
    /// Normal walking speed.
    pub speed: f32,
    /// Simulation time in seconds.
    pub now: f64,
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub struct StuckDetector {
    window: [Vec2; WINDOW_SIZE],
    head: usize,
    check_timer: f32,
    stuck_time: f32,
    state: StuckState,
    origin: Vec2,
    stuck_since: Option<f64>,
    attempts: u32,
    attempt_timer: f32,
    recovery_dir: Vec2,
}

impl StuckDetector {
    /// A fresh detector whose window is filled with `position`.
    pub fn new(position: Vec2) -> Self {
        Self {
            window: [position; WINDOW_SIZE],
            head: 0,
            check_timer: 0.0,
            stuck_time: 0.0,
            state: StuckState::Clear,
            origin: position,
            stuck_since: None,
            attempts: 0,
            attempt_timer: 0.0,
            recovery_dir: Vec2::ZERO,
        }
    }

    pub fn state(&self) -> StuckState {
        self.state
    }

    /// Stuck or recovering: the detector owns movement.
    pub fn is_stuck(&self) -> bool {
        matches!(self.state, StuckState::Stuck | StuckState::Recovering)
    }

    pub fn stuck_time(&self) -> f32 {
        self.stuck_time
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Simulation time the current episode started.
    pub fn stuck_since(&self) -> Option<f64> {
        self.stuck_since
    }

    pub fn origin(&self) -> Option<Vec2> {
        self.is_stuck().then_some(self.origin)
    }

    /// Back to `Clear` with the window refilled at `position`.
    pub fn reset(&mut self, position: Vec2) {
        *self = Self::new(position);
    }

    /// Summed distance between consecutive samples, oldest first.
    fn window_travel(&self) -> f32 {
        (1..WINDOW_SIZE)
            .map(|i| {
                let a = self.window[(self.head + i - 1) % WINDOW_SIZE];
                let b = self.window[(self.head + i) % WINDOW_SIZE];
                a.distance(b)
            })
            .sum()
    }

    fn sample(&mut self, position: Vec2) {
        self.window[self.head] = position;
        self.head = (self.head + 1) % WINDOW_SIZE;
    }

    /// Advance the detector one tick, moving `body` while recovering.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        body: &mut Body,
        env: &RecoveryEnv<'_>,
        rng: &mut R,
        config: &StuckConfig,
    ) -> StuckAction {
        if self.is_stuck() {
            return self.recover(body, env, rng, config);
        }

        self.check_timer += env.dt;
        if self.check_timer < config.check_interval {
            return StuckAction::None;
        }
        self.check_timer -= config.check_interval;
        self.sample(body.position);

        if self.window_travel() < config.movement_threshold {
            self.stuck_time += config.check_interval;
            self.state = StuckState::Suspected;
        } else {
            self.stuck_time = (self.stuck_time - config.check_interval * 0.5).max(0.0);
            if self.stuck_time == 0.0 {
                self.state = StuckState::Clear;
            }
        }

        if self.stuck_time > config.stuck_time_threshold {
            self.state = StuckState::Stuck;
            self.origin = body.position;
            self.stuck_since = Some(env.now);
            self.attempts = 0;
            self.attempt_timer = 0.0;
            self.recovery_dir = self.lateral_direction(body.position, env, rng, config);
            log::debug!(
                "stuck at ({:.2}, {:.2}) after {:.1}s",
                body.position.x,
                body.position.y,
                self.stuck_time
            );
            return StuckAction::Detected {
                origin: body.position,
            };
        }
        StuckAction::None
    }

    fn recover<R: Rng + ?Sized>(
        &mut self,
        body: &mut Body,
        env: &RecoveryEnv<'_>,
        rng: &mut R,
        config: &StuckConfig,
    ) -> StuckAction {
        let distance = body.position.distance(self.origin);
        if distance > config.reset_distance {
            self.reset(body.position);
            return StuckAction::Recovered { distance };
        }

        self.attempt_timer += env.dt;
        let mut escalated = None;
        if self.attempt_timer >= config.attempt_window() {
            self.attempts += 1;
            self.attempt_timer = 0.0;
            if self.attempts >= config.max_recovery_attempts {
                return self.relocate(body, env, config);
            }
            self.recovery_dir = random_direction(rng);
            escalated = Some(self.attempts);
        }
        self.state = StuckState::Recovering;

        let direction = self.recovery_dir;
        let step = direction * (env.speed * config.recovery_speed_factor * env.dt);
        body.step_to(body.position + step, env.query, env.exclude);

        // Still facing a wall: turn a quarter for the next tick
        let ahead = env
            .query
            .probe_clearance(body.position, direction, config.recovery_probe, env.exclude);
        if ahead < config.recovery_probe {
            self.recovery_dir = direction.perp();
        }

        StuckAction::Recover {
            direction,
            speed_factor: config.recovery_speed_factor,
            escalated,
        }
    }

    fn relocate(&mut self, body: &mut Body, env: &RecoveryEnv<'_>, config: &StuckConfig) -> StuckAction {
        let dir = if self.recovery_dir.is_near_zero() {
            Vec2::X
        } else {
            self.recovery_dir
        };
        let preferred = body.position + dir * config.critical_offset;
        let (to, fallback) = if env.query.area_has_blocker(preferred, body.radius, env.exclude) {
            (body.position - dir * config.critical_offset, true)
        } else {
            (preferred, false)
        };
        log::debug!(
            "critical relocation to ({:.2}, {:.2}){}",
            to.x,
            to.y,
            if fallback { " (blind)" } else { "" }
        );
        body.face(to - body.position);
        body.position = to;
        self.reset(to);
        StuckAction::Relocate { to, fallback }
    }

    /// Sideways relative to the destination, on the side with more room.
    fn lateral_direction<R: Rng + ?Sized>(
        &self,
        position: Vec2,
        env: &RecoveryEnv<'_>,
        rng: &mut R,
        config: &StuckConfig,
    ) -> Vec2 {
        let forward = env
            .destination
            .map(|d| (d - position).normalize())
            .unwrap_or(Vec2::ZERO);
        if forward.is_near_zero() {
            return random_direction(rng);
        }
        let side = forward.perp();
        let left = env
            .query
            .probe_clearance(position, side, config.recovery_probe, env.exclude);
        let right = env
            .query
            .probe_clearance(position, -side, config.recovery_probe, env.exclude);
        if left >= right {
            side
        } else {
            -side
        }
    }
}

fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
}
