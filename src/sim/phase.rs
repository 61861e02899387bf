use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::dynamics::{State, ThrowingModel};
use crate::error::SimError;
use crate::sim::event::{EventKind, SimEvent};
use crate::sim::integrator::rk4_step;

// ---------------------------------------------------------------------------
// Phases and samples
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Throwing,
    Resting,
    /// Out of marbles. Permanent until arrival.
    Coasting,
    Done,
}

/// One point of a sampled trajectory.
///
/// `phase` is the phase governing the next step from this state; `accel` is
/// the thrust acceleration in that phase (zero unless throwing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time: f64,  // s
    pub pos: f64,   // m
    pub vel: f64,   // m/s
    pub accel: f64, // m/s^2
    pub mass: f64,  // kg
    pub phase: Phase,
}

// ---------------------------------------------------------------------------
// Phase controller
// ---------------------------------------------------------------------------

/// State machine cycling Throwing -> Resting -> Throwing ... until the
/// marbles run out (Coasting) or the target is reached (Done).
///
/// Iterating yields the initial sample, then one sample per step, ending with
/// the arrival sample. A run that cannot arrive yields one
/// `Err(SimError::NonConvergent)` and then stops. The sequence cannot be
/// restarted; build a new controller for another run.
#[derive(Debug, Clone)]
pub struct PhaseController {
    config: SimConfig,
    model: ThrowingModel,
    state: State,
    phase: Phase,
    phase_time: f64,          // s since the current throwing interval began
    interval_start_mass: f64, // kg at the start of the current throwing interval
    rest_steps: u64,
    rest_limit: u64,
    interval: u32,
    steps: u64,
    started: bool,
    finished: bool,
    events: Vec<SimEvent>,
}

impl PhaseController {
    /// Start a run at rest at the origin. `config` is assumed validated.
    pub fn new(config: SimConfig, initial_mass: f64) -> Self {
        let model = ThrowingModel::from_config(&config);
        let state = State::at_rest(initial_mass);
        let rest_limit = rest_step_count(config.rest_duration, config.dt);

        let mut controller = Self {
            config,
            model,
            state,
            phase: Phase::Coasting,
            phase_time: 0.0,
            interval_start_mass: initial_mass,
            rest_steps: 0,
            rest_limit,
            interval: 0,
            steps: 0,
            started: false,
            finished: false,
            events: Vec::new(),
        };

        if controller.arrived() {
            controller.phase = Phase::Done;
            controller.record(EventKind::Arrived);
        } else if !controller.state.is_exhausted(controller.config.dry_mass) {
            controller.phase = Phase::Throwing;
            controller.interval = 1;
            controller.record(EventKind::ThrowStart { interval: 1 });
        }
        controller
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Throwing intervals started so far.
    pub fn throwing_intervals(&self) -> u32 {
        self.interval
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Step until Done without recording samples.
    pub fn run_to_completion(&mut self) -> Result<&State, SimError> {
        while self.phase != Phase::Done {
            if let Err(err) = self.advance() {
                self.finished = true;
                return Err(err);
            }
        }
        self.finished = true;
        Ok(&self.state)
    }

    /// Snapshot of the current state.
    pub fn sample(&self) -> Sample {
        let accel = match self.phase {
            Phase::Throwing if !self.state.is_exhausted(self.config.dry_mass) => self
                .model
                .acceleration(self.phase_time, &self.state.vector()),
            _ => 0.0,
        };
        Sample {
            time: self.state.time,
            pos: self.state.pos,
            vel: self.state.vel,
            accel,
            mass: self.state.mass,
            phase: self.phase,
        }
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Advance one `dt` in the current phase, then apply transitions.
    fn advance(&mut self) -> Result<(), SimError> {
        if self.phase == Phase::Done {
            return Ok(());
        }
        if self.phase == Phase::Coasting && self.state.vel <= 0.0 {
            return Err(self.non_convergent("coasting without forward velocity".into()));
        }
        if self.steps >= self.config.max_steps {
            return Err(self.non_convergent(format!(
                "step ceiling of {} reached",
                self.config.max_steps
            )));
        }
        self.steps += 1;

        let dt = self.config.dt;
        let next = match self.phase {
            Phase::Throwing => self.throw_step(dt)?,
            Phase::Resting => self.rest_step(dt),
            Phase::Coasting => {
                self.state.coast(dt);
                if self.arrived() {
                    Phase::Done
                } else {
                    Phase::Coasting
                }
            }
            Phase::Done => Phase::Done,
        };
        self.transition(next);
        Ok(())
    }

    fn throw_step(&mut self, dt: f64) -> Result<Phase, SimError> {
        let model = self.model;
        let y = rk4_step(
            |t, y| model.derivatives(t, y),
            self.phase_time,
            &self.state.vector(),
            dt,
        );
        self.state.set_vector(&y, self.config.dry_mass);
        self.phase_time += dt;
        self.state.time += dt;

        // Distance, then mass exhaustion, then fatigue.
        if self.arrived() {
            return Ok(Phase::Done);
        }
        if self.state.is_exhausted(self.config.dry_mass) {
            return Ok(Phase::Coasting);
        }
        if model.throw_rate(self.phase_time) < self.config.rate_threshold {
            if self.state.vel <= 0.0 && self.state.mass >= self.interval_start_mass {
                return Err(self.non_convergent(
                    "throwing interval ended without ejecting mass or gaining speed".into(),
                ));
            }
            return Ok(Phase::Resting);
        }
        Ok(Phase::Throwing)
    }

    fn rest_step(&mut self, dt: f64) -> Phase {
        self.state.coast(dt);
        self.rest_steps += 1;
        if self.arrived() {
            Phase::Done
        } else if self.rest_steps >= self.rest_limit {
            Phase::Throwing
        } else {
            Phase::Resting
        }
    }

    fn transition(&mut self, next: Phase) {
        if next == self.phase {
            return;
        }
        let from = self.phase;
        self.phase = next;
        match next {
            Phase::Throwing => {
                self.interval += 1;
                self.phase_time = 0.0;
                self.interval_start_mass = self.state.mass;
            }
            Phase::Resting => self.rest_steps = 0,
            Phase::Coasting | Phase::Done => {}
        }
        if let Some(kind) = EventKind::from_transition(from, next, self.interval) {
            self.record(kind);
        }
        // Zero-length rest: straight back to throwing.
        if next == Phase::Resting && self.rest_limit == 0 {
            self.transition(Phase::Throwing);
        }
    }

    fn record(&mut self, kind: EventKind) {
        debug!(
            ?kind,
            t = self.state.time,
            x = self.state.pos,
            v = self.state.vel,
            m = self.state.mass,
            "phase transition"
        );
        self.events.push(SimEvent::new(kind, &self.state));
    }

    fn arrived(&self) -> bool {
        self.state.pos >= self.config.target_distance
    }

    fn non_convergent(&self, reason: String) -> SimError {
        warn!(
            t = self.state.time,
            x = self.state.pos,
            v = self.state.vel,
            steps = self.steps,
            "{reason}"
        );
        SimError::NonConvergent {
            time: self.state.time,
            position: self.state.pos,
            steps: self.steps,
            reason,
        }
    }
}

impl Iterator for PhaseController {
    type Item = Result<Sample, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.started {
            if let Err(err) = self.advance() {
                self.finished = true;
                return Some(Err(err));
            }
        }
        self.started = true;
        if self.phase == Phase::Done {
            self.finished = true;
        }
        Some(Ok(self.sample()))
    }
}

impl std::iter::FusedIterator for PhaseController {}

/// Whole steps needed to cover `rest_duration`; a partial step counts as one.
fn rest_step_count(rest_duration: f64, dt: f64) -> u64 {
    // Shave a relative hair so 30.0 / 0.1 does not round up to 301.
    (rest_duration / dt * (1.0 - 1e-12)).ceil().max(0.0) as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
