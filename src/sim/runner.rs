use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::error::{ConfigError, SimError};
use crate::sim::event::SimEvent;
use crate::sim::phase::PhaseController;
use crate::vehicle::{initial_mass, UnitCount};

/// Lazy, finite, single-pass sequence of trajectory samples.
pub type Trajectory = PhaseController;

// ---------------------------------------------------------------------------
// Output modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Final time and velocity only.
    #[default]
    Summary,
    /// Every sampled step, consumed lazily.
    Trajectory,
}

#[derive(Debug)]
pub enum RunOutput {
    Summary(RunSummary),
    Trajectory(Trajectory),
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub units: UnitCount,
    pub elapsed: f64,        // s
    pub final_velocity: f64, // m/s
    pub distance: f64,       // m covered (>= target)
    pub final_mass: f64,     // kg
    pub steps: u64,
    pub throwing_intervals: u32,
    pub events: Vec<SimEvent>,
}

impl RunSummary {
    /// Build from a controller that has reached Done.
    pub fn from_controller(units: UnitCount, controller: &PhaseController) -> Self {
        let state = controller.state();
        Self {
            units,
            elapsed: state.time,
            final_velocity: state.vel,
            distance: state.pos,
            final_mass: state.mass,
            steps: controller.steps(),
            throwing_intervals: controller.throwing_intervals(),
            events: controller.events().to_vec(),
        }
    }

    pub fn duration(&self) -> TripDuration {
        TripDuration::from_seconds(self.elapsed)
    }
}

/// Elapsed time broken into whole days and remaining hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TripDuration {
    pub days: u64,
    pub hours: u64,
}

impl TripDuration {
    const DAY: f64 = 86_400.0;
    const HOUR: f64 = 3_600.0;

    pub fn from_seconds(seconds: f64) -> Self {
        let seconds = seconds.max(0.0);
        Self {
            days: (seconds / Self::DAY).floor() as u64,
            hours: ((seconds % Self::DAY) / Self::HOUR).floor() as u64,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation driver
// ---------------------------------------------------------------------------

/// Owns a validated configuration and runs marble counts through it.
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    config: SimConfig,
}

impl SimulationDriver {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run one marble count in the requested output mode.
    ///
    /// Counts above `max_units` are refused before any state is built.
    pub fn run(&self, units: UnitCount, mode: OutputMode) -> Result<RunOutput, SimError> {
        match mode {
            OutputMode::Summary => self.summarize(units).map(RunOutput::Summary),
            OutputMode::Trajectory => self.trajectory(units).map(RunOutput::Trajectory),
        }
    }

    /// Summary mode: final `(t, v)` and run statistics.
    pub fn summarize(&self, units: UnitCount) -> Result<RunSummary, SimError> {
        let controller = self.controller(units)?;
        self.finish(units, controller)
    }

    /// Trajectory mode: the lazy sample sequence.
    pub fn trajectory(&self, units: UnitCount) -> Result<Trajectory, SimError> {
        self.controller(units)
    }

    /// Summaries for several counts, computed in parallel, in input order.
    pub fn sweep(&self, counts: &[UnitCount]) -> Vec<Result<RunSummary, SimError>> {
        counts.par_iter().map(|&units| self.summarize(units)).collect()
    }

    fn controller(&self, units: UnitCount) -> Result<PhaseController, SimError> {
        if units.get() > self.config.max_units {
            warn!(%units, cap = self.config.max_units, "unit count over cap, skipping run");
            return Err(SimError::TooManyUnits {
                units: units.get(),
                cap: self.config.max_units,
            });
        }
        let mass = initial_mass(units, self.config.unit_mass, self.config.dry_mass);
        info!(%units, mass, target = self.config.target_distance, "starting run");
        Ok(PhaseController::new(self.config.clone(), mass))
    }

    fn finish(
        &self,
        units: UnitCount,
        mut controller: PhaseController,
    ) -> Result<RunSummary, SimError> {
        controller.run_to_completion()?;
        let summary = RunSummary::from_controller(units, &controller);
        info!(
            %units,
            elapsed = summary.elapsed,
            velocity = summary.final_velocity,
            steps = summary.steps,
            "run complete"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::phase::{Phase, Sample};
    use approx::assert_relative_eq;

    fn short_track() -> SimulationDriver {
        SimulationDriver::new(SimConfig {
            target_distance: 500.0,
            dt: 1.0,
            ..SimConfig::default()
        })
        .unwrap()
    }

    fn units(n: u32) -> UnitCount {
        UnitCount::from(n)
    }

    #[test]
    fn invalid_config_rejected() {
        let err = SimulationDriver::new(SimConfig {
            dry_mass: 0.0,
            ..SimConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "dry_mass", .. }));
    }

    #[test]
    fn reaches_target() {
        let driver = short_track();
        let s = driver.summarize(units(500)).unwrap();
        assert!(s.distance >= 500.0);
        assert!(s.elapsed > 0.0);
        assert!(s.final_velocity > 0.0);
        assert!(s.throwing_intervals > 1);
        assert_relative_eq!(s.final_mass, driver.config().dry_mass, epsilon = 1e-6);
    }

    #[test]
    fn final_velocity_bounded_by_rocket_equation() {
        // dv/dM = -(u - v)/M  =>  v_f = u * (1 - M_dry / M0)
        let driver = short_track();
        let s = driver.summarize(units(500)).unwrap();
        let config = driver.config();
        let m0 = initial_mass(units(500), config.unit_mass, config.dry_mass);
        let ideal = config.ejection_velocity * (1.0 - config.dry_mass / m0);
        assert_relative_eq!(s.final_velocity, ideal, max_relative = 5e-3);
    }

    #[test]
    fn modes_agree() {
        let driver = short_track();
        let summary = driver.summarize(units(500)).unwrap();
        let last: Sample = driver
            .trajectory(units(500))
            .unwrap()
            .map(Result::unwrap)
            .last()
            .unwrap();
        assert_eq!(last.phase, Phase::Done);
        assert_relative_eq!(last.time, summary.elapsed, epsilon = 1e-9);
        assert_relative_eq!(last.vel, summary.final_velocity, epsilon = 1e-12);
    }

    #[test]
    fn zero_distance_summary() {
        let driver = SimulationDriver::new(SimConfig {
            target_distance: 0.0,
            ..SimConfig::default()
        })
        .unwrap();
        let s = driver.summarize(units(100)).unwrap();
        assert_eq!(s.elapsed, 0.0);
        assert_eq!(s.final_velocity, 0.0);
        assert_eq!(s.steps, 0);
    }

    #[test]
    fn no_marbles_does_not_spin() {
        let driver = short_track();
        assert!(matches!(
            driver.summarize(UnitCount::ZERO),
            Err(SimError::NonConvergent { .. })
        ));
        let samples: Vec<_> = driver.trajectory(UnitCount::ZERO).unwrap().collect();
        assert_eq!(samples.len(), 2);
        assert!(samples[1].is_err());
    }

    #[test]
    fn more_marbles_never_slower() {
        let driver = short_track();
        let runs: Vec<RunSummary> = [10, 100, 500]
            .into_iter()
            .map(|n| driver.summarize(units(n)).unwrap())
            .collect();
        for pair in runs.windows(2) {
            assert!(
                pair[1].elapsed <= pair[0].elapsed,
                "{} units took {:.0}s, {} units took {:.0}s",
                pair[0].units,
                pair[0].elapsed,
                pair[1].units,
                pair[1].elapsed
            );
            assert!(pair[1].final_velocity >= pair[0].final_velocity);
        }
    }

    #[test]
    fn cap_refuses_both_modes() {
        let driver = short_track();
        let over = units(1001);
        assert_eq!(
            driver.summarize(over).unwrap_err(),
            SimError::TooManyUnits { units: 1001, cap: 1000 }
        );
        assert!(matches!(
            driver.trajectory(over),
            Err(SimError::TooManyUnits { .. })
        ));
        assert!(driver.run(units(1000), OutputMode::Trajectory).is_ok());
    }

    #[test]
    fn cap_is_configurable() {
        let driver = SimulationDriver::new(SimConfig {
            max_units: 2000,
            target_distance: 0.0,
            ..SimConfig::default()
        })
        .unwrap();
        assert!(driver.summarize(units(1500)).is_ok());
    }

    #[test]
    fn sweep_keeps_input_order() {
        let driver = short_track();
        let counts = [units(500), UnitCount::ZERO, units(1001), units(100)];
        let results = driver.sweep(&counts);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().units, units(500));
        assert!(matches!(results[1], Err(SimError::NonConvergent { .. })));
        assert!(matches!(results[2], Err(SimError::TooManyUnits { .. })));
        assert_eq!(
            results[3].as_ref().unwrap(),
            &driver.summarize(units(100)).unwrap()
        );
    }

    #[test]
    fn trip_duration_breakdown() {
        assert_eq!(
            TripDuration::from_seconds(2.0 * 86_400.0 + 5.5 * 3_600.0),
            TripDuration { days: 2, hours: 5 }
        );
        assert_eq!(TripDuration::from_seconds(59.0), TripDuration { days: 0, hours: 0 });
    }
}
