pub mod event;
pub mod integrator;
pub mod phase;
pub mod runner;

pub use event::{EventKind, SimEvent};
pub use integrator::rk4_step;
pub use phase::{Phase, PhaseController, Sample};
pub use runner::{OutputMode, RunOutput, RunSummary, SimulationDriver, Trajectory, TripDuration};
