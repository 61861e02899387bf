pub mod config;
pub mod dynamics;
pub mod error;
pub mod sim;
pub mod vehicle;

pub use config::{ConfigOverrides, SimConfig};
pub use error::{ConfigError, SimError};
pub use sim::{OutputMode, RunOutput, RunSummary, SimulationDriver};
pub use vehicle::UnitCount;

// Flat re-exports for presentation layers
pub mod types {
    pub use crate::dynamics::state::{State, MASS_EPSILON};
    pub use crate::sim::event::{EventKind, SimEvent};
    pub use crate::sim::phase::{Phase, Sample};
    pub use crate::sim::runner::TripDuration;
}
