use thiserror::Error;

// ---------------------------------------------------------------------------
// Simulation errors
// ---------------------------------------------------------------------------

/// Conditions that stop a single run. None of them are fatal to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid unit count {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("{units} units exceeds the cap of {cap}; simulation skipped")]
    TooManyUnits { units: u64, cap: u64 },

    #[error(
        "run did not reach the target: {reason} (t={time:.1}s, x={position:.3}m, {steps} steps)"
    )]
    NonConvergent {
        time: f64,
        position: f64,
        steps: u64,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`crate::config::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
