use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Simulation configuration
// ---------------------------------------------------------------------------

/// Physical and numerical parameters of a run.
///
/// Every field has a default, so a TOML file only needs to name what it
/// changes. Validate once (see [`SimConfig::validate`]) before handing the
/// config to a [`crate::sim::SimulationDriver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub target_distance: f64,   // m
    pub dt: f64,                // s, fixed integration step
    pub throw_rate: f64,        // units/s at the start of a throwing interval
    pub fatigue: f64,           // 1/s, exponential decay of the throw rate
    pub unit_mass: f64,         // kg per marble
    pub ejection_velocity: f64, // m/s, relative to the vehicle
    pub dry_mass: f64,          // kg
    pub rate_threshold: f64,    // units/s, below this the thrower rests
    pub rest_duration: f64,     // s
    pub max_units: u64,         // refuse to simulate above this count
    pub max_steps: u64,         // hard ceiling on integration steps
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            target_distance: 384_400_000.0, // Earth-Moon
            dt: 1000.0,
            throw_rate: 0.75,
            fatigue: 0.05,
            unit_mass: 0.005,
            ejection_velocity: 10.0,
            dry_mass: 1000.0,
            rate_threshold: 0.5,
            rest_duration: 30.0,
            max_units: 1000,
            max_steps: 1_000_000_000,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) TOML document on top of the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check the preconditions the integrator relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reals = [
            ("target_distance", self.target_distance),
            ("dt", self.dt),
            ("throw_rate", self.throw_rate),
            ("fatigue", self.fatigue),
            ("unit_mass", self.unit_mass),
            ("ejection_velocity", self.ejection_velocity),
            ("dry_mass", self.dry_mass),
            ("rate_threshold", self.rate_threshold),
            ("rest_duration", self.rest_duration),
        ];
        for (field, value) in reals {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be finite, got {value}")));
            }
        }

        let positive = [
            ("dt", self.dt),
            ("unit_mass", self.unit_mass),
            ("dry_mass", self.dry_mass),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(invalid(field, format!("must be > 0, got {value}")));
            }
        }

        let non_negative = [
            ("target_distance", self.target_distance),
            ("throw_rate", self.throw_rate),
            ("fatigue", self.fatigue),
            ("rate_threshold", self.rate_threshold),
            ("rest_duration", self.rest_duration),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(invalid(field, format!("must be >= 0, got {value}")));
            }
        }

        if self.max_steps == 0 {
            return Err(invalid("max_steps", "must be at least 1".into()));
        }
        Ok(())
    }

    /// Apply caller overrides; `None` keeps the current value.
    pub fn with_overrides(mut self, o: &ConfigOverrides) -> Self {
        fn set<T: Copy>(slot: &mut T, v: Option<T>) {
            if let Some(v) = v {
                *slot = v;
            }
        }
        set(&mut self.target_distance, o.target_distance);
        set(&mut self.dt, o.dt);
        set(&mut self.throw_rate, o.throw_rate);
        set(&mut self.fatigue, o.fatigue);
        set(&mut self.unit_mass, o.unit_mass);
        set(&mut self.ejection_velocity, o.ejection_velocity);
        set(&mut self.dry_mass, o.dry_mass);
        set(&mut self.rate_threshold, o.rate_threshold);
        set(&mut self.rest_duration, o.rest_duration);
        set(&mut self.max_units, o.max_units);
        set(&mut self.max_steps, o.max_steps);
        self
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Sparse set of parameter overrides, e.g. from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub target_distance: Option<f64>,
    pub dt: Option<f64>,
    pub throw_rate: Option<f64>,
    pub fatigue: Option<f64>,
    pub unit_mass: Option<f64>,
    pub ejection_velocity: Option<f64>,
    pub dry_mass: Option<f64>,
    pub rate_threshold: Option<f64>,
    pub rest_duration: Option<f64>,
    pub max_units: Option<u64>,
    pub max_steps: Option<u64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
