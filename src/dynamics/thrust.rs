use nalgebra::Vector3;

use crate::config::SimConfig;

// ---------------------------------------------------------------------------
// Throwing-phase equations of motion
// ---------------------------------------------------------------------------

/// Thrust model for one continuous throwing interval.
///
/// A single thrower tires exponentially within an interval:
///   R(t_phase) = R0 * exp(-beta * t_phase)
/// and each thrown marble carries `unit_mass` away at `ejection_velocity`
/// relative to the vehicle, giving the variable-mass rocket equation
///   dv/dt = m * R * (u - v) / M,   dM/dt = -m * R.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowingModel {
    pub throw_rate: f64,        // R0, units/s
    pub fatigue: f64,           // beta, 1/s
    pub unit_mass: f64,         // kg
    pub ejection_velocity: f64, // m/s
    pub dry_mass: f64,          // kg
}

impl ThrowingModel {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            throw_rate: config.throw_rate,
            fatigue: config.fatigue,
            unit_mass: config.unit_mass,
            ejection_velocity: config.ejection_velocity,
            dry_mass: config.dry_mass,
        }
    }

    /// Marbles per second, `phase_time` seconds into the current interval.
    pub fn throw_rate(&self, phase_time: f64) -> f64 {
        self.throw_rate * (-self.fatigue * phase_time).exp()
    }

    /// d(x, v, M)/dt. Once no marbles remain only position changes.
    ///
    /// Evaluated per integrator stage, so the exhaustion check can flip
    /// mid-step.
    pub fn derivatives(&self, phase_time: f64, y: &Vector3<f64>) -> Vector3<f64> {
        let (vel, mass) = (y[1], y[2]);
        if mass > self.dry_mass {
            let mass_flow = self.unit_mass * self.throw_rate(phase_time); // kg/s
            Vector3::new(
                vel,
                mass_flow * (self.ejection_velocity - vel) / mass,
                -mass_flow,
            )
        } else {
            Vector3::new(vel, 0.0, 0.0)
        }
    }

    /// Instantaneous thrust acceleration, m/s^2.
    pub fn acceleration(&self, phase_time: f64, y: &Vector3<f64>) -> f64 {
        self.derivatives(phase_time, y)[1]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> ThrowingModel {
        ThrowingModel::from_config(&SimConfig::default())
    }

    #[test]
    fn rate_decays_exponentially() {
        let m = model();
        assert_relative_eq!(m.throw_rate(0.0), 0.75);
        assert_relative_eq!(m.throw_rate(20.0), 0.75 * (-1.0_f64).exp(), epsilon = 1e-12);
        assert!(m.throw_rate(10.0) < m.throw_rate(5.0));
    }

    #[test]
    fn thrust_from_rest() {
        let m = model();
        let d = m.derivatives(0.0, &Vector3::new(0.0, 0.0, 1002.5));
        let mass_flow = 0.005 * 0.75;
        assert_eq!(d[0], 0.0);
        assert_relative_eq!(d[1], mass_flow * 10.0 / 1002.5, epsilon = 1e-15);
        assert_relative_eq!(d[2], -mass_flow, epsilon = 1e-15);
    }

    #[test]
    fn no_thrust_faster_than_ejection() {
        let m = model();
        // Marbles thrown at u relative to a vehicle already moving at u add nothing.
        let d = m.derivatives(0.0, &Vector3::new(0.0, 10.0, 1001.0));
        assert_eq!(d[1], 0.0);
        assert!(d[2] < 0.0);
    }

    #[test]
    fn exhausted_vehicle_only_drifts() {
        let m = model();
        let d = m.derivatives(0.0, &Vector3::new(5.0, 0.3, 1000.0));
        assert_eq!(d, Vector3::new(0.3, 0.0, 0.0));
        assert_eq!(m.acceleration(0.0, &Vector3::new(5.0, 0.3, 1000.0)), 0.0);
    }
}
