use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Numerical constants
// ---------------------------------------------------------------------------

/// Absolute tolerance for "reaction mass exhausted": M <= M_dry + MASS_EPSILON.
pub const MASS_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// 1-D vehicle state
// ---------------------------------------------------------------------------

/// Vehicle state at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub time: f64, // s, global
    pub pos: f64,  // m along the track
    pub vel: f64,  // m/s
    pub mass: f64, // kg, dry mass plus remaining marbles
}

impl State {
    /// At rest at the origin with the given total mass.
    pub fn at_rest(mass: f64) -> Self {
        Self {
            time: 0.0,
            pos: 0.0,
            vel: 0.0,
            mass,
        }
    }

    /// Integrable part of the state as `(x, v, M)`.
    pub fn vector(&self) -> Vector3<f64> {
        Vector3::new(self.pos, self.vel, self.mass)
    }

    /// Replace `(x, v, M)` from an integrator result, flooring mass at `dry_mass`.
    pub fn set_vector(&mut self, y: &Vector3<f64>, dry_mass: f64) {
        self.pos = y[0];
        self.vel = y[1];
        self.mass = y[2].max(dry_mass);
    }

    /// Ballistic update with no thrust: x += v*dt, t += dt.
    pub fn coast(&mut self, dt: f64) {
        self.pos += self.vel * dt;
        self.time += dt;
    }

    pub fn is_exhausted(&self, dry_mass: f64) -> bool {
        self.mass <= dry_mass + MASS_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_vector_floors_mass() {
        let mut s = State::at_rest(1000.5);
        s.set_vector(&Vector3::new(1.0, 2.0, 999.7), 1000.0);
        assert_eq!(s.mass, 1000.0);
        assert_eq!(s.pos, 1.0);
        assert_eq!(s.vel, 2.0);
        assert!(s.is_exhausted(1000.0));
    }

    #[test]
    fn coast_moves_at_constant_velocity() {
        let mut s = State {
            vel: 3.0,
            ..State::at_rest(10.0)
        };
        s.coast(2.0);
        s.coast(2.0);
        assert_eq!(s.pos, 12.0);
        assert_eq!(s.time, 4.0);
        assert_eq!(s.mass, 10.0);
    }

    #[test]
    fn exhaustion_uses_tolerance() {
        let s = State::at_rest(1000.0 + 1e-10);
        assert!(s.is_exhausted(1000.0));
        let s = State::at_rest(1000.0 + 1e-6);
        assert!(!s.is_exhausted(1000.0));
    }
}
