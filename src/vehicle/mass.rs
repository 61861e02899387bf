use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SimError;

// ---------------------------------------------------------------------------
// Reaction-mass unit count
// ---------------------------------------------------------------------------

/// Number of marbles loaded on board. Always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UnitCount(u64);

impl UnitCount {
    pub const ZERO: UnitCount = UnitCount(0);

    /// Validate a signed count coming from the host.
    pub fn new(count: i64) -> Result<Self, SimError> {
        u64::try_from(count)
            .map(UnitCount)
            .map_err(|_| SimError::InvalidInput {
                input: count.to_string(),
                reason: "unit count must be non-negative".into(),
            })
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u32> for UnitCount {
    fn from(count: u32) -> Self {
        UnitCount(u64::from(count))
    }
}

impl FromStr for UnitCount {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let count: i64 = trimmed.parse().map_err(|_| SimError::InvalidInput {
            input: trimmed.to_string(),
            reason: "not an integer".into(),
        })?;
        UnitCount::new(count)
    }
}

impl fmt::Display for UnitCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Mass model
// ---------------------------------------------------------------------------

/// Total vehicle mass at t=0: dry mass plus every marble on board.
pub fn initial_mass(units: UnitCount, unit_mass: f64, dry_mass: f64) -> f64 {
    dry_mass + units.get() as f64 * unit_mass
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_units_is_dry_mass() {
        assert_eq!(initial_mass(UnitCount::ZERO, 0.005, 1000.0), 1000.0);
    }

    #[test]
    fn mass_is_linear_in_units() {
        let (m, dry) = (0.005, 1000.0);
        for n in [1_u32, 7, 100, 999] {
            let single = initial_mass(n.into(), m, dry);
            let double = initial_mass((2 * n).into(), m, dry);
            assert_relative_eq!(double - single, single - dry, epsilon = 1e-9);
        }
    }

    #[test]
    fn negative_count_rejected() {
        let err = UnitCount::new(-3).unwrap_err();
        assert!(matches!(err, SimError::InvalidInput { .. }));
    }

    #[test]
    fn parse_accepts_padded_integers() {
        assert_eq!(" 250\n".parse::<UnitCount>().unwrap().get(), 250);
    }

    #[test]
    fn parse_rejects_garbage() {
        for raw in ["", "lots", "12.5", "-1", "1e3"] {
            assert!(
                raw.parse::<UnitCount>().is_err(),
                "{raw:?} should not parse as a unit count"
            );
        }
    }
}
