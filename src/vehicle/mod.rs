pub mod mass;

pub use mass::{initial_mass, UnitCount};
