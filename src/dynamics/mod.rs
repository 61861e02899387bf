pub mod state;
pub mod thrust;

pub use state::{State, MASS_EPSILON};
pub use thrust::ThrowingModel;
