//! Adapters for concrete model types.

mod linear;

pub use linear::{LinearFit, LinearFitFactory, INTERCEPT};
