//! This module contains the charge model of the dispersion engine.
//!
//! It includes the `EeqSolver`, which determines electronegativity equilibration charges for
//! molecules and periodic systems together with their geometric response, and `EeqOptions`
//! for configuring it.

mod eeq;
mod ewald;
mod options;

pub use eeq::{EeqSolution, EeqSolver};
pub use options::EeqOptions;
