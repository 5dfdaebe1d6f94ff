//! The D4 reference model: reference weighting, atomic C6 coefficients and
//! polarizabilities, and the options that configure it.

mod d4;
mod options;
pub mod reference;

pub use d4::{AtomicC6, D4Model, ReferenceWeights, WeightSet};
pub use options::{ModelKind, ModelOptions};
