//! This module provides mathematical utilities and physical constants for the dftd4 library.
//!
//! It contains unit conversion factors and numerical thresholds, the Gaussian
//! screened Coulomb kernel used by the charge model, and small fixed-size
//! vector and matrix helpers used throughout the geometry code.

/// Physical and numerical constants used throughout the library.
pub mod constants;

/// Small dense 3-vector and 3x3 matrix helpers.
pub mod linalg;

/// Gaussian screened Coulomb interaction and its radial derivative.
pub mod shielding;
