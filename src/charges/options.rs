//! This module defines configuration options for the electronegativity equilibration model.
//!
//! It provides the `EeqOptions` struct, which controls the coordination number that shifts
//! the atomic electronegativities and the accuracy of the Ewald summation used for periodic
//! systems. The defaults reproduce the charge model of D4.

/// Configuration parameters for the electronegativity equilibration solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EeqOptions {
    /// Real-space cutoff of the coordination number, in Bohr.
    pub cn_cutoff: f64,
    /// Smooth upper bound of the coordination number.
    ///
    /// Highly coordinated atoms would otherwise receive unphysically large
    /// electronegativity shifts.
    pub cn_max: f64,
    /// Target accuracy of the Ewald summation for periodic systems.
    ///
    /// Both the real-space and the reciprocal-space cutoffs are derived from it,
    /// so that neglected terms are of this order of magnitude.
    pub ewald_tolerance: f64,
}

impl Default for EeqOptions {
    fn default() -> Self {
        Self {
            cn_cutoff: 25.0,
            cn_max: 8.0,
            ewald_tolerance: 1.0e-10,
        }
    }
}
