//! Physical and numerical constants shared by the dispersion engine.
//!
//! All internal quantities are in atomic units (Bohr, Hartree). The only
//! conversion happens when covalent radii are read from the reference
//! dataset, which tabulates them in angstroms.

/// Conversion factor from Bohr radii to angstroms.
pub const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_903;

/// Conversion factor from angstroms to Bohr radii.
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / BOHR_TO_ANGSTROM;

/// Squared distances below this value (Bohr²) are treated as the same point.
///
/// Used to skip the self-interaction of an atom with itself in the home cell.
pub const SAME_POINT_THRESHOLD_SQ: f64 = 1e-12;

/// Smallest allowed interatomic distance in Bohr, periodic images included.
pub const MIN_INTERATOMIC_DISTANCE: f64 = 1e-3;

/// Regularisation added under the square root of the CN-dependent
/// electronegativity so its derivative stays finite for isolated atoms.
pub const CN_REGULARIZATION: f64 = 1e-14;
