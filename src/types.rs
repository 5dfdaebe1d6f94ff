//! This module defines the core types used in the dftd4 library for representing atoms and calculation results.
//!
//! It includes the `AtomView` trait for abstracting atom data access, the `Atom` struct for a
//! concrete atom, and the result structs returned by the dispersion model: `DispersionResult`,
//! `Properties` and `PairwiseDispersion`. Results are plain data, produced fresh by every call.

use crate::math::linalg::Mat3;

/// A trait for viewing atom data without owning it.
///
/// Lets callers build a [`Structure`](crate::Structure) directly from their own atom
/// representation without an intermediate conversion.
pub trait AtomView {
    /// Returns the atomic number of the atom.
    fn atomic_number(&self) -> u8;

    /// Returns the Cartesian position of the atom in Bohr.
    fn position(&self) -> [f64; 3];
}

/// A concrete representation of an atom with atomic number and position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// The atomic number of the atom, identifying its chemical element.
    pub atomic_number: u8,
    /// The Cartesian position of the atom in Bohr.
    pub position: [f64; 3],
}

impl AtomView for Atom {
    #[inline(always)]
    fn atomic_number(&self) -> u8 {
        self.atomic_number
    }

    #[inline(always)]
    fn position(&self) -> [f64; 3] {
        self.position
    }
}

/// The result of a dispersion energy calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct DispersionResult {
    /// Total dispersion energy in Hartree.
    pub energy: f64,
    /// Derivative of the energy with respect to every atomic position (Hartree/Bohr).
    ///
    /// Present only when the gradient was requested.
    pub gradient: Option<Vec<[f64; 3]>>,
    /// Derivative of the energy with respect to a homogeneous strain (Hartree).
    ///
    /// Present only for periodic structures when the gradient was requested.
    pub virial: Option<Mat3>,
    /// Derivative of the energy with respect to the lattice vectors at fixed
    /// fractional coordinates (Hartree/Bohr), row `k` belonging to lattice vector `k`.
    ///
    /// Present only for periodic structures when the gradient was requested.
    pub lattice_gradient: Option<Mat3>,
}

/// Intermediate, damping-independent quantities of the dispersion model.
#[derive(Debug, Clone, PartialEq)]
pub struct Properties {
    /// Electronegativity-weighted coordination number of every atom.
    pub coordination_numbers: Vec<f64>,
    /// Electronegativity-equilibration partial charge of every atom.
    pub partial_charges: Vec<f64>,
    /// Static atom-in-molecule polarizability of every atom in Bohr³.
    pub polarizabilities: Vec<f64>,
    /// C6 coefficient of every atom pair, row-major `N×N`.
    pub c6_coefficients: Vec<Vec<f64>>,
}

/// Pairwise decomposition of the dispersion energy.
///
/// Both matrices are symmetric and sum to the corresponding energy contribution.
/// For molecules the diagonal is exactly zero; for periodic structures it holds
/// the interaction of an atom with its own periodic images.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseDispersion {
    /// Two-body (additive) pair energies, half of every pair energy on each of
    /// the `(i, j)` and `(j, i)` entries.
    pub additive: Vec<Vec<f64>>,
    /// Three-body (non-additive) energies projected onto pairs: every triple
    /// energy is split evenly over its six ordered pair entries.
    pub non_additive: Vec<Vec<f64>>,
}
