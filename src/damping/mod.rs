//! This module contains the damped dispersion energy expressions.
//!
//! It includes the damping parameters and the table of fitted methods, the
//! two-body rational (Becke–Johnson) damped C6/C8 energy and the three-body
//! Axilrod–Teller–Muto energy with zero damping. Both energy terms consume
//! precomputed C6 coefficients and report their derivatives with respect to
//! the coordination numbers and charges, which the caller chains back to the
//! geometry.

mod atm;
mod method;
mod param;
mod rational;

use crate::math::linalg::{Mat3, Vec3};

pub use method::Method;
pub use param::{DampingParam, DampingParamBuilder};
pub use rational::RationalDamping;

/// Energy of one dispersion term and, on request, its derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct DispersionTerm {
    /// Energy in Hartree.
    pub energy: f64,
    pub derivatives: Option<TermDerivatives>,
}

/// Derivatives of a dispersion term.
///
/// `gradient` and `sigma` hold the explicit geometric dependence at fixed
/// coordination numbers and charges.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDerivatives {
    pub dedcn: Vec<f64>,
    pub dedq: Vec<f64>,
    pub gradient: Vec<Vec3>,
    pub sigma: Mat3,
}

impl TermDerivatives {
    pub(crate) fn zeros(n_atoms: usize) -> Self {
        Self {
            dedcn: vec![0.0; n_atoms],
            dedq: vec![0.0; n_atoms],
            gradient: vec![[0.0; 3]; n_atoms],
            sigma: [[0.0; 3]; 3],
        }
    }
}
