//! Ewald summation of the Gaussian screened Coulomb kernel in 3D periodic cells.
//!
//! The interaction `erf(γr)/r` is split with an auxiliary Gaussian of width
//! `η`: the short-ranged remainder `(erf(γr) - erf(ηr))/r` is summed over
//! lattice images, and the long-ranged `erf(ηr)/r` in reciprocal space. The
//! `G = 0` term is omitted. It shifts every matrix element by the same amount,
//! which the total-charge constraint absorbs.

use crate::cutoff::lattice_points;
use crate::math::constants::SAME_POINT_THRESHOLD_SQ;
use crate::math::linalg::{Mat3, Vec3, determinant, dot, inverse, norm, norm_sq, scale, sub};
use crate::math::shielding::{screened_potential, screened_potential_derivative};
use std::f64::consts::PI;

/// Precomputed translations and reciprocal vectors of one cell.
#[derive(Debug, Clone)]
pub(crate) struct EwaldSum {
    eta: f64,
    volume: f64,
    real_cutoff: f64,
    translations: Vec<Vec3>,
    reciprocal: Vec<Vec3>,
}

impl EwaldSum {
    /// Prepares the sums for a cell.
    ///
    /// `min_gamma` is the smallest screening constant of any atom pair; the
    /// real-space cutoff must cover the slower of the two decaying error
    /// functions.
    pub(crate) fn new(lattice: &Mat3, tolerance: f64, min_gamma: f64) -> Self {
        let eta = PI.sqrt() / determinant(lattice).abs().cbrt();
        Self::with_splitting(lattice, tolerance, min_gamma, eta)
    }

    fn with_splitting(lattice: &Mat3, tolerance: f64, min_gamma: f64, eta: f64) -> Self {
        let volume = determinant(lattice).abs();
        let log_tol = (-tolerance.ln()).max(1.0);

        let real_cutoff = log_tol.sqrt() / eta.min(min_gamma);
        let recip_cutoff = 2.0 * eta * log_tol.sqrt();

        Self {
            eta,
            volume,
            real_cutoff,
            translations: lattice_points(Some(lattice), real_cutoff),
            reciprocal: reciprocal_vectors(lattice, recip_cutoff),
        }
    }

    /// Constant added to every diagonal element, removing the spurious
    /// interaction of the auxiliary Gaussian with itself.
    pub(crate) fn self_term(&self) -> f64 {
        -2.0 * self.eta / PI.sqrt()
    }

    /// Lattice-summed kernel between two sites separated by `d`.
    ///
    /// The coincident image (`d - T = 0`) is left out, so for `d = 0` this is
    /// the interaction of a site with its own periodic images.
    pub(crate) fn interaction(&self, d: Vec3, gamma: f64) -> f64 {
        self.real_space(d, gamma) + self.reciprocal_space(d)
    }

    fn real_space(&self, d: Vec3, gamma: f64) -> f64 {
        let cutoff_sq = self.real_cutoff * self.real_cutoff;
        let mut total = 0.0;
        for trans in &self.translations {
            let r2 = norm_sq(sub(d, *trans));
            if r2 < SAME_POINT_THRESHOLD_SQ || r2 > cutoff_sq {
                continue;
            }
            let r = r2.sqrt();
            total += screened_potential(r, gamma) - screened_potential(r, self.eta);
        }
        total
    }

    fn reciprocal_space(&self, d: Vec3) -> f64 {
        let prefactor = 4.0 * PI / self.volume;
        let inv_four_eta_sq = 0.25 / (self.eta * self.eta);
        self.reciprocal
            .iter()
            .map(|g| {
                let g2 = norm_sq(*g);
                prefactor * (-g2 * inv_four_eta_sq).exp() / g2 * dot(*g, d).cos()
            })
            .sum()
    }

    /// Derivative of [`EwaldSum::interaction`] with respect to `d` and to a
    /// homogeneous strain, both scaled by `factor` and accumulated.
    pub(crate) fn add_derivatives(
        &self,
        d: Vec3,
        gamma: f64,
        factor: f64,
        gradient: &mut Vec3,
        sigma: &mut Mat3,
    ) {
        let cutoff_sq = self.real_cutoff * self.real_cutoff;
        for trans in &self.translations {
            let vec = sub(d, *trans);
            let r2 = norm_sq(vec);
            if r2 < SAME_POINT_THRESHOLD_SQ || r2 > cutoff_sq {
                continue;
            }
            let r = r2.sqrt();
            let dphi = screened_potential_derivative(r, gamma)
                - screened_potential_derivative(r, self.eta);
            let unit = scale(vec, factor * dphi / r);
            for a in 0..3 {
                gradient[a] += unit[a];
                for b in 0..3 {
                    sigma[a][b] += unit[a] * vec[b];
                }
            }
        }

        let prefactor = 4.0 * PI / self.volume;
        let inv_four_eta_sq = 0.25 / (self.eta * self.eta);
        for g in &self.reciprocal {
            let g2 = norm_sq(*g);
            let term = factor * prefactor * (-g2 * inv_four_eta_sq).exp() / g2;
            let phase = dot(*g, d);
            let (sin, cos) = phase.sin_cos();
            let stretch = 2.0 * (inv_four_eta_sq + 1.0 / g2);
            for a in 0..3 {
                gradient[a] -= term * sin * g[a];
                for b in 0..3 {
                    let diagonal = if a == b { 1.0 } else { 0.0 };
                    sigma[a][b] += term * cos * (stretch * g[a] * g[b] - diagonal);
                }
            }
        }
    }
}

/// Reciprocal lattice vectors `G ≠ 0` with `|G| ≤ cutoff`.
fn reciprocal_vectors(lattice: &Mat3, cutoff: f64) -> Vec<Vec3> {
    let Some(inv) = inverse(lattice) else {
        return Vec::new();
    };
    let basis: [Vec3; 3] =
        std::array::from_fn(|k| [2.0 * PI * inv[0][k], 2.0 * PI * inv[1][k], 2.0 * PI * inv[2][k]]);
    let reps: [i64; 3] =
        std::array::from_fn(|k| (cutoff * norm(lattice[k]) / (2.0 * PI)).ceil() as i64);

    let cutoff_sq = cutoff * cutoff;
    let mut vectors = Vec::new();
    for m0 in -reps[0]..=reps[0] {
        for m1 in -reps[1]..=reps[1] {
            for m2 in -reps[2]..=reps[2] {
                if m0 == 0 && m1 == 0 && m2 == 0 {
                    continue;
                }
                let (f0, f1, f2) = (m0 as f64, m1 as f64, m2 as f64);
                let g: Vec3 =
                    std::array::from_fn(|d| f0 * basis[0][d] + f1 * basis[1][d] + f2 * basis[2][d]);
                if norm_sq(g) <= cutoff_sq {
                    vectors.push(g);
                }
            }
        }
    }
    vectors
}
