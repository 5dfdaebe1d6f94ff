//! Two-body dispersion energy with rational (Becke–Johnson) damping.
//!
//! The energy of a pair at distance `r` is
//!
//! ```text
//! E_ij = -C6_ij · (s6 / (r⁶ + R0⁶) + s8 · 3 Q_i Q_j / (r⁸ + R0⁸))
//! R0   = a1 · sqrt(3 Q_i Q_j) + a2
//! ```
//!
//! where `Q` are the tabulated `r4r2` expectation-value ratios. The sums run
//! over all pairs and periodic images within the cutoff. Each atom gathers its
//! own contributions, so the outer loop is parallel over atoms and the partial
//! results are reduced in atom order.

use super::param::DampingParam;
use super::{DispersionTerm, TermDerivatives};
use crate::cutoff::lattice_points;
use crate::math::constants::SAME_POINT_THRESHOLD_SQ;
use crate::math::linalg::{Mat3, Vec3, add_mat, add_outer, norm_sq, sub};
use crate::model::AtomicC6;
use crate::structure::Structure;
use rayon::prelude::*;

/// Damped dispersion energy expressions for one set of damping parameters.
#[derive(Debug, Clone)]
pub struct RationalDamping<'a> {
    pub(super) param: DampingParam,
    pub(super) r4r2: &'a [f64],
}

/// Per-atom partial result of the two-body sum.
struct PairPartial {
    energy: f64,
    dedcn: f64,
    dedq: f64,
    gradient: Vec3,
    sigma: Mat3,
}

impl<'a> RationalDamping<'a> {
    /// Creates the damping for a structure with the given per-atom `r4r2` values.
    pub fn new(param: DampingParam, r4r2: &'a [f64]) -> Self {
        Self { param, r4r2 }
    }

    pub fn param(&self) -> &DampingParam {
        &self.param
    }

    /// Evaluates the two-body dispersion energy.
    ///
    /// With `with_derivatives`, the derivatives with respect to the coordination
    /// numbers and charges (through the C6 coefficients) and the explicit
    /// gradient and strain derivative are returned as well.
    pub fn dispersion2(
        &self,
        structure: &Structure,
        cutoff: f64,
        c6: &AtomicC6,
        with_derivatives: bool,
    ) -> DispersionTerm {
        let n_atoms = structure.len();
        let translations = lattice_points(structure.lattice(), cutoff);
        let cutoff_sq = cutoff * cutoff;

        let partials: Vec<PairPartial> = (0..n_atoms)
            .into_par_iter()
            .map(|i| {
                let mut part = PairPartial {
                    energy: 0.0,
                    dedcn: 0.0,
                    dedq: 0.0,
                    gradient: [0.0; 3],
                    sigma: [[0.0; 3]; 3],
                };
                for j in 0..n_atoms {
                    let base = structure.pair_vector(i, j);
                    let rr = 3.0 * self.r4r2[i] * self.r4r2[j];
                    let r0 = self.param.a1 * rr.sqrt() + self.param.a2;
                    let c6ij = c6.c6[i][j];
                    for trans in &translations {
                        let vec = sub(base, *trans);
                        let r2 = norm_sq(vec);
                        if r2 > cutoff_sq || r2 < SAME_POINT_THRESHOLD_SQ {
                            continue;
                        }
                        let (e, de) = self.pair_kernel(r2, rr, r0, with_derivatives);
                        part.energy += 0.5 * c6ij * e;
                        if !with_derivatives {
                            continue;
                        }
                        part.dedcn += c6.dc6_dcn[i][j] * e;
                        part.dedq += c6.dc6_dq[i][j] * e;
                        if i != j {
                            for (g, v) in part.gradient.iter_mut().zip(vec) {
                                *g += c6ij * de * v;
                            }
                        }
                        add_outer(&mut part.sigma, vec, vec, 0.5 * c6ij * de);
                    }
                }
                part
            })
            .collect();

        let energy = partials.iter().map(|part| part.energy).sum();
        let derivatives = with_derivatives.then(|| {
            let mut derivatives = TermDerivatives::zeros(partials.len());
            for (i, part) in partials.iter().enumerate() {
                derivatives.dedcn[i] = part.dedcn;
                derivatives.dedq[i] = part.dedq;
                derivatives.gradient[i] = part.gradient;
                add_mat(&mut derivatives.sigma, &part.sigma);
            }
            derivatives
        });
        DispersionTerm {
            energy,
            derivatives,
        }
    }

    /// Splits the two-body energy into pair contributions.
    ///
    /// Element `[i][j]` holds half of the interaction of `i` with `j` and all
    /// of its images, so the matrix is symmetric and sums to the total energy.
    pub fn pairwise_dispersion2(
        &self,
        structure: &Structure,
        cutoff: f64,
        c6: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        let n_atoms = structure.len();
        let translations = lattice_points(structure.lattice(), cutoff);
        let cutoff_sq = cutoff * cutoff;

        (0..n_atoms)
            .into_par_iter()
            .map(|i| {
                (0..n_atoms)
                    .map(|j| {
                        let base = structure.pair_vector(i, j);
                        let rr = 3.0 * self.r4r2[i] * self.r4r2[j];
                        let r0 = self.param.a1 * rr.sqrt() + self.param.a2;
                        translations
                            .iter()
                            .map(|trans| norm_sq(sub(base, *trans)))
                            .filter(|&r2| r2 <= cutoff_sq && r2 >= SAME_POINT_THRESHOLD_SQ)
                            .map(|r2| 0.5 * c6[i][j] * self.pair_kernel(r2, rr, r0, false).0)
                            .sum()
                    })
                    .collect()
            })
            .collect()
    }

    /// Energy of a pair per unit C6 and its derivative with respect to the
    /// distance vector, divided by that vector.
    #[inline]
    fn pair_kernel(&self, r2: f64, rr: f64, r0: f64, with_derivatives: bool) -> (f64, f64) {
        let r0_2 = r0 * r0;
        let r0_6 = r0_2 * r0_2 * r0_2;
        let r0_8 = r0_6 * r0_2;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let r8 = r4 * r4;

        let t6 = 1.0 / (r6 + r0_6);
        let t8 = 1.0 / (r8 + r0_8);
        let energy = -(self.param.s6 * t6 + self.param.s8 * rr * t8);
        if !with_derivatives {
            return (energy, 0.0);
        }

        let d6 = -6.0 * r4 * t6 * t6;
        let d8 = -8.0 * r6 * t8 * t8;
        (energy, -(self.param.s6 * d6 + self.param.s8 * rr * d8))
    }
}
