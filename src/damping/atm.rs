//! Three-body Axilrod–Teller–Muto dispersion with zero damping.
//!
//! Every triple of atoms (including periodic images) within the cutoff
//! contributes
//!
//! ```text
//! E_ijk = s9 · sqrt(C6_ij C6_ik C6_jk) · (3 cos α cos β cos γ + 1) / (r_ij r_ik r_jk)³ · f_damp
//! f_damp = 1 / (1 + 6 (R0_ijk / (r_ij r_ik r_jk)^(1/3))^alp)
//! ```
//!
//! Triples are enumerated from the atom with the largest index: atom `i` walks
//! over neighbours `j <= i` and `k <= j`, each with its own lattice translation.
//! Repeated indices are compensated by [`triple_scale`].

use super::rational::RationalDamping;
use super::{DispersionTerm, TermDerivatives};
use crate::cutoff::lattice_points;
use crate::math::constants::SAME_POINT_THRESHOLD_SQ;
use crate::math::linalg::{Mat3, Vec3, add_mat, add_outer, norm_sq, sub};
use crate::model::AtomicC6;
use crate::structure::Structure;
use rayon::prelude::*;
use std::collections::HashMap;

/// Weight of a triple that compensates for repeated atom indices.
///
/// A triple of one atom with two of its images is enumerated six times, a
/// triple with one repeated atom twice.
pub(crate) fn triple_scale(i: usize, j: usize, k: usize) -> f64 {
    if i == j {
        if i == k { 1.0 / 6.0 } else { 0.5 }
    } else if i != k && j != k {
        1.0
    } else {
        0.5
    }
}

/// Geometry of one triple as seen from its central atom `i`.
struct Triple {
    j: usize,
    k: usize,
    vij: Vec3,
    vik: Vec3,
    vjk: Vec3,
    r2ij: f64,
    r2ik: f64,
    r2jk: f64,
}

/// Energy of a triple and the derivatives with respect to its three distance
/// vectors.
struct TripleEnergy {
    /// Energy, already scaled by the repeated-index weight.
    energy: f64,
    dgij: Vec3,
    dgik: Vec3,
    dgjk: Vec3,
}

struct AtmPartial {
    energy: f64,
    dedcn: Vec<f64>,
    gradient: Vec<Vec3>,
    sigma: Mat3,
}

/// Neighbours `j <= i` of atom `i` with the vector from `i` to the image of `j`.
fn neighbour_list(
    structure: &Structure,
    i: usize,
    translations: &[Vec3],
    cutoff_sq: f64,
) -> Vec<(usize, Vec3)> {
    let mut neighbours = Vec::new();
    for j in 0..=i {
        let base = structure.pair_vector(j, i);
        for trans in translations {
            let vij: Vec3 = std::array::from_fn(|d| base[d] + trans[d]);
            let r2 = norm_sq(vij);
            if r2 > cutoff_sq || r2 < SAME_POINT_THRESHOLD_SQ {
                continue;
            }
            neighbours.push((j, vij));
        }
    }
    neighbours
}

/// Visits every triple centred on atom `i` that lies within the cutoff.
fn for_each_triple(neighbours: &[(usize, Vec3)], cutoff_sq: f64, mut visit: impl FnMut(Triple)) {
    for &(j, vij) in neighbours {
        let r2ij = norm_sq(vij);
        for &(k, vik) in neighbours {
            if k > j {
                continue;
            }
            let vjk = sub(vik, vij);
            let r2jk = norm_sq(vjk);
            if r2jk > cutoff_sq || r2jk < SAME_POINT_THRESHOLD_SQ {
                continue;
            }
            visit(Triple {
                j,
                k,
                vij,
                vik,
                vjk,
                r2ij,
                r2ik: norm_sq(vik),
                r2jk,
            });
        }
    }
}

impl RationalDamping<'_> {
    /// Evaluates the three-body dispersion energy.
    ///
    /// The C6 coefficients are expected at zero partial charges, so only their
    /// coordination-number derivatives are used and `dedq` stays zero. A zero
    /// `s9` skips the term altogether.
    pub fn dispersion3(
        &self,
        structure: &Structure,
        cutoff: f64,
        c6: &AtomicC6,
        with_derivatives: bool,
    ) -> DispersionTerm {
        let n_atoms = structure.len();
        if self.param.s9 == 0.0 {
            return DispersionTerm {
                energy: 0.0,
                derivatives: with_derivatives.then(|| TermDerivatives::zeros(n_atoms)),
            };
        }

        let translations = lattice_points(structure.lattice(), cutoff);
        let cutoff_sq = cutoff * cutoff;

        let partials: Vec<AtmPartial> = (0..n_atoms)
            .into_par_iter()
            .map(|i| {
                let mut part = AtmPartial {
                    energy: 0.0,
                    dedcn: Vec::new(),
                    gradient: Vec::new(),
                    sigma: [[0.0; 3]; 3],
                };
                if with_derivatives {
                    part.dedcn = vec![0.0; n_atoms];
                    part.gradient = vec![[0.0; 3]; n_atoms];
                }

                let neighbours = neighbour_list(structure, i, &translations, cutoff_sq);
                for_each_triple(&neighbours, cutoff_sq, |t| {
                    let term = self.triple_energy(&c6.c6, i, &t, with_derivatives);
                    part.energy += term.energy;
                    if !with_derivatives {
                        return;
                    }
                    let (j, k) = (t.j, t.k);
                    for d in 0..3 {
                        part.gradient[i][d] -= term.dgij[d] + term.dgik[d];
                        part.gradient[j][d] += term.dgij[d] - term.dgjk[d];
                        part.gradient[k][d] += term.dgik[d] + term.dgjk[d];
                    }
                    add_outer(&mut part.sigma, term.dgij, t.vij, 1.0);
                    add_outer(&mut part.sigma, term.dgik, t.vik, 1.0);
                    add_outer(&mut part.sigma, term.dgjk, t.vjk, 1.0);

                    let (c6ij, c6ik, c6jk) = (c6.c6[i][j], c6.c6[i][k], c6.c6[j][k]);
                    let half = 0.5 * term.energy;
                    part.dedcn[i] += half * (c6.dc6_dcn[i][j] / c6ij + c6.dc6_dcn[i][k] / c6ik);
                    part.dedcn[j] += half * (c6.dc6_dcn[j][i] / c6ij + c6.dc6_dcn[j][k] / c6jk);
                    part.dedcn[k] += half * (c6.dc6_dcn[k][i] / c6ik + c6.dc6_dcn[k][j] / c6jk);
                });
                part
            })
            .collect();

        let energy = partials.iter().map(|part| part.energy).sum();
        let derivatives = with_derivatives.then(|| {
            let mut derivatives = TermDerivatives::zeros(n_atoms);
            for part in &partials {
                for (total, value) in derivatives.dedcn.iter_mut().zip(&part.dedcn) {
                    *total += value;
                }
                for (total, value) in derivatives.gradient.iter_mut().zip(&part.gradient) {
                    for d in 0..3 {
                        total[d] += value[d];
                    }
                }
                add_mat(&mut derivatives.sigma, &part.sigma);
            }
            derivatives
        });
        DispersionTerm {
            energy,
            derivatives,
        }
    }

    /// Splits the three-body energy into pair contributions.
    ///
    /// The energy of every triple is shared equally among the six ordered
    /// pairs it contains. The matrix is symmetric and sums to the total
    /// three-body energy.
    pub fn pairwise_dispersion3(
        &self,
        structure: &Structure,
        cutoff: f64,
        c6: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        let n_atoms = structure.len();
        let mut pairwise = vec![vec![0.0; n_atoms]; n_atoms];
        if self.param.s9 == 0.0 {
            return pairwise;
        }

        let translations = lattice_points(structure.lattice(), cutoff);
        let cutoff_sq = cutoff * cutoff;

        let partials: Vec<HashMap<(usize, usize), f64>> = (0..n_atoms)
            .into_par_iter()
            .map(|i| {
                let mut shares = HashMap::new();
                let neighbours = neighbour_list(structure, i, &translations, cutoff_sq);
                for_each_triple(&neighbours, cutoff_sq, |t| {
                    let share = self.triple_energy(c6, i, &t, false).energy / 6.0;
                    for pair in [(i, t.j), (i, t.k), (t.j, t.k)] {
                        *shares.entry(pair).or_insert(0.0) += share;
                    }
                });
                shares
            })
            .collect();

        for shares in partials {
            for ((a, b), value) in shares {
                pairwise[a][b] += value;
                pairwise[b][a] += value;
            }
        }
        pairwise
    }

    fn triple_energy(
        &self,
        c6: &[Vec<f64>],
        i: usize,
        t: &Triple,
        with_derivatives: bool,
    ) -> TripleEnergy {
        let (j, k) = (t.j, t.k);
        let (r2ij, r2ik, r2jk) = (t.r2ij, t.r2ik, t.r2jk);
        let alp = self.param.alp;

        let c9 = -self.param.s9 * (c6[i][j] * c6[i][k] * c6[j][k]).abs().sqrt();
        let r0 = self.critical_radius(i, j) * self.critical_radius(i, k) * self.critical_radius(j, k);
        let scale = triple_scale(i, j, k);

        let r2 = r2ij * r2ik * r2jk;
        let r1 = r2.sqrt();
        let r3 = r2 * r1;
        let r5 = r3 * r2;

        let ratio = (r0 / r1).powf(alp / 3.0);
        let fdmp = 1.0 / (1.0 + 6.0 * ratio);
        let ang = 0.375 * (r2ij + r2jk - r2ik) * (r2ij - r2jk + r2ik) * (-r2ij + r2jk + r2ik)
            / r5
            + 1.0 / r3;

        let energy = -ang * fdmp * c9 * scale;
        if !with_derivatives {
            return TripleEnergy {
                energy,
                dgij: [0.0; 3],
                dgik: [0.0; 3],
                dgjk: [0.0; 3],
            };
        }

        let dfdmp = -2.0 * alp * ratio * fdmp * fdmp;
        let factor = |r2a: f64, r2b: f64, r2c: f64| {
            // Derivative of the angular term with respect to r2a, times -r2a.
            let dang = -0.375
                * (r2a.powi(3)
                    + r2a * r2a * (r2b + r2c)
                    + r2a * (3.0 * r2b * r2b + 2.0 * r2b * r2c + 3.0 * r2c * r2c)
                    - 5.0 * (r2b - r2c).powi(2) * (r2b + r2c))
                / r5;
            scale * c9 * (-dang * fdmp + ang * dfdmp) / r2a
        };
        let fij = factor(r2ij, r2jk, r2ik);
        let fik = factor(r2ik, r2jk, r2ij);
        let fjk = factor(r2jk, r2ik, r2ij);

        TripleEnergy {
            energy,
            dgij: t.vij.map(|v| fij * v),
            dgik: t.vik.map(|v| fik * v),
            dgjk: t.vjk.map(|v| fjk * v),
        }
    }

    #[inline]
    fn critical_radius(&self, a: usize, b: usize) -> f64 {
        self.param.a1 * (3.0 * self.r4r2[a] * self.r4r2[b]).sqrt() + self.param.a2
    }
}
