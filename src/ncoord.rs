//! Smooth coordination numbers and their geometric derivatives.
//!
//! A coordination number counts the neighbours of an atom with a smooth step
//! function of the distance relative to the sum of the covalent radii. Two
//! flavours are used by the dispersion model: the electronegativity-weighted
//! count that selects reference states, and a plain count, capped at a maximum
//! value, that shifts the electronegativities of the charge model.
//!
//! Both the value and the derivative loops are written in gather form: every
//! atom walks over all partners and periodic images on its own, so the per-atom
//! work is independent and can run on rayon without write conflicts while the
//! result stays bit-identical to a serial evaluation.

use crate::cutoff::lattice_points;
use crate::math::constants::{ANGSTROM_TO_BOHR, SAME_POINT_THRESHOLD_SQ};
use crate::math::linalg::{Mat3, Vec3, add_mat, add_outer, norm_sq, scale, sub};
use crate::structure::Structure;
use libm::erf;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Steepness of the error-function counting function.
const ERF_STEEPNESS: f64 = 7.5;
/// Steepness of the logistic counting function.
const EXP_STEEPNESS: f64 = 16.0;

/// Electronegativity weighting `k4 · exp(-(|ΔEN| + k5)² / k6)` of the D4 count.
const EN_K4: f64 = 4.10451;
const EN_K5: f64 = 19.08857;
const EN_K6: f64 = 2.0 * 11.28174 * 11.28174;

/// Covalent radius used by the counting functions, in Bohr.
///
/// The tabulated radii (Å) are converted and scaled by 4/3.
pub fn counting_radius(covalent_radius_angstrom: f64) -> f64 {
    4.0 / 3.0 * covalent_radius_angstrom * ANGSTROM_TO_BOHR
}

/// Shape of the smooth neighbour-counting step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountingFunction {
    /// Logistic step `1 / (1 + exp(-k (rc/r - 1)))`.
    Exp,
    /// Error-function step `½ (1 + erf(-k (r - rc) / rc))`.
    Erf,
}

impl CountingFunction {
    #[inline]
    fn value(self, r: f64, rc: f64) -> f64 {
        match self {
            CountingFunction::Exp => 1.0 / (1.0 + (-EXP_STEEPNESS * (rc / r - 1.0)).exp()),
            CountingFunction::Erf => 0.5 * (1.0 + erf(-ERF_STEEPNESS * (r - rc) / rc)),
        }
    }

    #[inline]
    fn derivative(self, r: f64, rc: f64) -> f64 {
        match self {
            CountingFunction::Exp => {
                let expterm = (-EXP_STEEPNESS * (rc / r - 1.0)).exp();
                -EXP_STEEPNESS * rc * expterm / (r * r * (1.0 + expterm).powi(2))
            }
            CountingFunction::Erf => {
                let x = ERF_STEEPNESS * (r - rc) / rc;
                -ERF_STEEPNESS / (PI.sqrt() * rc) * (-x * x).exp()
            }
        }
    }
}

/// Configuration of a coordination number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinationNumber {
    /// Counting function applied to every pair.
    pub counting: CountingFunction,
    /// Real-space cutoff in Bohr.
    pub cutoff: f64,
    /// Weight every pair by the electronegativity difference of the two atoms.
    pub electronegativity_scaling: bool,
    /// Smooth upper bound of the coordination number, if any.
    pub cn_max: Option<f64>,
}

impl CoordinationNumber {
    /// Electronegativity-weighted count used to select reference states.
    pub fn dispersion(cutoff: f64) -> Self {
        Self {
            counting: CountingFunction::Erf,
            cutoff,
            electronegativity_scaling: true,
            cn_max: None,
        }
    }

    /// Capped count entering the electronegativities of the charge model.
    pub fn charge_model(cutoff: f64, cn_max: f64) -> Self {
        Self {
            counting: CountingFunction::Erf,
            cutoff,
            electronegativity_scaling: false,
            cn_max: Some(cn_max),
        }
    }

    /// Computes the coordination number of every atom.
    ///
    /// `radii` are the counting radii in Bohr (see [`counting_radius`]) and
    /// `electronegativities` the Pauling values, both per atom.
    pub fn compute(
        &self,
        structure: &Structure,
        radii: &[f64],
        electronegativities: &[f64],
    ) -> Vec<f64> {
        let raw = self.raw_counts(structure, radii, electronegativities);
        match self.cn_max {
            Some(cn_max) => raw.into_iter().map(|cn| cap(cn, cn_max)).collect(),
            None => raw,
        }
    }

    /// Adds the geometric derivative of `Σ dE/dCN_i · CN_i` to a gradient and a
    /// strain derivative.
    ///
    /// `dedcn` is the derivative with respect to the (possibly capped)
    /// coordination numbers returned by [`CoordinationNumber::compute`].
    pub fn add_derivatives(
        &self,
        structure: &Structure,
        radii: &[f64],
        electronegativities: &[f64],
        dedcn: &[f64],
        gradient: &mut [Vec3],
        sigma: &mut Mat3,
    ) {
        let dedcn: Vec<f64> = match self.cn_max {
            Some(cn_max) => self
                .raw_counts(structure, radii, electronegativities)
                .into_iter()
                .zip(dedcn)
                .map(|(cn, &de)| de * cap_derivative(cn, cn_max))
                .collect(),
            None => dedcn.to_vec(),
        };

        let n_atoms = structure.len();
        let translations = lattice_points(structure.lattice(), self.cutoff);
        let cutoff_sq = self.cutoff * self.cutoff;

        let per_atom: Vec<(Vec3, Mat3)> = (0..n_atoms)
            .into_par_iter()
            .map(|i| {
                let mut grad_i = [0.0; 3];
                let mut sigma_i = [[0.0; 3]; 3];
                for j in 0..n_atoms {
                    let base = structure.pair_vector(i, j);
                    let rc = radii[i] + radii[j];
                    let weight = self.pair_weight(electronegativities[i], electronegativities[j]);
                    let coeff = dedcn[i] + dedcn[j];
                    for trans in &translations {
                        let vec = sub(base, *trans);
                        let r2 = norm_sq(vec);
                        if r2 > cutoff_sq || r2 < SAME_POINT_THRESHOLD_SQ {
                            continue;
                        }
                        let r = r2.sqrt();
                        let dcount = weight * self.counting.derivative(r, rc);
                        let unit = scale(vec, 1.0 / r);
                        if i != j {
                            for (g, u) in grad_i.iter_mut().zip(unit) {
                                *g += coeff * dcount * u;
                            }
                        }
                        // Every unordered pair is visited from both ends.
                        add_outer(&mut sigma_i, unit, vec, 0.5 * coeff * dcount);
                    }
                }
                (grad_i, sigma_i)
            })
            .collect();

        for (g, (grad_i, sigma_i)) in gradient.iter_mut().zip(&per_atom) {
            for (value, delta) in g.iter_mut().zip(grad_i) {
                *value += delta;
            }
            add_mat(sigma, sigma_i);
        }
    }

    fn raw_counts(
        &self,
        structure: &Structure,
        radii: &[f64],
        electronegativities: &[f64],
    ) -> Vec<f64> {
        let n_atoms = structure.len();
        let translations = lattice_points(structure.lattice(), self.cutoff);
        let cutoff_sq = self.cutoff * self.cutoff;

        (0..n_atoms)
            .into_par_iter()
            .map(|i| {
                let mut cn = 0.0;
                for j in 0..n_atoms {
                    let base = structure.pair_vector(i, j);
                    let rc = radii[i] + radii[j];
                    let weight = self.pair_weight(electronegativities[i], electronegativities[j]);
                    for trans in &translations {
                        let r2 = norm_sq(sub(base, *trans));
                        if r2 > cutoff_sq || r2 < SAME_POINT_THRESHOLD_SQ {
                            continue;
                        }
                        cn += weight * self.counting.value(r2.sqrt(), rc);
                    }
                }
                cn
            })
            .collect()
    }

    #[inline]
    fn pair_weight(&self, en_i: f64, en_j: f64) -> f64 {
        if self.electronegativity_scaling {
            let den = (en_i - en_j).abs() + EN_K5;
            EN_K4 * (-den * den / EN_K6).exp()
        } else {
            1.0
        }
    }
}

#[inline]
fn cap(cn: f64, cn_max: f64) -> f64 {
    cn_max.exp().ln_1p() - (cn_max - cn).exp().ln_1p()
}

#[inline]
fn cap_derivative(cn: f64, cn_max: f64) -> f64 {
    1.0 / (1.0 + (cn - cn_max).exp())
}
