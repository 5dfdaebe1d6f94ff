//! Reference weighting and atomic C6 coefficients of the D4 and D4S models.
//!
//! Every element carries a small set of reference states with known dynamic
//! polarizabilities. The polarizability of an atom in a molecule is a weighted
//! sum over the references of its element: Gaussian weights in the coordination
//! number pick the references whose environment resembles the actual one, and a
//! charge-scaling function adjusts them to the actual partial charge. Pair C6
//! coefficients follow from the weights and the precomputed Casimir–Polder
//! integrals of all reference pairs.
//!
//! D4S resolves the weights per pair: the Gaussian steepness used for atom `i`
//! depends on the element of its partner `j` as well.

use super::options::{ModelKind, ModelOptions};
use super::reference::{
    N_FREQ, casimir_polder, dzeta, reference_polarizability, secondary_polarizability,
    trapezoid_weights, zeta,
};
use crate::error::DispersionError;
use crate::ncoord::counting_radius;
use crate::params::{ElementData, Parameters, ReferenceState};
use log::trace;
use rayon::prelude::*;

/// Two reference coordination numbers closer than this count as the same.
const SAME_CN_THRESHOLD: f64 = 1e-12;

/// Tabulated data of one element present in the structure.
#[derive(Debug, Clone)]
struct Species<'p> {
    data: &'p ElementData,
    /// Number of references sharing the coordination number of each reference.
    ngw: Vec<usize>,
    /// Largest reference coordination number, the fallback target of the weighting.
    max_cn: f64,
    /// Gaussian steepness of the smooth (D4S) weighting.
    steepness: f64,
}

fn same_coordination(a: &ReferenceState, b: &ReferenceState) -> bool {
    match (a.cn_class, b.cn_class) {
        (Some(x), Some(y)) => x.round() == y.round(),
        _ => (a.cn - b.cn).abs() < SAME_CN_THRESHOLD,
    }
}

/// Polarizability of the element in `state` with its secondary atoms removed.
fn element_polarizability(
    parameters: &Parameters,
    options: &ModelOptions,
    state: &ReferenceState,
) -> Result<[f64; N_FREQ], DispersionError> {
    let secondary = match state.secondary {
        Some(z) if state.hcount != 0.0 => {
            let element = parameters.element(z)?;
            Some(secondary_polarizability(
                parameters.secondary(z)?,
                element.effective_charge,
                element.hardness,
                state.secondary_charge,
                options.ga,
                options.gc,
            ))
        }
        _ => None,
    };
    Ok(reference_polarizability(state, secondary.as_ref()))
}

/// Reference weights of one atom for one weighting steepness.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSet {
    /// Weight of every reference, including the charge scaling.
    pub weights: Vec<f64>,
    /// Derivative of the weights with respect to the coordination number.
    pub dweights_dcn: Vec<f64>,
    /// Derivative of the weights with respect to the partial charge.
    pub dweights_dq: Vec<f64>,
}

/// Reference weights of all atoms.
///
/// For D4 every atom has a single set; for D4S one set per element of the
/// structure, the set for partner element `s` stored at index `s`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceWeights {
    sets: Vec<Vec<WeightSet>>,
}

/// Pair C6 coefficients and their derivatives.
///
/// `dc6_dcn[i][j]` is the derivative of `c6[i][j]` with respect to the
/// coordination number of atom `i` only; the same holds for `dc6_dq`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicC6 {
    pub c6: Vec<Vec<f64>>,
    pub dc6_dcn: Vec<Vec<f64>>,
    pub dc6_dq: Vec<Vec<f64>>,
}

/// The reference model of one structure's set of elements.
#[derive(Debug, Clone)]
pub struct D4Model<'p> {
    options: ModelOptions,
    species: Vec<Species<'p>>,
    atom_species: Vec<usize>,
    /// Dynamic polarizability of every reference of every species.
    alpha: Vec<Vec<[f64; N_FREQ]>>,
    /// Casimir–Polder integrals of every reference pair, indexed by the species
    /// pair and flattened row-major over the two reference indices.
    c6_reference: Vec<Vec<f64>>,
}

impl<'p> D4Model<'p> {
    /// Collects the reference data of every element in `numbers` and
    /// precomputes the reference C6 coefficients.
    ///
    /// # Errors
    ///
    /// Returns `ParameterNotFound` if an element, or the secondary system of
    /// one of its references, is missing from the dataset.
    pub fn new(
        numbers: &[u8],
        parameters: &'p Parameters,
        options: ModelOptions,
    ) -> Result<Self, DispersionError> {
        let mut unique: Vec<u8> = Vec::new();
        let atom_species = numbers
            .iter()
            .map(|&z| match unique.iter().position(|&known| known == z) {
                Some(index) => index,
                None => {
                    unique.push(z);
                    unique.len() - 1
                }
            })
            .collect();

        let species = unique
            .iter()
            .map(|&z| {
                let data = parameters.element(z)?;
                let ngw = data
                    .references
                    .iter()
                    .map(|state| {
                        data.references
                            .iter()
                            .filter(|other| same_coordination(state, other))
                            .count()
                    })
                    .collect();
                let max_cn = data
                    .references
                    .iter()
                    .map(|state| state.cn)
                    .fold(f64::NEG_INFINITY, f64::max);
                Ok(Species {
                    data,
                    ngw,
                    max_cn,
                    steepness: data.smooth_steepness.unwrap_or(options.wf),
                })
            })
            .collect::<Result<Vec<_>, DispersionError>>()?;

        let quadrature = trapezoid_weights();
        let alpha: Vec<Vec<[f64; N_FREQ]>> = species
            .iter()
            .map(|sp| {
                sp.data
                    .references
                    .iter()
                    .map(|state| element_polarizability(parameters, &options, state))
                    .collect::<Result<Vec<_>, DispersionError>>()
            })
            .collect::<Result<_, _>>()?;
        let c6_reference: Vec<Vec<f64>> = alpha
            .iter()
            .flat_map(|alpha_i| {
                alpha.iter().map(move |alpha_j| {
                    alpha_i
                        .iter()
                        .flat_map(|a| alpha_j.iter().map(move |b| casimir_polder(&quadrature, a, b)))
                        .collect::<Vec<f64>>()
                })
            })
            .collect();

        trace!(
            "{} model with {} species and {} reference pairs",
            options.kind,
            species.len(),
            species.len() * species.len()
        );

        Ok(Self {
            options,
            species,
            atom_species,
            alpha,
            c6_reference,
        })
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Counting radius (Bohr) of every atom for the coordination number.
    pub fn counting_radii(&self) -> Vec<f64> {
        self.per_atom(|data| counting_radius(data.covalent_radius))
    }

    /// Pauling electronegativity of every atom.
    pub fn electronegativities(&self) -> Vec<f64> {
        self.per_atom(|data| data.electronegativity)
    }

    /// `<r⁴>/<r²>` factor of every atom.
    pub fn r4r2(&self) -> Vec<f64> {
        self.per_atom(|data| data.r4r2)
    }

    fn per_atom(&self, f: impl Fn(&ElementData) -> f64) -> Vec<f64> {
        self.atom_species
            .iter()
            .map(|&s| f(self.species[s].data))
            .collect()
    }

    /// Computes the reference weights of every atom from its coordination
    /// number and partial charge.
    pub fn weight_references(&self, cn: &[f64], charges: &[f64]) -> ReferenceWeights {
        let sets = self
            .atom_species
            .par_iter()
            .zip(cn.par_iter().zip(charges.par_iter()))
            .map(|(&si, (&cn_i, &q_i))| match self.options.kind {
                ModelKind::D4 => vec![self.weight_set(si, self.options.wf, cn_i, q_i)],
                ModelKind::D4S => {
                    let s_i = self.species[si].steepness;
                    self.species
                        .iter()
                        .map(|partner| {
                            let s_j = partner.steepness;
                            let steepness = 2.0 * s_i * s_j / (s_i + s_j);
                            self.weight_set(si, steepness, cn_i, q_i)
                        })
                        .collect()
                }
            })
            .collect();
        ReferenceWeights { sets }
    }

    fn weight_set(&self, species: usize, steepness: f64, cn: f64, charge: f64) -> WeightSet {
        let sp = &self.species[species];
        let references = &sp.data.references;

        let mut gaussian = Vec::with_capacity(references.len());
        let mut dgaussian = Vec::with_capacity(references.len());
        for (state, &ngw) in references.iter().zip(&sp.ngw) {
            let diff = state.cn - cn;
            let (mut value, mut derivative) = (0.0, 0.0);
            for g in 1..=ngw {
                let exponent = g as f64 * steepness;
                let expw = (-exponent * diff * diff).exp();
                value += expw;
                derivative += 2.0 * exponent * diff * expw;
            }
            gaussian.push(value);
            dgaussian.push(derivative);
        }
        let norm: f64 = gaussian.iter().sum();
        let dnorm: f64 = dgaussian.iter().sum();

        let zeff = sp.data.effective_charge;
        let gc = self.options.gc * sp.data.hardness;
        let ga = self.options.ga;

        let mut set = WeightSet {
            weights: Vec::with_capacity(references.len()),
            dweights_dcn: Vec::with_capacity(references.len()),
            dweights_dq: Vec::with_capacity(references.len()),
        };
        for ((state, expw), dexpw) in references.iter().zip(&gaussian).zip(&dgaussian) {
            let mut gw = expw / norm;
            let mut dgw = (dexpw - gw * dnorm) / norm;
            if !gw.is_finite() || !dgw.is_finite() {
                gw = if state.cn == sp.max_cn { 1.0 } else { 0.0 };
                dgw = 0.0;
            }
            let qref = zeff + state.charge;
            let qmod = zeff + charge;
            let scale = zeta(ga, gc, qref, qmod);
            set.weights.push(gw * scale);
            set.dweights_dcn.push(dgw * scale);
            set.dweights_dq.push(gw * dzeta(ga, gc, qref, qmod));
        }
        set
    }

    fn weight_slot<'w>(&self, weights: &'w ReferenceWeights, atom: usize, partner: usize) -> &'w WeightSet {
        let sets = &weights.sets[atom];
        match self.options.kind {
            ModelKind::D4 => &sets[0],
            ModelKind::D4S => &sets[self.atom_species[partner]],
        }
    }

    /// Computes the C6 coefficient of every atom pair and its derivatives.
    pub fn get_atomic_c6(&self, weights: &ReferenceWeights) -> AtomicC6 {
        let n_atoms = self.atom_species.len();
        let n_species = self.species.len();

        let rows: Vec<(Vec<f64>, Vec<f64>, Vec<f64>)> = (0..n_atoms)
            .into_par_iter()
            .map(|i| {
                let si = self.atom_species[i];
                let mut c6 = vec![0.0; n_atoms];
                let mut dc6_dcn = vec![0.0; n_atoms];
                let mut dc6_dq = vec![0.0; n_atoms];
                for j in 0..n_atoms {
                    let sj = self.atom_species[j];
                    let reference = &self.c6_reference[si * n_species + sj];
                    let w_i = self.weight_slot(weights, i, j);
                    let w_j = self.weight_slot(weights, j, i);
                    let n_ref_j = w_j.weights.len();

                    let (mut value, mut dcn, mut dq) = (0.0, 0.0, 0.0);
                    for k in 0..w_i.weights.len() {
                        let partner: f64 = (0..n_ref_j)
                            .map(|l| w_j.weights[l] * reference[k * n_ref_j + l])
                            .sum();
                        value += w_i.weights[k] * partner;
                        dcn += w_i.dweights_dcn[k] * partner;
                        dq += w_i.dweights_dq[k] * partner;
                    }
                    c6[j] = value;
                    dc6_dcn[j] = dcn;
                    dc6_dq[j] = dq;
                }
                (c6, dc6_dcn, dc6_dq)
            })
            .collect();

        let mut result = AtomicC6 {
            c6: Vec::with_capacity(n_atoms),
            dc6_dcn: Vec::with_capacity(n_atoms),
            dc6_dq: Vec::with_capacity(n_atoms),
        };
        for (c6, dcn, dq) in rows {
            result.c6.push(c6);
            result.dc6_dcn.push(dcn);
            result.dc6_dq.push(dq);
        }
        result
    }

    /// Static polarizability of every atom in Bohr³.
    ///
    /// For D4S the weights of an atom paired with its own element are used.
    pub fn get_polarizabilities(&self, weights: &ReferenceWeights) -> Vec<f64> {
        (0..self.atom_species.len())
            .map(|i| {
                self.weight_slot(weights, i, i)
                    .weights
                    .iter()
                    .zip(&self.alpha[self.atom_species[i]])
                    .map(|(w, alpha)| w * alpha[0])
                    .sum()
            })
            .collect()
    }
}
