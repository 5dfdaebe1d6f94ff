//! This module implements the `EeqSolver` for electronegativity equilibration charges.
//!
//! The charges minimise a second-order energy expression in which every atom carries a
//! Gaussian charge density, subject to the constraint that they sum to the total charge
//! of the system. This is a single linear system of size `N + 1`: the atomic block holds
//! the hardness on the diagonal and the screened Coulomb kernel off the diagonal, the
//! last row and column hold the Lagrange multiplier of the constraint. For periodic
//! systems the kernel is lattice summed with an Ewald decomposition.
//!
//! The response of the charges to the geometry is never formed explicitly. Instead, the
//! derivative of a charge-dependent energy is obtained from one additional solve with the
//! same matrix (an adjoint solve), which keeps the cost independent of the number of
//! nuclear degrees of freedom.

use super::ewald::EwaldSum;
use super::options::EeqOptions;
use crate::{
    error::DispersionError,
    math::constants::CN_REGULARIZATION,
    math::linalg::{Mat3, Vec3, add_mat, add_outer, norm_sq, scale},
    math::shielding::{self, screened_potential, screened_potential_derivative},
    ncoord::{CoordinationNumber, counting_radius},
    params::{EeqData, Parameters},
    structure::Structure,
};
use faer::{Col, Mat, prelude::*};
use log::{debug, trace};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

/// A thread-safe wrapper for raw matrix access to enable parallel filling.
///
/// Multiple threads write to disjoint parts of the matrix without locking; the
/// parallel iterator guarantees that every element has exactly one writer.
struct UnsafeMatView {
    ptr: *mut f64,
    row_stride: isize,
    col_stride: isize,
}

unsafe impl Send for UnsafeMatView {}
unsafe impl Sync for UnsafeMatView {}

impl UnsafeMatView {
    /// Writes a value to the matrix at the specified (row, col) index.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the indices are in bounds and that no other
    /// thread writes to the same element simultaneously.
    unsafe fn write(&self, row: usize, col: usize, val: f64) {
        let offset = (row as isize) * self.row_stride + (col as isize) * self.col_stride;
        unsafe {
            *self.ptr.offset(offset) = val;
        }
    }
}

/// Per-atom data of the charge model.
#[derive(Debug, Clone, Copy)]
struct EeqSite {
    eeq: EeqData,
    radius: f64,
}

impl EeqSite {
    fn pair_gamma(&self, other: &EeqSite) -> f64 {
        shielding::effective_gamma(
            shielding::gaussian_exponent(self.eeq.rad),
            shielding::gaussian_exponent(other.eeq.rad),
        )
    }
}

/// Charges of one geometry together with the data needed for their response.
#[derive(Debug, Clone)]
pub struct EeqSolution {
    /// Partial charge of every atom.
    pub charges: Vec<f64>,
    /// Capped coordination numbers that shifted the electronegativities.
    pub coordination_numbers: Vec<f64>,
    /// Lagrange multiplier of the total-charge constraint.
    pub chemical_potential: f64,
    matrix: Mat<f64>,
}

/// Solver for electronegativity equilibration charges.
pub struct EeqSolver<'p> {
    parameters: &'p Parameters,
    options: EeqOptions,
}

impl<'p> EeqSolver<'p> {
    /// Creates a new `EeqSolver` with default options.
    ///
    /// # Examples
    ///
    /// ```
    /// use dftd4::{EeqSolver, Structure, get_default_parameters};
    ///
    /// let water = Structure::new(
    ///     vec![8, 1, 1],
    ///     vec![[0.0, 0.0, -0.12], [0.0, 1.43, 0.98], [0.0, -1.43, 0.98]],
    ///     None,
    /// )
    /// .unwrap();
    ///
    /// let solution = EeqSolver::new(get_default_parameters()).solve(&water).unwrap();
    /// assert!(solution.charges[0] < 0.0);
    /// assert!(solution.charges.iter().sum::<f64>().abs() < 1e-7);
    /// ```
    pub fn new(parameters: &'p Parameters) -> Self {
        Self {
            parameters,
            options: EeqOptions::default(),
        }
    }

    /// Configures the solver with custom options.
    pub fn with_options(mut self, options: EeqOptions) -> Self {
        self.options = options;
        self
    }

    /// Solves for the partial charges of a structure.
    ///
    /// # Errors
    ///
    /// Returns `ParameterNotFound` for elements missing from the dataset and
    /// `LinalgError` if the linear system cannot be solved.
    pub fn solve(&self, structure: &Structure) -> Result<EeqSolution, DispersionError> {
        let sites = self.fetch_sites(structure)?;
        let n_atoms = sites.len();

        let coordination_numbers = self.coordination_number().compute(
            structure,
            &radii(&sites),
            &vec![0.0; n_atoms],
        );

        let matrix = self.build_matrix(structure, &sites);

        let mut rhs = Col::zeros(n_atoms + 1);
        for (i, (site, &cn)) in sites.iter().zip(&coordination_numbers).enumerate() {
            let tmp = site.eeq.kcn / (cn + CN_REGULARIZATION).sqrt();
            rhs[i] = -site.eeq.chi + tmp * cn;
        }
        rhs[n_atoms] = structure.charge();

        let solution = solve_system(&matrix, &rhs)?;
        let charges: Vec<f64> = (0..n_atoms).map(|i| solution[i]).collect();
        let chemical_potential = solution[n_atoms];

        debug!(
            "EEQ charges for {} atoms: sum = {:.3e}, chemical potential = {:.6}",
            n_atoms,
            charges.iter().sum::<f64>(),
            chemical_potential
        );

        Ok(EeqSolution {
            charges,
            coordination_numbers,
            chemical_potential,
            matrix,
        })
    }

    /// Adds the derivative of a charge-dependent energy to a gradient and a
    /// strain derivative.
    ///
    /// `dedq` is the partial derivative of the energy with respect to every
    /// charge. The response of the charges to the geometry is folded in with a
    /// single adjoint solve.
    pub fn add_charge_derivatives(
        &self,
        structure: &Structure,
        solution: &EeqSolution,
        dedq: &[f64],
        gradient: &mut [Vec3],
        sigma: &mut Mat3,
    ) -> Result<(), DispersionError> {
        let sites = self.fetch_sites(structure)?;
        let n_atoms = sites.len();

        let mut rhs = Col::zeros(n_atoms + 1);
        for (i, &value) in dedq.iter().enumerate() {
            rhs[i] = value;
        }
        let adjoint = solve_system(&solution.matrix, &rhs)?;
        let adjoint: Vec<f64> = (0..n_atoms).map(|i| adjoint[i]).collect();

        // Electronegativity term, vᵀ ∂b/∂x, through the coordination numbers.
        let dedcn: Vec<f64> = sites
            .iter()
            .zip(&solution.coordination_numbers)
            .zip(&adjoint)
            .map(|((site, &cn), &v)| {
                let reg = cn + CN_REGULARIZATION;
                v * site.eeq.kcn * (0.5 * cn + CN_REGULARIZATION) / (reg * reg.sqrt())
            })
            .collect();
        self.coordination_number().add_derivatives(
            structure,
            &radii(&sites),
            &vec![0.0; n_atoms],
            &dedcn,
            gradient,
            sigma,
        );

        // Coulomb term, -vᵀ (∂A/∂x) q.
        let charges = &solution.charges;
        let ewald = structure
            .lattice()
            .map(|lattice| EwaldSum::new(lattice, self.options.ewald_tolerance, min_gamma(&sites)));

        let per_atom: Vec<(Vec3, Mat3)> = (0..n_atoms)
            .into_par_iter()
            .map(|k| {
                let mut grad_k = [0.0; 3];
                let mut sigma_k = [[0.0; 3]; 3];
                for j in 0..n_atoms {
                    let coeff = adjoint[k] * charges[j] + adjoint[j] * charges[k];
                    let gamma = sites[k].pair_gamma(&sites[j]);
                    let d = structure.pair_vector(k, j);
                    match &ewald {
                        Some(ewald) => {
                            let mut scratch = [0.0; 3];
                            let target = if j == k { &mut scratch } else { &mut grad_k };
                            ewald.add_derivatives(d, gamma, coeff, target, &mut sigma_k);
                        }
                        None if j != k => {
                            let r = norm_sq(d).sqrt();
                            let dphi = screened_potential_derivative(r, gamma);
                            let unit = scale(d, 1.0 / r);
                            for (g, u) in grad_k.iter_mut().zip(unit) {
                                *g += coeff * dphi * u;
                            }
                            add_outer(&mut sigma_k, unit, d, coeff * dphi);
                        }
                        None => {}
                    }
                }
                (grad_k, sigma_k)
            })
            .collect();

        let mut coulomb_sigma = [[0.0; 3]; 3];
        for (g, (grad_k, sigma_k)) in gradient.iter_mut().zip(&per_atom) {
            for (value, delta) in g.iter_mut().zip(grad_k) {
                *value -= delta;
            }
            add_mat(&mut coulomb_sigma, sigma_k);
        }
        // Ordered pairs were visited from both ends.
        for (row, coulomb_row) in sigma.iter_mut().zip(&coulomb_sigma) {
            for (value, delta) in row.iter_mut().zip(coulomb_row) {
                *value -= 0.5 * delta;
            }
        }

        Ok(())
    }

    fn coordination_number(&self) -> CoordinationNumber {
        CoordinationNumber::charge_model(self.options.cn_cutoff, self.options.cn_max)
    }

    fn fetch_sites(&self, structure: &Structure) -> Result<Vec<EeqSite>, DispersionError> {
        structure
            .numbers()
            .iter()
            .map(|&z| {
                self.parameters.element(z).map(|data| EeqSite {
                    eeq: data.eeq,
                    radius: counting_radius(data.covalent_radius),
                })
            })
            .collect()
    }

    /// Builds the `(N+1)×(N+1)` matrix of the constrained linear system.
    fn build_matrix(&self, structure: &Structure, sites: &[EeqSite]) -> Mat<f64> {
        let n_atoms = sites.len();
        let matrix_size = n_atoms + 1;

        let mut matrix = Mat::zeros(matrix_size, matrix_size);

        let ewald = structure
            .lattice()
            .map(|lattice| EwaldSum::new(lattice, self.options.ewald_tolerance, min_gamma(sites)));
        trace!(
            "building EEQ matrix of size {} ({})",
            matrix_size,
            if ewald.is_some() { "Ewald" } else { "molecular" }
        );

        let mat_view = UnsafeMatView {
            ptr: matrix.as_ptr_mut(),
            row_stride: matrix.row_stride(),
            col_stride: matrix.col_stride(),
        };

        (0..n_atoms).into_par_iter().for_each(|i| {
            let site_i = &sites[i];
            let mut diagonal = site_i.eeq.gam + shielding::self_interaction(site_i.eeq.rad);
            if let Some(ewald) = &ewald {
                diagonal += ewald.interaction([0.0; 3], site_i.pair_gamma(site_i))
                    + ewald.self_term();
            }

            // SAFETY: Row i is written only by the thread handling i. Every element
            // (i, j) with j > i and its mirror (j, i) are written only by thread i.
            unsafe {
                mat_view.write(i, i, diagonal);
            }

            for j in (i + 1)..n_atoms {
                let gamma = site_i.pair_gamma(&sites[j]);
                let d = structure.pair_vector(i, j);
                let value = match &ewald {
                    Some(ewald) => ewald.interaction(d, gamma),
                    None => screened_potential(norm_sq(d).sqrt(), gamma),
                };
                unsafe {
                    mat_view.write(i, j, value);
                    mat_view.write(j, i, value);
                }
            }
        });

        matrix
            .col_mut(matrix_size - 1)
            .subrows_mut(0, n_atoms)
            .fill(1.0);
        matrix
            .row_mut(matrix_size - 1)
            .subcols_mut(0, n_atoms)
            .fill(1.0);

        matrix
    }
}

fn radii(sites: &[EeqSite]) -> Vec<f64> {
    sites.iter().map(|site| site.radius).collect()
}

fn min_gamma(sites: &[EeqSite]) -> f64 {
    let max_rad = sites
        .iter()
        .map(|site| site.eeq.rad)
        .fold(0.0, f64::max);
    1.0 / (2.0 * max_rad * max_rad).sqrt()
}

/// Solves the dense system with a partially pivoted LU decomposition.
fn solve_system(matrix: &Mat<f64>, rhs: &Col<f64>) -> Result<Col<f64>, DispersionError> {
    let solve_result = panic::catch_unwind(AssertUnwindSafe(|| matrix.partial_piv_lu().solve(rhs)));

    let solution = match solve_result {
        Ok(sol) => sol,
        Err(_) => {
            return Err(DispersionError::LinalgError(
                "Linear system solver panicked. Matrix might be singular.".to_string(),
            ));
        }
    };

    if solution.as_ref().iter().any(|value: &f64| !value.is_finite()) {
        return Err(DispersionError::LinalgError(
            "Non-finite charges obtained. Matrix is singular.".to_string(),
        ));
    }

    Ok(solution)
}
