//! This module implements the `DispersionModel`, the entry point of every calculation.
//!
//! A model owns one validated [`Structure`] together with the reference data of its
//! elements. Each calculation runs the full pipeline on an immutable snapshot of the
//! structure: coordination numbers, EEQ charges, reference weights and C6 coefficients,
//! and finally the damped two- and three-body energies. Gradients are assembled by
//! chaining the explicit geometric derivatives of the energy terms with the derivatives
//! of the coordination numbers and the charges.

use crate::charges::{EeqSolution, EeqSolver};
use crate::damping::{DampingParam, RationalDamping};
use crate::error::DispersionError;
use crate::math::linalg::{Mat3, Vec3, add_mat, inverse, matmul, transpose};
use crate::model::{AtomicC6, D4Model, ModelOptions};
use crate::ncoord::CoordinationNumber;
use crate::params::Parameters;
use crate::structure::Structure;
use crate::types::{DispersionResult, PairwiseDispersion, Properties};
use log::{debug, trace};

/// Quantities shared by every calculation on the current geometry.
struct Environment {
    coordination_numbers: Vec<f64>,
    charges: EeqSolution,
    c6: AtomicC6,
}

/// The D4/D4S dispersion model of one structure.
///
/// # Examples
///
/// ```
/// use dftd4::{DampingParam, DispersionModel, Method, Structure, get_default_parameters};
///
/// let structure = Structure::new(
///     vec![8, 1, 1],
///     vec![[0.0, 0.0, 0.0], [1.43, 1.1, 0.0], [-1.43, 1.1, 0.0]],
///     None,
/// )
/// .unwrap();
/// let model = DispersionModel::new(structure, get_default_parameters()).unwrap();
/// let param = DampingParam::from_method(Method::Pbe);
///
/// let result = model.get_dispersion(&param, true).unwrap();
/// assert!(result.energy < 0.0);
/// assert_eq!(result.gradient.unwrap().len(), 3);
/// assert!(result.virial.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct DispersionModel<'p> {
    structure: Structure,
    parameters: &'p Parameters,
    model: D4Model<'p>,
}

impl<'p> DispersionModel<'p> {
    /// Creates a D4 model with default options.
    ///
    /// # Errors
    ///
    /// Returns `ParameterNotFound` if an element of the structure is missing
    /// from `parameters`.
    pub fn new(structure: Structure, parameters: &'p Parameters) -> Result<Self, DispersionError> {
        Self::with_options(structure, parameters, ModelOptions::default())
    }

    /// Creates a model with explicit options, e.g. to select D4S.
    pub fn with_options(
        structure: Structure,
        parameters: &'p Parameters,
        options: ModelOptions,
    ) -> Result<Self, DispersionError> {
        let model = D4Model::new(structure.numbers(), parameters, options)?;
        debug!(
            "{} dispersion model for {} atoms ({})",
            options.kind,
            structure.len(),
            if structure.is_periodic() { "periodic" } else { "molecular" }
        );
        Ok(Self {
            structure,
            parameters,
            model,
        })
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn options(&self) -> &ModelOptions {
        self.model.options()
    }

    /// Replaces the geometry of the owned structure.
    ///
    /// See [`Structure::update`]; on error the previous geometry is kept.
    pub fn update(
        &mut self,
        positions: Vec<Vec3>,
        lattice: Option<Mat3>,
    ) -> Result<(), DispersionError> {
        self.structure.update(positions, lattice)
    }

    /// Computes the dispersion energy and, if `grad` is set, its derivatives.
    ///
    /// For periodic structures the strain derivative (virial) and the lattice
    /// gradient are returned along with the nuclear gradient.
    ///
    /// # Errors
    ///
    /// Returns `LinalgError` if the charge model cannot be solved.
    pub fn get_dispersion(
        &self,
        param: &DampingParam,
        grad: bool,
    ) -> Result<DispersionResult, DispersionError> {
        let structure = &self.structure;
        let cutoff = self.options().cutoff;
        let env = self.environment()?;
        let r4r2 = self.model.r4r2();
        let damping = RationalDamping::new(*param, &r4r2);

        let pair = damping.dispersion2(structure, cutoff.disp2, &env.c6, grad);
        let neutral_c6 = self.neutral_c6(param, &env.coordination_numbers);
        let triple = damping.dispersion3(structure, cutoff.disp3, &neutral_c6, grad);
        let energy = pair.energy + triple.energy;
        debug!(
            "Dispersion energy: two-body = {:.10}, three-body = {:.10}",
            pair.energy, triple.energy
        );

        let (Some(pair), Some(triple)) = (pair.derivatives, triple.derivatives) else {
            return Ok(DispersionResult {
                energy,
                gradient: None,
                virial: None,
                lattice_gradient: None,
            });
        };

        let mut gradient = pair.gradient;
        for (g, delta) in gradient.iter_mut().zip(&triple.gradient) {
            for d in 0..3 {
                g[d] += delta[d];
            }
        }
        let mut sigma = pair.sigma;
        add_mat(&mut sigma, &triple.sigma);
        let dedcn: Vec<f64> = pair.dedcn.iter().zip(&triple.dedcn).map(|(a, b)| a + b).collect();

        CoordinationNumber::dispersion(cutoff.cn).add_derivatives(
            structure,
            &self.model.counting_radii(),
            &self.model.electronegativities(),
            &dedcn,
            &mut gradient,
            &mut sigma,
        );
        self.eeq_solver().add_charge_derivatives(
            structure,
            &env.charges,
            &pair.dedq,
            &mut gradient,
            &mut sigma,
        )?;

        let (virial, lattice_gradient) = match structure.lattice() {
            Some(lattice) => {
                let inv = inverse(lattice).ok_or_else(|| {
                    DispersionError::InvalidLattice("lattice is singular".to_string())
                })?;
                (Some(sigma), Some(matmul(&transpose(&inv), &sigma)))
            }
            None => (None, None),
        };

        Ok(DispersionResult {
            energy,
            gradient: Some(gradient),
            virial,
            lattice_gradient,
        })
    }

    /// Decomposes the dispersion energy into pair contributions.
    pub fn get_pairwise_dispersion(
        &self,
        param: &DampingParam,
    ) -> Result<PairwiseDispersion, DispersionError> {
        let structure = &self.structure;
        let cutoff = self.options().cutoff;
        let env = self.environment()?;
        let r4r2 = self.model.r4r2();
        let damping = RationalDamping::new(*param, &r4r2);

        let additive = damping.pairwise_dispersion2(structure, cutoff.disp2, &env.c6.c6);
        let neutral_c6 = self.neutral_c6(param, &env.coordination_numbers);
        let non_additive = damping.pairwise_dispersion3(structure, cutoff.disp3, &neutral_c6.c6);
        Ok(PairwiseDispersion {
            additive,
            non_additive,
        })
    }

    /// Returns the damping-independent intermediates of the model.
    pub fn get_properties(&self) -> Result<Properties, DispersionError> {
        let coordination_numbers = self.coordination_numbers();
        let charges = self.eeq_solver().solve(&self.structure)?;
        let weights = self
            .model
            .weight_references(&coordination_numbers, &charges.charges);
        Ok(Properties {
            polarizabilities: self.model.get_polarizabilities(&weights),
            c6_coefficients: self.model.get_atomic_c6(&weights).c6,
            coordination_numbers,
            partial_charges: charges.charges,
        })
    }

    fn eeq_solver(&self) -> EeqSolver<'p> {
        EeqSolver::new(self.parameters).with_options(self.options().eeq)
    }

    fn coordination_numbers(&self) -> Vec<f64> {
        let cn = CoordinationNumber::dispersion(self.options().cutoff.cn).compute(
            &self.structure,
            &self.model.counting_radii(),
            &self.model.electronegativities(),
        );
        trace!("Coordination numbers: {:?}", cn);
        cn
    }

    fn environment(&self) -> Result<Environment, DispersionError> {
        let coordination_numbers = self.coordination_numbers();
        let charges = self.eeq_solver().solve(&self.structure)?;
        let weights = self
            .model
            .weight_references(&coordination_numbers, &charges.charges);
        let c6 = self.model.get_atomic_c6(&weights);
        Ok(Environment {
            coordination_numbers,
            charges,
            c6,
        })
    }

    /// C6 coefficients at zero partial charges for the three-body term.
    ///
    /// Skipped (all zero) when the three-body term is disabled.
    fn neutral_c6(&self, param: &DampingParam, coordination_numbers: &[f64]) -> AtomicC6 {
        let n_atoms = self.structure.len();
        if param.s9 == 0.0 {
            return AtomicC6 {
                c6: vec![vec![0.0; n_atoms]; n_atoms],
                dc6_dcn: vec![vec![0.0; n_atoms]; n_atoms],
                dc6_dq: vec![vec![0.0; n_atoms]; n_atoms],
            };
        }
        let weights = self
            .model
            .weight_references(coordination_numbers, &vec![0.0; n_atoms]);
        self.model.get_atomic_c6(&weights)
    }
}
