//! Validated geometry container for molecules and crystals.
//!
//! A `Structure` owns the atomic numbers, Cartesian positions (Bohr), the
//! optional lattice and the total charge of a system. Every constructor and
//! [`Structure::update`] enforce the same invariants, so a `Structure` value is
//! always valid. Apart from the inverse lattice, derived quantities are never
//! cached here; they are recomputed from the current geometry on every
//! calculation.
//!
//! Positions of a crystal are stored as given and may lie outside the home
//! cell. Every pair interaction starts from [`Structure::pair_vector`], which
//! reduces the separation into the central cell before images are summed.

use crate::cutoff::lattice_points;
use crate::error::DispersionError;
use crate::math::constants::MIN_INTERATOMIC_DISTANCE;
use crate::math::linalg::{Mat3, Vec3, determinant, inverse, norm_sq, sub, wrap_to_cell};
use crate::types::AtomView;

/// Highest atomic number accepted by the structure.
const MAX_ATOMIC_NUMBER: u8 = 118;

/// An ordered set of atoms with an optional 3D periodic lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    numbers: Vec<u8>,
    positions: Vec<Vec3>,
    lattice: Option<Mat3>,
    inverse_lattice: Option<Mat3>,
    charge: f64,
}

impl Structure {
    /// Creates a structure from atomic numbers, positions and an optional lattice.
    ///
    /// The lattice is given row-wise, `lattice[k]` being the k-th lattice vector.
    ///
    /// # Errors
    ///
    /// * `NoAtoms` for empty input.
    /// * `DimensionMismatch` if the number of positions differs from the number of atoms.
    /// * `InvalidAtomicNumber` / `NonFinitePosition` / `InvalidLattice` for malformed values.
    /// * `TooCloseAtoms` if two atoms (or an atom and a periodic image) overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use dftd4::Structure;
    ///
    /// let water = Structure::new(
    ///     vec![8, 1, 1],
    ///     vec![[0.0, 0.0, 0.0], [1.43, 1.11, 0.0], [-1.43, 1.11, 0.0]],
    ///     None,
    /// )
    /// .unwrap();
    /// assert_eq!(water.len(), 3);
    /// assert!(!water.is_periodic());
    /// ```
    pub fn new(
        numbers: Vec<u8>,
        positions: Vec<Vec3>,
        lattice: Option<Mat3>,
    ) -> Result<Self, DispersionError> {
        validate_numbers(&numbers)?;
        if positions.len() != numbers.len() {
            return Err(DispersionError::DimensionMismatch {
                what: "positions",
                expected: numbers.len(),
                found: positions.len(),
            });
        }
        validate_positions(&positions)?;
        let inverse_lattice = lattice.as_ref().map(validate_lattice).transpose()?;
        let cell = lattice.as_ref().zip(inverse_lattice.as_ref());
        check_interatomic_distances(&positions, cell)?;

        Ok(Self {
            numbers,
            positions,
            lattice,
            inverse_lattice,
            charge: 0.0,
        })
    }

    /// Creates a structure from any atom representation implementing [`AtomView`].
    pub fn from_atoms<A: AtomView>(
        atoms: &[A],
        lattice: Option<Mat3>,
    ) -> Result<Self, DispersionError> {
        let numbers = atoms.iter().map(AtomView::atomic_number).collect();
        let positions = atoms.iter().map(AtomView::position).collect();
        Self::new(numbers, positions, lattice)
    }

    /// Creates a structure from flat arrays, as handed over by array-oriented callers.
    ///
    /// `positions` holds `3·N` Cartesian coordinates and `lattice`, if present,
    /// nine values in row-major order.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`Structure::new`], fails with
    /// `ExpectedTriples` if the coordinate count is not a multiple of three.
    pub fn from_flat(
        numbers: &[u8],
        positions: &[f64],
        lattice: Option<&[f64]>,
    ) -> Result<Self, DispersionError> {
        if positions.len() % 3 != 0 {
            return Err(DispersionError::ExpectedTriples(positions.len()));
        }
        let positions = unflatten_positions(positions);
        let lattice = lattice.map(unflatten_lattice).transpose()?;
        Self::new(numbers.to_vec(), positions, lattice)
    }

    /// Sets the total charge of the system (default: neutral).
    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    /// Replaces the geometry with new positions and, optionally, a new lattice.
    ///
    /// A `None` lattice keeps the current one. The update is atomic: if any
    /// invariant fails, the error is returned and the previous geometry is kept.
    pub fn update(
        &mut self,
        positions: Vec<Vec3>,
        lattice: Option<Mat3>,
    ) -> Result<(), DispersionError> {
        if positions.len() != self.numbers.len() {
            return Err(DispersionError::DimensionMismatch {
                what: "positions",
                expected: self.numbers.len(),
                found: positions.len(),
            });
        }
        validate_positions(&positions)?;
        let (new_lattice, new_inverse) = match lattice {
            Some(lattice) => (Some(lattice), Some(validate_lattice(&lattice)?)),
            None => (self.lattice, self.inverse_lattice),
        };
        let cell = new_lattice.as_ref().zip(new_inverse.as_ref());
        check_interatomic_distances(&positions, cell)?;

        self.positions = positions;
        self.lattice = new_lattice;
        self.inverse_lattice = new_inverse;
        Ok(())
    }

    /// Flat-array counterpart of [`Structure::update`].
    pub fn update_flat(
        &mut self,
        positions: &[f64],
        lattice: Option<&[f64]>,
    ) -> Result<(), DispersionError> {
        if positions.len() != 3 * self.numbers.len() {
            return Err(DispersionError::DimensionMismatch {
                what: "positions",
                expected: 3 * self.numbers.len(),
                found: positions.len(),
            });
        }
        let lattice = lattice.map(unflatten_lattice).transpose()?;
        self.update(unflatten_positions(positions), lattice)
    }

    /// Number of atoms.
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Whether the structure has no atoms.
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn lattice(&self) -> Option<&Mat3> {
        self.lattice.as_ref()
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn is_periodic(&self) -> bool {
        self.lattice.is_some()
    }

    /// Separation `x_i - x_j`, reduced into the central cell for crystals.
    ///
    /// The result differs from the raw difference by a lattice translation, so
    /// sums over all images are unaffected by where the atoms are stored.
    pub fn pair_vector(&self, i: usize, j: usize) -> Vec3 {
        let d = sub(self.positions[i], self.positions[j]);
        match (&self.lattice, &self.inverse_lattice) {
            (Some(lattice), Some(inverse_lattice)) => wrap_to_cell(d, lattice, inverse_lattice),
            _ => d,
        }
    }

    /// Cell volume in Bohr³, `None` for molecules.
    pub fn volume(&self) -> Option<f64> {
        self.lattice.as_ref().map(|lattice| determinant(lattice).abs())
    }
}

fn unflatten_positions(flat: &[f64]) -> Vec<Vec3> {
    flat.chunks_exact(3)
        .map(|chunk| [chunk[0], chunk[1], chunk[2]])
        .collect()
}

fn unflatten_lattice(flat: &[f64]) -> Result<Mat3, DispersionError> {
    if flat.len() != 9 {
        return Err(DispersionError::InvalidLattice(format!(
            "expected 9 values, got {}",
            flat.len()
        )));
    }
    Ok(std::array::from_fn(|row| {
        std::array::from_fn(|col| flat[3 * row + col])
    }))
}

fn validate_numbers(numbers: &[u8]) -> Result<(), DispersionError> {
    if numbers.is_empty() {
        return Err(DispersionError::NoAtoms);
    }
    match numbers
        .iter()
        .find(|&&z| z == 0 || z > MAX_ATOMIC_NUMBER)
    {
        Some(&z) => Err(DispersionError::InvalidAtomicNumber(z)),
        None => Ok(()),
    }
}

fn validate_positions(positions: &[Vec3]) -> Result<(), DispersionError> {
    match positions
        .iter()
        .position(|xyz| xyz.iter().any(|value| !value.is_finite()))
    {
        Some(index) => Err(DispersionError::NonFinitePosition(index)),
        None => Ok(()),
    }
}

/// Checks the lattice and returns its inverse.
fn validate_lattice(lattice: &Mat3) -> Result<Mat3, DispersionError> {
    if lattice.iter().flatten().any(|value| !value.is_finite()) {
        return Err(DispersionError::InvalidLattice(
            "lattice contains non-finite values".to_string(),
        ));
    }
    inverse(lattice).ok_or_else(|| {
        DispersionError::InvalidLattice("lattice vectors are linearly dependent".to_string())
    })
}

/// Rejects geometries with two atoms, or an atom and any periodic image,
/// closer than [`MIN_INTERATOMIC_DISTANCE`].
///
/// For crystals every separation is first reduced into the central cell; the
/// nearest image is then among the neighbouring translations of that vector.
fn check_interatomic_distances(
    positions: &[Vec3],
    cell: Option<(&Mat3, &Mat3)>,
) -> Result<(), DispersionError> {
    let translations = lattice_points(cell.map(|(lattice, _)| lattice), MIN_INTERATOMIC_DISTANCE);
    let threshold_sq = MIN_INTERATOMIC_DISTANCE * MIN_INTERATOMIC_DISTANCE;

    for (i, &xyz_i) in positions.iter().enumerate() {
        for (j, &xyz_j) in positions.iter().enumerate().take(i + 1) {
            let d = sub(xyz_i, xyz_j);
            let base = match cell {
                Some((lattice, inverse_lattice)) => wrap_to_cell(d, lattice, inverse_lattice),
                None => d,
            };
            for trans in &translations {
                if i == j && norm_sq(*trans) == 0.0 {
                    continue;
                }
                let r2 = norm_sq(sub(base, *trans));
                if r2 < threshold_sq {
                    return Err(DispersionError::TooCloseAtoms {
                        first: j,
                        second: i,
                        distance: r2.sqrt(),
                    });
                }
            }
        }
    }
    Ok(())
}
