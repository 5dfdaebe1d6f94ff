//! D4 and D4S London dispersion corrections for molecules and crystals.
//!
//! The crate computes coordination numbers, electronegativity-equilibration
//! charges, atom-in-molecule polarizabilities and C6 coefficients, and from them
//! the rationally damped two-body and the Axilrod–Teller–Muto three-body
//! dispersion energy, with analytic nuclear gradients and, for periodic systems,
//! the virial and the lattice gradient. All quantities are in atomic units
//! (Bohr, Hartree).
//!
//! # Examples
//!
//! ```
//! use dftd4::{DampingParam, DispersionModel, Structure, get_default_parameters};
//!
//! let structure = Structure::from_flat(
//!     &[6, 8],
//!     &[0.0, 0.0, 0.0, 0.0, 0.0, 2.13],
//!     None,
//! )
//! .unwrap();
//! let model = DispersionModel::new(structure, get_default_parameters()).unwrap();
//! let param = DampingParam::builder().s8(1.2).a1(0.4).a2(5.0).build().unwrap();
//!
//! let result = model.get_dispersion(&param, false).unwrap();
//! assert!(result.energy < 0.0);
//! ```

pub mod charges;
pub mod cutoff;
pub mod damping;
pub mod dispersion;
pub mod error;
pub mod math;
pub mod model;
pub mod ncoord;
pub mod params;
pub mod structure;
pub mod types;

pub use charges::{EeqOptions, EeqSolution, EeqSolver};
pub use cutoff::RealspaceCutoff;
pub use damping::{DampingParam, DampingParamBuilder, Method};
pub use dispersion::DispersionModel;
pub use error::DispersionError;
pub use model::{ModelKind, ModelOptions};
pub use params::Parameters;
pub use structure::Structure;
pub use types::{Atom, AtomView, DispersionResult, PairwiseDispersion, Properties};

use std::sync::OnceLock;

static DEFAULT_PARAMETERS: OnceLock<Parameters> = OnceLock::new();

/// Returns the reference dataset embedded in the crate.
///
/// The dataset is parsed on first use and shared by all later calls.
pub fn get_default_parameters() -> &'static Parameters {
    DEFAULT_PARAMETERS.get_or_init(|| {
        const DEFAULT_PARAMS_TOML: &str = include_str!("../resources/d4.data.toml");
        Parameters::load_from_str(DEFAULT_PARAMS_TOML)
            .expect("Failed to parse embedded default parameters. This is a library bug.")
    })
}
