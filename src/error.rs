use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all fallible operations in the `dftd4` library.
///
/// Errors fall into four groups: input validation (shape and dimension problems
/// caught before any computation starts), geometry (physically implausible
/// structures), parameter (damping or model configuration) and numerical
/// (failures of the charge equilibration linear solve). Every error is local to
/// the call that raised it; no shared state is left modified.
#[derive(Error, Debug)]
pub enum DispersionError {
    /// The input contained no atoms. At least one atom is required.
    #[error("Input validation failed: at least one atom is required for a calculation")]
    NoAtoms,

    /// Two input arrays that must describe the same atoms disagree in length.
    #[error("Dimension missmatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which input was rejected (e.g. "positions").
        what: &'static str,
        /// The length implied by the atomic numbers.
        expected: usize,
        /// The length actually supplied.
        found: usize,
    },

    /// A flat coordinate array whose length is not a multiple of three.
    #[error("Expected tripels of cartesian coordinates, got an array of length {0}")]
    ExpectedTriples(usize),

    /// The lattice is not a finite, non-singular 3x3 matrix.
    #[error("Invalid lattice provided: {0}")]
    InvalidLattice(String),

    /// An atomic number outside of the periodic table (1..=118).
    #[error("Invalid atomic number {0}: expected a value between 1 and 118")]
    InvalidAtomicNumber(u8),

    /// A Cartesian coordinate is NaN or infinite.
    #[error("Non-finite coordinate found for atom {0}")]
    NonFinitePosition(usize),

    /// Two atoms, or an atom and a periodic image, lie closer than the minimum
    /// interatomic distance.
    ///
    /// This is a fatal input error: such a geometry describes nuclear fusion
    /// rather than a molecule.
    #[error(
        "Too close interatomic distances found: atoms {first} and {second} are {distance:.3e} Bohr apart"
    )]
    TooCloseAtoms {
        /// Index of the first atom of the offending pair.
        first: usize,
        /// Index of the second atom of the offending pair.
        second: usize,
        /// The minimum-image distance in Bohr.
        distance: f64,
    },

    /// A damping parameter required for explicit construction was not supplied.
    #[error("Missing required damping parameter '{0}'")]
    MissingArgument(&'static str),

    /// The requested damping method is not part of the parameter table.
    #[error("Unknown damping method '{0}'")]
    UnknownMethod(String),

    /// The requested dispersion model variant does not exist.
    #[error("Unknown dispersion model '{0}'")]
    UnknownModel(String),

    /// Indicates that the reference data for a specific element, identified by
    /// its atomic number, could not be found in the provided `Parameters` set.
    #[error("Reference data not found for element with atomic number: {0}")]
    ParameterNotFound(u8),

    /// A failure within the dense linear solve of the charge equilibration
    /// system, for example if the matrix is singular.
    #[error("Failed to solve the linear matrix system: {0}")]
    LinalgError(String),

    /// An I/O error that occurred while attempting to read a reference data file.
    #[error("I/O error at path '{path}': {source}")]
    IoError {
        /// The path of the file that caused the I/O error.
        path: PathBuf,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// An error that occurred while parsing a reference data file, typically
    /// invalid TOML or a structural mismatch with the expected format.
    #[error("Failed to deserialize TOML parameters: {0}")]
    DeserializationError(#[from] toml::de::Error),
}
