//! This module defines the configuration of the dispersion model.
//!
//! It provides the `ModelKind` enum selecting between the D4 and D4S reference
//! weighting schemes, and the `ModelOptions` struct bundling the charge-scaling
//! constants, the weighting factor, the real-space cutoffs and the options of the
//! charge model.

use crate::charges::EeqOptions;
use crate::cutoff::RealspaceCutoff;
use crate::error::DispersionError;
use std::fmt;
use std::str::FromStr;

/// Variant of the reference weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    /// One set of reference weights per atom.
    #[default]
    D4,
    /// Pair-resolved reference weights with element-specific smoothness.
    D4S,
}

impl FromStr for ModelKind {
    type Err = DispersionError;

    /// Parses a model name, ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// use dftd4::ModelKind;
    ///
    /// assert_eq!("d4s".parse::<ModelKind>().unwrap(), ModelKind::D4S);
    /// assert!("D42".parse::<ModelKind>().is_err());
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "d4" => Ok(ModelKind::D4),
            "d4s" => Ok(ModelKind::D4S),
            _ => Err(DispersionError::UnknownModel(name.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::D4 => write!(f, "D4"),
            ModelKind::D4S => write!(f, "D4S"),
        }
    }
}

/// Configuration parameters of the dispersion model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    /// Reference weighting scheme.
    pub kind: ModelKind,
    /// Height of the charge-scaling function.
    pub ga: f64,
    /// Steepness of the charge-scaling function, in units of the chemical hardness.
    pub gc: f64,
    /// Exponent of the Gaussian coordination-number weighting.
    ///
    /// For D4S this is the fallback for elements without a tabulated steepness.
    pub wf: f64,
    /// Real-space cutoffs of the coordination number and the dispersion sums.
    pub cutoff: RealspaceCutoff,
    /// Options of the charge model.
    pub eeq: EeqOptions,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            kind: ModelKind::D4,
            ga: 3.0,
            gc: 2.0,
            wf: 6.0,
            cutoff: RealspaceCutoff::default(),
            eeq: EeqOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names_are_parsed_case_insensitively() {
        assert_eq!("D4".parse::<ModelKind>().unwrap(), ModelKind::D4);
        assert_eq!("d4".parse::<ModelKind>().unwrap(), ModelKind::D4);
        assert_eq!("D4S".parse::<ModelKind>().unwrap(), ModelKind::D4S);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let error = "D42".parse::<ModelKind>().unwrap_err();
        assert!(matches!(&error, DispersionError::UnknownModel(name) if name == "D42"));
        assert!(error.to_string().contains("Unknown dispersion model"));
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [ModelKind::D4, ModelKind::D4S] {
            assert_eq!(kind.to_string().parse::<ModelKind>().unwrap(), kind);
        }
    }
}
