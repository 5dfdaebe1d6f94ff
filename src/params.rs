//! This module provides the reference dataset of the D4 model and utilities for loading it from TOML.
//!
//! The dataset holds, per element, everything the engine needs that is not a
//! function of geometry: radii and electronegativities for the coordination
//! number, the electronegativity equilibration parameters, the charge-scaling
//! hardness, the `<r⁴>/<r²>` factor for higher multipoles and a set of
//! reference states with their dynamic polarizabilities. A second table holds
//! the secondary systems whose share is removed from the reference molecules.
//! Elements may be keyed by atomic number or by symbol.

use super::error::DispersionError;
use crate::model::reference::N_FREQ;
use serde::Deserialize;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// Electronegativity equilibration parameters of one element, in atomic units.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EeqData {
    /// Electronegativity.
    pub chi: f64,
    /// Chemical hardness.
    pub gam: f64,
    /// Coordination-number dependence of the electronegativity.
    pub kcn: f64,
    /// Width of the Gaussian charge density in Bohr.
    pub rad: f64,
}

/// A tabulated chemical environment of an element.
///
/// The dynamic polarizability is tabulated on the imaginary frequency grid of
/// the model for a whole reference molecule. The part belonging to the
/// `hcount` secondary atoms of the molecule is removed when the model is
/// constructed, leaving the polarizability of the element itself.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ReferenceState {
    /// Coordination number of the reference environment.
    pub cn: f64,
    /// Coordination class used to count references of the same coordination.
    ///
    /// References without a class are grouped by their exact `cn`.
    #[serde(default)]
    pub cn_class: Option<f64>,
    /// Partial charge of the reference environment.
    #[serde(default)]
    pub charge: f64,
    /// Dynamic polarizability `α(iω)` of the reference molecule in Bohr³.
    pub alpha: Vec<f64>,
    /// Scaling of the polarizability after the secondary part is removed.
    #[serde(default = "unit_scale")]
    pub ascale: f64,
    /// Number of secondary atoms in the reference molecule.
    #[serde(default)]
    pub hcount: f64,
    /// Element of the secondary atoms, required if `hcount` is not zero.
    #[serde(default, deserialize_with = "deserialize_optional_element")]
    pub secondary: Option<u8>,
    /// Partial charge of one secondary atom in the reference molecule.
    #[serde(default)]
    pub secondary_charge: f64,
}

fn unit_scale() -> f64 {
    1.0
}

/// Polarizability of a secondary system, the building block removed from
/// reference molecules.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SecondaryData {
    /// Share of the tabulated polarizability attributed to one secondary atom.
    pub sscale: f64,
    /// Dynamic polarizability `α(iω)` in Bohr³.
    pub alpha: Vec<f64>,
}

/// Reference data for one element.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Effective nuclear charge used by the charge-scaling function.
    #[serde(rename = "zeff")]
    pub effective_charge: f64,
    /// Chemical hardness entering the charge-scaling function.
    pub hardness: f64,
    /// Square root of the `<r⁴>/<r²>` expectation value ratio, scaled by `sqrt(Z)`.
    pub r4r2: f64,
    /// Covalent radius in angstroms.
    #[serde(rename = "rcov")]
    pub covalent_radius: f64,
    /// Pauling electronegativity.
    #[serde(rename = "en")]
    pub electronegativity: f64,
    /// Steepness of the smooth (D4S) reference weighting.
    ///
    /// Elements without a value fall back to the model's global weighting factor.
    #[serde(default)]
    pub smooth_steepness: Option<f64>,
    /// Electronegativity equilibration parameters.
    pub eeq: EeqData,
    /// Reference states, at least one per element.
    pub references: Vec<ReferenceState>,
}

/// The complete reference dataset, indexed by atomic number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameters {
    /// Version tag of the dataset.
    #[serde(default)]
    pub version: String,
    /// A mapping from atomic number to the corresponding element data.
    #[serde(deserialize_with = "deserialize_element_map")]
    pub elements: HashMap<u8, ElementData>,
    /// Secondary systems referenced by the reference states, keyed like `elements`.
    #[serde(default, deserialize_with = "deserialize_secondary_map")]
    pub secondary: HashMap<u8, SecondaryData>,
}

impl Parameters {
    /// Loads a reference dataset from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `DispersionError::IoError` if the file cannot be read, or a
    /// `DispersionError::DeserializationError` if the TOML content is invalid.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dftd4::Parameters;
    /// use std::path::Path;
    ///
    /// let params = Parameters::load_from_file(Path::new("d4.data.toml")).unwrap();
    /// ```
    pub fn load_from_file(path: &Path) -> Result<Self, DispersionError> {
        let content = std::fs::read_to_string(path).map_err(|io_error| DispersionError::IoError {
            path: path.to_path_buf(),
            source: io_error,
        })?;

        Self::load_from_str(&content)
    }

    /// Parses a reference dataset from a TOML string.
    ///
    /// # Examples
    ///
    /// ```
    /// use dftd4::Parameters;
    ///
    /// let toml_data = r#"
    /// [elements.H]
    /// zeff = 1.0
    /// hardness = 0.47259288
    /// r4r2 = 2.00734898
    /// rcov = 0.32
    /// en = 2.20
    /// eeq = { chi = 1.23695041, gam = -0.35015861, kcn = 0.04916110, rad = 0.55159092 }
    /// references = [{ cn = 0.0, alpha = [
    ///     4.5, 4.439, 4.267, 3.693, 3.017, 2.402, 1.903, 1.518, 1.225, 1.001, 0.83, 0.6967,
    ///     0.5078, 0.3846, 0.3005, 0.2408, 0.1971, 0.1281, 0.08976, 0.05094, 0.03273, 0.01461,
    ///     0.008228,
    /// ] }]
    /// "#;
    ///
    /// let params = Parameters::load_from_str(toml_data).unwrap();
    /// assert_eq!(params.elements.len(), 1);
    /// ```
    pub fn load_from_str(toml_str: &str) -> Result<Self, DispersionError> {
        toml::from_str(toml_str).map_err(DispersionError::from)
    }

    /// Creates an empty dataset.
    pub fn new() -> Self {
        Parameters {
            version: String::new(),
            elements: HashMap::new(),
            secondary: HashMap::new(),
        }
    }

    /// Returns the data for an element or `ParameterNotFound`.
    pub fn element(&self, atomic_number: u8) -> Result<&ElementData, DispersionError> {
        self.elements
            .get(&atomic_number)
            .ok_or(DispersionError::ParameterNotFound(atomic_number))
    }

    /// Returns the secondary system of an element or `ParameterNotFound`.
    pub fn secondary(&self, atomic_number: u8) -> Result<&SecondaryData, DispersionError> {
        self.secondary
            .get(&atomic_number)
            .ok_or(DispersionError::ParameterNotFound(atomic_number))
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_spectrum(alpha: &[f64]) -> Result<(), String> {
    if alpha.len() != N_FREQ {
        return Err(format!("expected {} frequencies, found {}", N_FREQ, alpha.len()));
    }
    if alpha.iter().any(|value| !value.is_finite() || *value < 0.0) {
        return Err("polarizabilities must be finite and non-negative".to_string());
    }
    Ok(())
}

fn validate_element(key: &str, data: &ElementData) -> Result<(), String> {
    if data.references.is_empty() {
        return Err(format!("element '{}' has no reference states", key));
    }
    if data.eeq.rad <= 0.0 || data.covalent_radius <= 0.0 {
        return Err(format!("element '{}' has a non-positive radius", key));
    }
    for state in &data.references {
        validate_spectrum(&state.alpha).map_err(|reason| {
            format!("element '{}' reference with cn = {}: {}", key, state.cn, reason)
        })?;
        if state.hcount != 0.0 && state.secondary.is_none() {
            return Err(format!(
                "element '{}' reference with cn = {} has secondary atoms but no secondary element",
                key, state.cn
            ));
        }
    }
    Ok(())
}

fn validate_secondary(key: &str, data: &SecondaryData) -> Result<(), String> {
    validate_spectrum(&data.alpha).map_err(|reason| format!("secondary '{}': {}", key, reason))
}

fn parse_element_key(key: &str) -> Option<u8> {
    match key.parse::<u8>() {
        Ok(number) => Some(number),
        Err(_) => element_symbol_to_atomic_number(key),
    }
}

/// Deserializes an optional element given by atomic number or symbol.
fn deserialize_optional_element<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ElementKey {
        Number(u8),
        Symbol(String),
    }

    match Option::<ElementKey>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ElementKey::Number(number)) => Ok(Some(number)),
        Some(ElementKey::Symbol(symbol)) => parse_element_key(&symbol)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid element key: '{}'", symbol))),
    }
}

fn deserialize_element_map<'de, D>(deserializer: D) -> Result<HashMap<u8, ElementData>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(ElementMapVisitor::new(validate_element))
}

fn deserialize_secondary_map<'de, D>(
    deserializer: D,
) -> Result<HashMap<u8, SecondaryData>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(ElementMapVisitor::new(validate_secondary))
}

/// Visits a map keyed by atomic number or element symbol, validating every entry.
struct ElementMapVisitor<T> {
    validate: fn(&str, &T) -> Result<(), String>,
    marker: PhantomData<T>,
}

impl<T> ElementMapVisitor<T> {
    fn new(validate: fn(&str, &T) -> Result<(), String>) -> Self {
        Self {
            validate,
            marker: PhantomData,
        }
    }
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for ElementMapVisitor<T> {
    type Value = HashMap<u8, T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from atomic number or symbol to element data")
    }

    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut elements = HashMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, T>()? {
            let atomic_number = parse_element_key(&key).ok_or_else(|| {
                <M::Error as de::Error>::custom(format!("invalid element key: '{}'", key))
            })?;
            (self.validate)(&key, &value).map_err(<M::Error as de::Error>::custom)?;
            elements.insert(atomic_number, value);
        }
        Ok(elements)
    }
}

const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Converts a case-sensitive element symbol to its atomic number.
pub fn element_symbol_to_atomic_number(symbol: &str) -> Option<u8> {
    ELEMENT_SYMBOLS
        .iter()
        .position(|&candidate| candidate == symbol)
        .map(|index| index as u8 + 1)
}

/// Returns the element symbol of an atomic number, if it is a real element.
pub fn atomic_number_to_symbol(atomic_number: u8) -> Option<&'static str> {
    ELEMENT_SYMBOLS.get((atomic_number as usize).checked_sub(1)?).copied()
}
