//! Tabulated rational damping parameters of common density functionals.

use super::param::{DEFAULT_ALP, DampingParam};
use crate::error::DispersionError;
use std::fmt;
use std::str::FromStr;

/// A density functional with fitted D4 damping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Pbe,
    Blyp,
    Tpss,
    B3lyp,
    Pbe0,
    R2scan,
    Revpbe,
    Tpssh,
    Scan,
    B2plyp,
    Pw6b95,
    Hf,
    R2scan3c,
}

impl Method {
    /// All methods of the table, in a fixed order.
    pub const ALL: [Method; 13] = [
        Method::Pbe,
        Method::Blyp,
        Method::Tpss,
        Method::B3lyp,
        Method::Pbe0,
        Method::R2scan,
        Method::Revpbe,
        Method::Tpssh,
        Method::Scan,
        Method::B2plyp,
        Method::Pw6b95,
        Method::Hf,
        Method::R2scan3c,
    ];

    /// Canonical lower-case name of the method.
    pub fn name(self) -> &'static str {
        match self {
            Method::Pbe => "pbe",
            Method::Blyp => "blyp",
            Method::Tpss => "tpss",
            Method::B3lyp => "b3lyp",
            Method::Pbe0 => "pbe0",
            Method::R2scan => "r2scan",
            Method::Revpbe => "revpbe",
            Method::Tpssh => "tpssh",
            Method::Scan => "scan",
            Method::B2plyp => "b2plyp",
            Method::Pw6b95 => "pw6b95",
            Method::Hf => "hf",
            Method::R2scan3c => "r2scan-3c",
        }
    }

    /// Damping parameters of the method with three-body dispersion included.
    pub fn damping_param(self) -> DampingParam {
        // (s6, s8, a1, a2, s9)
        let (s6, s8, a1, a2, s9) = match self {
            Method::Pbe => (1.0, 0.95948085, 0.38574991, 4.80688534, 1.0),
            Method::Blyp => (1.0, 2.34076671, 0.44488865, 4.09330090, 1.0),
            Method::Tpss => (1.0, 1.76596355, 0.42822303, 4.54257102, 1.0),
            Method::B3lyp => (1.0, 2.02929367, 0.40868035, 4.53807137, 1.0),
            Method::Pbe0 => (1.0, 1.20065498, 0.40085597, 5.02928789, 1.0),
            Method::R2scan => (1.0, 0.60187490, 0.51559235, 5.77342911, 1.0),
            Method::Revpbe => (1.0, 1.74676530, 0.53634900, 3.07261485, 1.0),
            Method::Tpssh => (1.0, 1.85897750, 0.44286966, 4.60230534, 1.0),
            Method::Scan => (1.0, 1.46126056, 0.62930855, 6.31284039, 1.0),
            Method::B2plyp => (0.64, 1.16888646, 0.44154604, 4.73114642, 1.0),
            Method::Pw6b95 => (1.0, -0.31629935, 0.03999357, 5.83690254, 1.0),
            Method::Hf => (1.0, 1.61679827, 0.44959224, 3.35743605, 1.0),
            Method::R2scan3c => (1.0, 0.0, 0.42, 5.65, 2.0),
        };
        DampingParam {
            s6,
            s8,
            s9,
            a1,
            a2,
            alp: DEFAULT_ALP,
        }
    }
}

impl FromStr for Method {
    type Err = DispersionError;

    /// Parses a functional name, ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// use dftd4::Method;
    ///
    /// assert_eq!("PBE0".parse::<Method>().unwrap(), Method::Pbe0);
    /// assert!("abc".parse::<Method>().is_err());
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lower = name.to_ascii_lowercase();
        Method::ALL
            .into_iter()
            .find(|method| method.name() == lower)
            .ok_or_else(|| DispersionError::UnknownMethod(name.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
