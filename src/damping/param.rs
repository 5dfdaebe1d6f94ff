//! Rational (Becke–Johnson) damping parameters and their builder.

use super::method::Method;
use crate::error::DispersionError;

pub(crate) const DEFAULT_S6: f64 = 1.0;
pub(crate) const DEFAULT_S9: f64 = 1.0;
pub(crate) const DEFAULT_ALP: f64 = 16.0;

/// Scaling and damping parameters of the dispersion energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampingParam {
    /// Scaling of the dipole–dipole (C6) term.
    pub s6: f64,
    /// Scaling of the dipole–quadrupole (C8) term.
    pub s8: f64,
    /// Scaling of the three-body term; zero disables it.
    pub s9: f64,
    /// Scaling of the critical radius in the rational damping.
    pub a1: f64,
    /// Offset of the critical radius in the rational damping, in Bohr.
    pub a2: f64,
    /// Exponent of the three-body zero damping.
    pub alp: f64,
}

impl DampingParam {
    /// Parameters with explicit `s8`, `a1` and `a2` and defaults elsewhere.
    pub fn new(s8: f64, a1: f64, a2: f64) -> Self {
        Self {
            s6: DEFAULT_S6,
            s8,
            s9: DEFAULT_S9,
            a1,
            a2,
            alp: DEFAULT_ALP,
        }
    }

    /// Tabulated parameters of a method.
    pub fn from_method(method: Method) -> Self {
        method.damping_param()
    }

    pub fn builder() -> DampingParamBuilder {
        DampingParamBuilder::new()
    }
}

/// Collects damping parameters from a method and/or explicit values.
///
/// Explicit values take precedence over the method table. Without a method,
/// `s8`, `a1` and `a2` are required.
///
/// # Examples
///
/// ```
/// use dftd4::{DampingParam, Method};
///
/// let param = DampingParam::builder().method(Method::Pbe).s9(0.0).build().unwrap();
/// assert_eq!(param.s9, 0.0);
/// assert_eq!(param.a1, 0.38574991);
///
/// let error = DampingParam::builder().a1(0.4).a2(5.0).build().unwrap_err();
/// assert!(error.to_string().contains("s8"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DampingParamBuilder {
    method: Option<Method>,
    s6: Option<f64>,
    s8: Option<f64>,
    s9: Option<f64>,
    a1: Option<f64>,
    a2: Option<f64>,
    alp: Option<f64>,
}

impl DampingParamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn s6(mut self, s6: f64) -> Self {
        self.s6 = Some(s6);
        self
    }

    pub fn s8(mut self, s8: f64) -> Self {
        self.s8 = Some(s8);
        self
    }

    pub fn s9(mut self, s9: f64) -> Self {
        self.s9 = Some(s9);
        self
    }

    pub fn a1(mut self, a1: f64) -> Self {
        self.a1 = Some(a1);
        self
    }

    pub fn a2(mut self, a2: f64) -> Self {
        self.a2 = Some(a2);
        self
    }

    pub fn alp(mut self, alp: f64) -> Self {
        self.alp = Some(alp);
        self
    }

    /// Resolves the parameters.
    ///
    /// # Errors
    ///
    /// Returns `MissingArgument` naming the first of `s8`, `a1`, `a2` that is
    /// neither given nor provided by a method.
    pub fn build(&self) -> Result<DampingParam, DispersionError> {
        let base = match self.method {
            Some(method) => method.damping_param(),
            None => {
                let s8 = self.s8.ok_or(DispersionError::MissingArgument("s8"))?;
                let a1 = self.a1.ok_or(DispersionError::MissingArgument("a1"))?;
                let a2 = self.a2.ok_or(DispersionError::MissingArgument("a2"))?;
                DampingParam::new(s8, a1, a2)
            }
        };

        Ok(DampingParam {
            s6: self.s6.unwrap_or(base.s6),
            s8: self.s8.unwrap_or(base.s8),
            s9: self.s9.unwrap_or(base.s9),
            a1: self.a1.unwrap_or(base.a1),
            a2: self.a2.unwrap_or(base.a2),
            alp: self.alp.unwrap_or(base.alp),
        })
    }
}
