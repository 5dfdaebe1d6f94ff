//! Frequency-dependent reference polarizabilities and the Casimir–Polder integral.

use crate::params::{ReferenceState, SecondaryData};
use std::f64::consts::PI;

/// Number of imaginary frequencies the polarizabilities are sampled on.
pub const N_FREQ: usize = 23;

/// Imaginary frequency grid in Hartree.
pub const FREQUENCY_GRID: [f64; N_FREQ] = [
    0.000001, 0.050000, 0.100000, 0.200000, 0.300000, 0.400000, 0.500000, 0.600000, 0.700000,
    0.800000, 0.900000, 1.000000, 1.200000, 1.400000, 1.600000, 1.800000, 2.000000, 2.500000,
    3.000000, 4.000000, 5.000000, 7.500000, 10.00000,
];

/// Trapezoidal quadrature weights belonging to [`FREQUENCY_GRID`].
pub fn trapezoid_weights() -> [f64; N_FREQ] {
    let f = &FREQUENCY_GRID;
    std::array::from_fn(|i| match i {
        0 => 0.5 * (f[1] - f[0]),
        i if i == N_FREQ - 1 => 0.5 * (f[i] - f[i - 1]),
        i => 0.5 * (f[i + 1] - f[i - 1]),
    })
}

/// Polarizability of one secondary atom carrying `charge`.
///
/// The secondary spectrum is scaled by its share `sscale` and by the charge
/// scaling relative to the neutral secondary element, whose effective charge
/// and hardness are `zeff` and `hardness`.
pub fn secondary_polarizability(
    secondary: &SecondaryData,
    zeff: f64,
    hardness: f64,
    charge: f64,
    ga: f64,
    gc: f64,
) -> [f64; N_FREQ] {
    let scale = secondary.sscale * zeta(ga, gc * hardness, zeff, zeff + charge);
    std::array::from_fn(|i| scale * secondary.alpha.get(i).copied().unwrap_or(0.0))
}

/// Polarizability of the element itself in a reference state.
///
/// `hcount` times the `secondary` polarizability is removed from the tabulated
/// spectrum of the reference molecule, the remainder is scaled by `ascale` and
/// clamped at zero.
pub fn reference_polarizability(
    state: &ReferenceState,
    secondary: Option<&[f64; N_FREQ]>,
) -> [f64; N_FREQ] {
    std::array::from_fn(|i| {
        let tabulated = state.alpha.get(i).copied().unwrap_or(0.0);
        let removed = secondary.map_or(0.0, |alpha| state.hcount * alpha[i]);
        (state.ascale * (tabulated - removed)).max(0.0)
    })
}

/// Casimir–Polder integral `3/π ∫ α_a(iω) α_b(iω) dω`.
pub fn casimir_polder(
    weights: &[f64; N_FREQ],
    alpha_a: &[f64; N_FREQ],
    alpha_b: &[f64; N_FREQ],
) -> f64 {
    let integral: f64 = weights
        .iter()
        .zip(alpha_a)
        .zip(alpha_b)
        .map(|((w, a), b)| w * a * b)
        .sum();
    3.0 / PI * integral
}

/// Charge scaling of a reference polarizability.
///
/// `qref` and `qmod` are the effective nuclear charges of the reference and of
/// the actual atom, `ga` the height and `gc` the steepness of the function.
#[inline]
pub fn zeta(ga: f64, gc: f64, qref: f64, qmod: f64) -> f64 {
    if qmod <= 0.0 {
        ga.exp()
    } else {
        (ga * (1.0 - (gc * (1.0 - qref / qmod)).exp())).exp()
    }
}

/// Derivative of [`zeta`] with respect to `qmod`.
#[inline]
pub fn dzeta(ga: f64, gc: f64, qref: f64, qmod: f64) -> f64 {
    if qmod <= 0.0 {
        0.0
    } else {
        let inner = (gc * (1.0 - qref / qmod)).exp();
        -ga * gc * inner * zeta(ga, gc, qref, qmod) * qref / (qmod * qmod)
    }
}
