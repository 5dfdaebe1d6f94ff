//! Gaussian screened Coulomb interaction between two atomic charge densities.
//!
//! Each atom carries a spherical Gaussian charge density of exponent `alpha`.
//! The Coulomb integral between two such densities is `erf(γ r) / r` with
//! `γ = sqrt(α₁ α₂ / (α₁ + α₂))`, which is finite at short range and recovers
//! the point-charge limit `1 / r` at long range.

use super::constants::SAME_POINT_THRESHOLD_SQ;
use libm::erf;
use std::f64::consts::PI;

/// Gaussian exponent of a charge density with the given width in Bohr.
///
/// With `α = 1 / rad²` the pair kernel becomes `erf(r / sqrt(rad₁² + rad₂²)) / r`.
#[inline]
pub fn gaussian_exponent(width_bohr: f64) -> f64 {
    1.0 / (width_bohr * width_bohr)
}

/// Effective damping strength `γ` of the pair kernel.
#[inline]
pub fn effective_gamma(alpha1: f64, alpha2: f64) -> f64 {
    let sum_alpha = alpha1 + alpha2;
    if sum_alpha < 1e-10 {
        return 0.0;
    }
    (alpha1 * alpha2 / sum_alpha).sqrt()
}

/// Evaluates the Coulomb integral between two Gaussian charge distributions.
#[inline]
pub fn screened_potential(r: f64, gamma: f64) -> f64 {
    if r * r > SAME_POINT_THRESHOLD_SQ {
        erf(gamma * r) / r
    } else {
        2.0 * gamma / PI.sqrt()
    }
}

/// Radial derivative of [`screened_potential`].
#[inline]
pub fn screened_potential_derivative(r: f64, gamma: f64) -> f64 {
    if r * r > SAME_POINT_THRESHOLD_SQ {
        let gr = gamma * r;
        2.0 * gamma / PI.sqrt() * (-gr * gr).exp() / r - erf(gr) / (r * r)
    } else {
        0.0
    }
}

/// Self-interaction of a single Gaussian density of the given width.
#[inline]
pub fn self_interaction(width_bohr: f64) -> f64 {
    (2.0 / PI).sqrt() / width_bohr
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gamma_for(rad1: f64, rad2: f64) -> f64 {
        effective_gamma(gaussian_exponent(rad1), gaussian_exponent(rad2))
    }

    #[test]
    fn test_gamma_matches_closed_form() {
        let (rad1, rad2): (f64, f64) = (0.55159092, 1.88862966);
        let expected = 1.0 / (rad1 * rad1 + rad2 * rad2).sqrt();
        assert_relative_eq!(gamma_for(rad1, rad2), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_potential_at_zero_distance_limit() {
        let gamma = gamma_for(1.2, 1.2);
        let at_zero = screened_potential(0.0, gamma);
        let near_zero = screened_potential(1e-5, gamma);

        assert!(at_zero.is_finite() && at_zero > 0.0);
        assert_relative_eq!(at_zero, near_zero, epsilon = 1e-9);
        assert_relative_eq!(at_zero, self_interaction(1.2), epsilon = 1e-12);
    }

    #[test]
    fn test_potential_large_distance_asymptote() {
        let gamma = gamma_for(0.55, 1.89);
        let r = 1000.0;
        assert_relative_eq!(screened_potential(r, gamma), 1.0 / r, epsilon = 1e-12);
    }

    #[test]
    fn test_potential_symmetry() {
        let r = 3.0;
        assert_eq!(
            screened_potential(r, gamma_for(0.6, 1.4)),
            screened_potential(r, gamma_for(1.4, 0.6))
        );
    }

    #[test]
    fn test_potential_decreases_with_distance() {
        let gamma = gamma_for(1.0, 1.0);
        assert!(screened_potential(2.0, gamma) > screened_potential(6.0, gamma));
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let gamma = gamma_for(1.32, 0.55);
        let step = 1e-5;
        for &r in &[0.5, 1.8, 4.0, 12.0] {
            let numerical = (screened_potential(r + step, gamma)
                - screened_potential(r - step, gamma))
                / (2.0 * step);
            assert_relative_eq!(
                screened_potential_derivative(r, gamma),
                numerical,
                epsilon = 1e-8
            );
        }
    }
}
