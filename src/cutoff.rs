//! Real-space cutoffs and the periodic image translations they imply.

use crate::math::linalg::{Mat3, Vec3, inverse, norm};

/// Real-space cutoff radii in Bohr for the individual stages of a calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealspaceCutoff {
    /// Cutoff of the dispersion coordination number.
    pub cn: f64,
    /// Cutoff of the two-body dispersion sum.
    pub disp2: f64,
    /// Cutoff of the three-body dispersion sum.
    pub disp3: f64,
}

impl Default for RealspaceCutoff {
    fn default() -> Self {
        Self {
            cn: 30.0,
            disp2: 60.0,
            disp3: 40.0,
        }
    }
}

/// Returns every lattice translation `T` for which `|d - T|` can fall within
/// `cutoff` when `d` is a separation reduced by [`Structure::pair_vector`].
///
/// For a molecule (no lattice) the only translation is the zero vector. The
/// number of repetitions along each lattice vector follows from the spacing of
/// the lattice planes, `1 / |b_k|`, where `b_k` are the columns of the inverse
/// lattice matrix, plus the half cell a reduced separation may span.
///
/// [`Structure::pair_vector`]: crate::structure::Structure::pair_vector
pub fn lattice_points(lattice: Option<&Mat3>, cutoff: f64) -> Vec<Vec3> {
    let Some(lattice) = lattice else {
        return vec![[0.0; 3]];
    };
    let Some(inv) = inverse(lattice) else {
        return vec![[0.0; 3]];
    };

    let reps: [i64; 3] = std::array::from_fn(|k| {
        let plane_normal = [inv[0][k], inv[1][k], inv[2][k]];
        (cutoff * norm(plane_normal) + 0.5).ceil() as i64
    });

    let mut points = Vec::with_capacity(
        ((2 * reps[0] + 1) * (2 * reps[1] + 1) * (2 * reps[2] + 1)) as usize,
    );
    for n0 in -reps[0]..=reps[0] {
        for n1 in -reps[1]..=reps[1] {
            for n2 in -reps[2]..=reps[2] {
                let (f0, f1, f2) = (n0 as f64, n1 as f64, n2 as f64);
                points.push(std::array::from_fn(|d| {
                    f0 * lattice[0][d] + f1 * lattice[1][d] + f2 * lattice[2][d]
                }));
            }
        }
    }
    points
}
