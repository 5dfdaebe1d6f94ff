//! Fixed-size vector and matrix helpers for Cartesian geometry.
//!
//! Lattices are stored row-wise: `lattice[k]` is the k-th lattice vector.

pub type Vec3 = [f64; 3];
pub type Mat3 = [[f64; 3]; 3];

#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn norm_sq(a: Vec3) -> f64 {
    dot(a, a)
}

#[inline]
pub fn norm(a: Vec3) -> f64 {
    norm_sq(a).sqrt()
}

pub fn determinant(m: &Mat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Inverse of a 3x3 matrix, or `None` if it is numerically singular.
pub fn inverse(m: &Mat3) -> Option<Mat3> {
    let det = determinant(m);
    if !det.is_finite() || det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}

pub fn transpose(m: &Mat3) -> Mat3 {
    let mut t = [[0.0; 3]; 3];
    for (a, row) in m.iter().enumerate() {
        for (b, value) in row.iter().enumerate() {
            t[b][a] = *value;
        }
    }
    t
}

pub fn matmul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut c = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            c[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    c
}

/// Accumulates `factor * (a ⊗ b)` into `target`.
#[inline]
pub fn add_outer(target: &mut Mat3, a: Vec3, b: Vec3, factor: f64) {
    for (row, &ai) in target.iter_mut().zip(a.iter()) {
        for (value, &bj) in row.iter_mut().zip(b.iter()) {
            *value += factor * ai * bj;
        }
    }
}

/// Shifts `d` by the lattice translation that brings its fractional
/// coordinates into `[-½, ½]`.
///
/// `inverse_lattice` is the inverse of the row-wise `lattice`.
pub fn wrap_to_cell(d: Vec3, lattice: &Mat3, inverse_lattice: &Mat3) -> Vec3 {
    let shift: [f64; 3] =
        std::array::from_fn(|k| (0..3).map(|a| d[a] * inverse_lattice[a][k]).sum::<f64>().round());
    std::array::from_fn(|a| d[a] - (0..3).map(|k| shift[k] * lattice[k][a]).sum::<f64>())
}

#[inline]
pub fn add_mat(target: &mut Mat3, other: &Mat3) {
    for (row, other_row) in target.iter_mut().zip(other.iter()) {
        for (value, other_value) in row.iter_mut().zip(other_row.iter()) {
            *value += other_value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_round_trip() {
        let m = [[9.5, 0.3, 0.0], [-0.2, 8.7, 0.4], [0.1, 0.0, 10.2]];
        let inv = inverse(&m).unwrap();
        let identity = matmul(&m, &inv);
        for (i, row) in identity.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(*value, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let m = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 0.0]];
        assert!(inverse(&m).is_none());
    }

    #[test]
    fn test_wrapped_vector_differs_by_a_lattice_translation() {
        let lattice = [[6.0, 0.0, 0.0], [2.0, 5.5, 0.0], [-1.0, 0.5, 7.0]];
        let inv = inverse(&lattice).unwrap();
        let d = [25.3, -13.1, 16.2];
        let wrapped = wrap_to_cell(d, &lattice, &inv);

        let fractional = |v: Vec3| -> Vec3 {
            std::array::from_fn(|k| (0..3).map(|a| v[a] * inv[a][k]).sum())
        };
        for (f, w) in fractional(d).iter().zip(fractional(wrapped)) {
            assert!(w.abs() <= 0.5 + 1e-12);
            assert!(((f - w) - (f - w).round()).abs() < 1e-10);
        }
    }

    #[test]
    fn test_determinant_of_cubic_cell_is_volume() {
        let a = 9.69523775911749;
        let m = [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]];
        assert_relative_eq!(determinant(&m), a * a * a, epsilon = 1e-9);
    }
}
