//! Eigen-decomposition of real symmetric matrices.

use ndarray::{Array1, Array2};

use crate::MathError;

/// Maximum number of Jacobi sweeps before giving up.
const MAX_SWEEPS: usize = 100;

/// Relative tolerance used to check symmetry of the input.
const SYMMETRY_TOL: f64 = 1e-9;

/// Eigenvalues and eigenvectors of a symmetric matrix.
///
/// Pairs are in solver order (the diagonal order of the converged matrix),
/// not sorted. Column `i` of `eigenvectors` belongs to `eigenvalues[i]`.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues.
    pub eigenvalues: Array1<f64>,
    /// Orthonormal eigenvectors stored as columns.
    pub eigenvectors: Array2<f64>,
    /// Sweeps needed to converge.
    pub sweeps: usize,
}

/// Decompose a real symmetric matrix with the cyclic Jacobi method.
///
/// Each rotation zeroes one off-diagonal pair while preserving symmetry, so
/// the eigenvectors stay orthonormal to machine precision even when the matrix
/// is singular or has repeated eigenvalues.
///
/// # Errors
/// Returns error if the matrix is empty, not square, not symmetric, contains
/// NaN/Inf, or fails to converge.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<SymmetricEigen, MathError> {
    let n = matrix.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if matrix.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: matrix.ncols() });
    }
    if matrix.iter().any(|x| !x.is_finite()) {
        return Err(MathError::NumericalInstability("matrix contains NaN or Inf".to_string()));
    }

    let scale = matrix.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    for i in 0..n {
        for j in (i + 1)..n {
            if (matrix[[i, j]] - matrix[[j, i]]).abs() > SYMMETRY_TOL * scale.max(1.0) {
                return Err(MathError::LinearAlgebra("matrix is not symmetric".to_string()));
            }
        }
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let total: f64 = a.iter().map(|x| x * x).sum();

    for sweep in 0..=MAX_SWEEPS {
        let off = off_diagonal_norm_sq(&a);
        if off == 0.0 || off <= f64::EPSILON * f64::EPSILON * total {
            return Ok(SymmetricEigen {
                eigenvalues: a.diag().to_owned(),
                eigenvectors: v,
                sweeps: sweep,
            });
        }
        if sweep == MAX_SWEEPS {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                // Past the first sweeps, drop elements below the diagonal's precision.
                let g = 100.0 * apq.abs();
                if sweep > 3
                    && a[[p, p]].abs() + g == a[[p, p]].abs()
                    && a[[q, q]].abs() + g == a[[q, q]].abs()
                {
                    a[[p, q]] = 0.0;
                    a[[q, p]] = 0.0;
                    continue;
                }

                // Rotation angle that annihilates a[p, q].
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + theta.mul_add(theta, 1.0).sqrt());
                let c = 1.0 / t.mul_add(t, 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    Err(MathError::NoConvergence { sweeps: MAX_SWEEPS })
}

fn off_diagonal_norm_sq(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut off = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                off += a[[i, j]] * a[[i, j]];
            }
        }
    }
    off
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    fn sorted(values: &Array1<f64>) -> Vec<f64> {
        let mut v = values.to_vec();
        v.sort_by(|a, b| a.total_cmp(b));
        v
    }

    #[test]
    fn two_by_two_known_spectrum() {
        let m = array![[2.0, 1.0], [1.0, 2.0]];
        let eig = symmetric_eigen(&m).unwrap();

        let values = sorted(&eig.eigenvalues);
        assert_relative_eq!(values[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn reconstructs_matrix() {
        let m = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let eig = symmetric_eigen(&m).unwrap();

        let lambda = Array2::from_diag(&eig.eigenvalues);
        let rebuilt = eig.eigenvectors.dot(&lambda).dot(&eig.eigenvectors.t());
        for (x, y) in rebuilt.iter().zip(m.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn eigenvectors_orthonormal() {
        let m = array![
            [1.0, 0.9, 0.9, 0.1],
            [0.9, 1.0, 0.9, 0.2],
            [0.9, 0.9, 1.0, 0.3],
            [0.1, 0.2, 0.3, 1.0]
        ];
        let eig = symmetric_eigen(&m).unwrap();
        let gram = eig.eigenvectors.t().dot(&eig.eigenvectors);

        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(gram[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn diagonal_matrix_needs_no_sweeps() {
        let m = array![[3.0, 0.0], [0.0, 1.0]];
        let eig = symmetric_eigen(&m).unwrap();
        assert_eq!(eig.sweeps, 0);
        assert_eq!(eig.eigenvalues.to_vec(), vec![3.0, 1.0]);
    }

    #[test]
    fn singular_matrix_is_tolerated() {
        // Second asset has zero variance: zero row and column.
        let m = array![[1.0, 0.0, 0.5], [0.0, 0.0, 0.0], [0.5, 0.0, 1.0]];
        let eig = symmetric_eigen(&m).unwrap();

        let values = sorted(&eig.eigenvalues);
        assert_relative_eq!(values[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(values[2], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_asymmetric() {
        let m = array![[1.0, 2.0], [0.0, 1.0]];
        assert!(matches!(symmetric_eigen(&m), Err(MathError::LinearAlgebra(_))));
    }

    #[test]
    fn rejects_non_square() {
        let m = Array2::<f64>::zeros((2, 3));
        assert!(matches!(symmetric_eigen(&m), Err(MathError::DimensionMismatch { .. })));
    }
}
