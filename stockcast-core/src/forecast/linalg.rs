//! Dense linear algebra for the normal equations.
//!
//! Matrices are row-major `Vec<f64>` of size `n * n`; systems are small
//! (one column per regressor) so no BLAS is needed.

/// Accumulate `XᵀX` and `Xᵀy` from design rows of width `p`.
pub fn normal_equations(rows: &[Vec<f64>], y: &[f64], p: usize) -> (Vec<f64>, Vec<f64>) {
    let mut xtx = vec![0.0; p * p];
    let mut xty = vec![0.0; p];
    for (row, &target) in rows.iter().zip(y) {
        for i in 0..p {
            let xi = row[i];
            if xi == 0.0 {
                continue;
            }
            xty[i] += xi * target;
            for j in i..p {
                xtx[i * p + j] += xi * row[j];
            }
        }
    }
    // Mirror the upper triangle
    for i in 0..p {
        for j in 0..i {
            xtx[i * p + j] = xtx[j * p + i];
        }
    }
    (xtx, xty)
}

/// Solve `A x = b` for symmetric positive-definite `A` by Cholesky
/// factorization. Returns `None` if `A` is not positive definite.
pub fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    // A = L Lᵀ, L lower-triangular
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * z[k];
        }
        z[i] = sum / l[i * n + i];
    }

    // Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_spd_system() {
        // [[4, 2], [2, 3]] x = [2, 1]  →  x = [0.5, 0]
        let a = [4.0, 2.0, 2.0, 3.0];
        let x = cholesky_solve(&a, &[2.0, 1.0], 2).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn rejects_indefinite_matrix() {
        let a = [1.0, 2.0, 2.0, 1.0];
        assert!(cholesky_solve(&a, &[1.0, 1.0], 2).is_none());
    }

    #[test]
    fn normal_equations_are_symmetric() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 0.0], vec![0.5, 1.0]];
        let y = [1.0, 2.0, 3.0];
        let (xtx, xty) = normal_equations(&rows, &y, 2);
        assert_eq!(xtx[1], xtx[2]);
        assert!((xtx[0] - 10.25).abs() < 1e-12);
        assert!((xtx[3] - 5.0).abs() < 1e-12);
        assert!((xty[0] - 8.5).abs() < 1e-12);
        assert!((xty[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn least_squares_recovers_line() {
        // y = 2x + 1
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 1.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| 2.0 * i as f64 + 1.0).collect();
        let (xtx, xty) = normal_equations(&rows, &y, 2);
        let beta = cholesky_solve(&xtx, &xty, 2).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-9);
        assert!((beta[1] - 1.0).abs() < 1e-9);
    }
}
