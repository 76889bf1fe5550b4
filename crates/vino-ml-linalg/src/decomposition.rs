use vino_ml_core::{Tensor, TensorError, TensorResult};

/// LU decomposition result: P * A = L * U
pub struct LuDecomposition {
    pub l: Tensor,
    pub u: Tensor,
    pub pivot: Vec<usize>,
}

/// LU decomposition with partial pivoting.
///
/// A pivot smaller than `EPSILON` times the largest entry of `a` is treated
/// as zero and reported as [`TensorError::SingularMatrix`].
pub fn lu(a: &Tensor) -> TensorResult<LuDecomposition> {
    let (n, m) = a.shape().matrix()?;
    if n != m {
        return Err(TensorError::InvalidOperation("LU requires a square matrix".into()));
    }

    let scale = a.data().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tol = f64::EPSILON * scale.max(1.0);

    let mut u = a.data().to_vec();
    let mut l = vec![0.0; n * n];
    let mut pivot: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let (max_row, max_val) = (k..n)
            .map(|i| (i, u[i * n + k].abs()))
            .fold((k, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if max_val < tol {
            return Err(TensorError::SingularMatrix);
        }

        if max_row != k {
            pivot.swap(k, max_row);
            for j in 0..n {
                u.swap(k * n + j, max_row * n + j);
            }
            for j in 0..k {
                l.swap(k * n + j, max_row * n + j);
            }
        }

        l[k * n + k] = 1.0;

        for i in (k + 1)..n {
            let factor = u[i * n + k] / u[k * n + k];
            l[i * n + k] = factor;
            for j in k..n {
                u[i * n + j] -= factor * u[k * n + j];
            }
        }
    }

    Ok(LuDecomposition {
        l: Tensor::new(l, vec![n, n])?,
        u: Tensor::new(u, vec![n, n])?,
        pivot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_lu_reconstructs_permuted_input() {
        let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let d = lu(&a).unwrap();
        let lu_prod = d.l.matmul(&d.u).unwrap();
        for (i, &p) in d.pivot.iter().enumerate() {
            for j in 0..2 {
                assert_abs_diff_eq!(
                    lu_prod.get(&[i, j]).unwrap(),
                    a.get(&[p, j]).unwrap(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_lu_singular() {
        let a = Tensor::new(vec![1.0, 2.0, 2.0, 4.0], vec![2, 2]).unwrap();
        assert!(matches!(lu(&a), Err(TensorError::SingularMatrix)));
    }

    #[test]
    fn test_lu_requires_square() {
        let a = Tensor::zeros(vec![2, 3]);
        assert!(lu(&a).is_err());
    }
}
