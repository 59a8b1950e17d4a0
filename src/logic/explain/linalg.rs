//! Small dense solvers for the sampling attributor and the local surrogate.
//!
//! Systems here are at most (features × features), so plain Gaussian
//! elimination with partial pivoting is enough.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::logic::error::{CreditError, CreditResult};

/// Diagonal jitter used when a normal-equation system is singular
const RIDGE_FALLBACK: f64 = 1e-8;

/// Solve `a · x = b` for square `a` and one or more right-hand sides.
pub fn solve(a: &Array2<f64>, b: &Array2<f64>) -> CreditResult<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.nrows() != n {
        return Err(CreditError::Numerical(format!(
            "cannot solve {}x{} system with {} right-hand rows",
            a.nrows(),
            a.ncols(),
            b.nrows()
        )));
    }

    let mut m = a.clone();
    let mut x = b.clone();
    let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                m[[i, col]]
                    .abs()
                    .partial_cmp(&m[[j, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if m[[pivot, col]].abs() <= scale * 1e-13 {
            return Err(CreditError::Numerical(format!(
                "singular system at column {}",
                col
            )));
        }

        if pivot != col {
            for k in 0..n {
                m.swap([col, k], [pivot, k]);
            }
            for k in 0..x.ncols() {
                x.swap([col, k], [pivot, k]);
            }
        }

        let diag = m[[col, col]];
        for row in (col + 1)..n {
            let factor = m[[row, col]] / diag;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[[row, k]] -= factor * m[[col, k]];
            }
            for k in 0..x.ncols() {
                x[[row, k]] -= factor * x[[col, k]];
            }
        }
    }

    for col in (0..n).rev() {
        for k in 0..x.ncols() {
            let mut acc = x[[col, k]];
            for j in (col + 1)..n {
                acc -= m[[col, j]] * x[[j, k]];
            }
            x[[col, k]] = acc / m[[col, col]];
        }
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(CreditError::Numerical("non-finite solution".to_string()));
    }
    Ok(x)
}

/// Weighted least squares without intercept: minimise Σ w_i (y_i − x_i·β)².
///
/// `y` may hold several targets (one column each). Falls back to a tiny
/// ridge when the normal equations are singular.
pub fn weighted_least_squares(
    x: ArrayView2<f64>,
    weights: ArrayView1<f64>,
    y: ArrayView2<f64>,
) -> CreditResult<Array2<f64>> {
    let xw = &x * &weights.insert_axis(Axis(1));
    let xtwx = xw.t().dot(&x);
    let xtwy = xw.t().dot(&y);

    match solve(&xtwx, &xtwy) {
        Ok(beta) => Ok(beta),
        Err(e) => {
            log::debug!("WLS normal equations singular ({}), retrying with ridge", e);
            let mut damped = xtwx;
            for i in 0..damped.nrows() {
                damped[[i, i]] += RIDGE_FALLBACK;
            }
            solve(&damped, &xtwy)
        }
    }
}

/// Fitted weighted ridge regression with an unpenalised intercept.
#[derive(Debug, Clone)]
pub struct RidgeFit {
    pub coef: Array1<f64>,
    pub intercept: f64,
    /// Weighted R² on the training rows
    pub score: f64,
}

/// Weighted ridge regression (centre by weighted means, penalise slopes only).
pub fn weighted_ridge(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    alpha: f64,
) -> CreditResult<RidgeFit> {
    let total: f64 = weights.sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(CreditError::Numerical(
            "sample weights must have a positive sum".to_string(),
        ));
    }

    let x_mean = x.t().dot(&weights) / total;
    let y_mean = y.dot(&weights) / total;
    let xc = &x - &x_mean.view().insert_axis(Axis(0));
    let yc = &y - y_mean;

    let xw = &xc * &weights.insert_axis(Axis(1));
    let mut gram = xw.t().dot(&xc);
    for i in 0..gram.nrows() {
        gram[[i, i]] += alpha;
    }
    let rhs = xw.t().dot(&yc).insert_axis(Axis(1)).to_owned();

    let coef = match solve(&gram, &rhs) {
        Ok(c) => c,
        Err(_) => {
            for i in 0..gram.nrows() {
                gram[[i, i]] += RIDGE_FALLBACK;
            }
            solve(&gram, &rhs)?
        }
    }
    .column(0)
    .to_owned();

    let intercept = y_mean - x_mean.dot(&coef);

    let pred = x.dot(&coef) + intercept;
    let ss_res: f64 = (&y - &pred)
        .iter()
        .zip(weights.iter())
        .map(|(r, w)| w * r * r)
        .sum();
    let ss_tot: f64 = yc.iter().zip(weights.iter()).map(|(r, w)| w * r * r).sum();
    let score = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Ok(RidgeFit {
        coef,
        intercept,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_with_pivoting() {
        let a = array![[0.0, 2.0], [3.0, 1.0]];
        let b = array![[4.0], [5.0]];
        let x = solve(&a, &b).unwrap();
        assert!((x[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((x[[1, 0]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![[1.0], [2.0]];
        assert!(matches!(solve(&a, &b), Err(CreditError::Numerical(_))));
    }

    #[test]
    fn test_wls_recovers_exact_fit() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![[2.0], [-1.0], [1.0]];
        let w = array![1.0, 2.0, 3.0];
        let beta = weighted_least_squares(x.view(), w.view(), y.view()).unwrap();
        assert!((beta[[0, 0]] - 2.0).abs() < 1e-9);
        assert!((beta[[1, 0]] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ridge_without_penalty_is_ols() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let w = Array1::ones(4);
        let fit = weighted_ridge(x.view(), y.view(), w.view(), 0.0).unwrap();
        assert!((fit.coef[0] - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((fit.score - 1.0).abs() < 1e-9);

        let shrunk = weighted_ridge(x.view(), y.view(), w.view(), 10.0).unwrap();
        assert!(shrunk.coef[0] < 2.0 && shrunk.coef[0] > 0.0);
    }
}
