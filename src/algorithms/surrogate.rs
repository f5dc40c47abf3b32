// src/algorithms/surrogate.rs

use crate::core::{LimeError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// A linear model fitted on a subset of the interpretable features.
#[derive(Debug, Clone)]
pub struct SurrogateFit {
    /// Column indices the coefficients belong to, ascending.
    pub features: Vec<usize>,
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    /// Weighted coefficient of determination on the fitting data.
    pub r2: f64,
}

impl SurrogateFit {
    /// Prediction for a row given in the full interpretable space.
    pub fn predict(&self, row: ArrayView1<f64>) -> f64 {
        self.intercept
            + self
                .features
                .iter()
                .zip(self.coefficients.iter())
                .map(|(&j, &c)| c * row[j])
                .sum::<f64>()
    }
}

/// Weighted regression problem with the intercept profiled out.
///
/// Columns and target are centred on their weighted means and the weights are
/// normalized to sum to one, so penalties do not depend on the sample count.
#[derive(Debug, Clone)]
pub struct WeightedDesign {
    xc: Array2<f64>,
    yc: Array1<f64>,
    w: Array1<f64>,
    x_mean: Array1<f64>,
    y_mean: f64,
}

impl WeightedDesign {
    pub fn new(x: ArrayView2<f64>, y: ArrayView1<f64>, weights: ArrayView1<f64>) -> Result<Self> {
        let n = x.nrows();
        if y.len() != n || weights.len() != n {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Design has {} rows, target {} and weights {}.",
                n,
                y.len(),
                weights.len()
            )));
        }
        if n == 0 {
            return Err(LimeError::InvalidInput(
                "Cannot fit a surrogate on zero samples.".to_string(),
            ));
        }
        if weights.iter().any(|&w| !w.is_finite() || w < 0.0) {
            return Err(LimeError::InvalidInput(
                "Sample weights must be finite and non-negative.".to_string(),
            ));
        }
        let total = weights.sum();
        if total <= 0.0 {
            return Err(LimeError::NumericalError(
                "Sample weights sum to zero.".to_string(),
            ));
        }
        let w = weights.mapv(|v| v / total);
        let x_mean = x.t().dot(&w);
        let y_mean = y.dot(&w);
        let xc = &x - &x_mean.view().insert_axis(Axis(0));
        let yc = y.mapv(|v| v - y_mean);
        Ok(WeightedDesign { xc, yc, w, x_mean, y_mean })
    }

    pub fn n_features(&self) -> usize {
        self.xc.ncols()
    }

    fn total_sum_of_squares(&self) -> f64 {
        self.yc.iter().zip(self.w.iter()).map(|(r, w)| w * r * r).sum()
    }

    fn r2_for(&self, xc: &Array2<f64>, beta: &Array1<f64>) -> f64 {
        let ss_tot = self.total_sum_of_squares();
        if ss_tot <= 0.0 {
            return 0.0;
        }
        let residual = &self.yc - &xc.dot(beta);
        let ss_res: f64 = residual.iter().zip(self.w.iter()).map(|(r, w)| w * r * r).sum();
        1.0 - ss_res / ss_tot
    }

    /// Ridge fit on all columns.
    pub fn ridge(&self, lambda: f64) -> Result<SurrogateFit> {
        let all: Vec<usize> = (0..self.n_features()).collect();
        self.ridge_on(&all, lambda)
    }

    /// Ridge fit restricted to `columns`; the intercept is never penalized.
    pub fn ridge_on(&self, columns: &[usize], lambda: f64) -> Result<SurrogateFit> {
        if lambda.is_nan() || lambda < 0.0 {
            return Err(LimeError::InvalidInput(format!(
                "Ridge penalty must be non-negative, got {}.",
                lambda
            )));
        }
        if let Some(&bad) = columns.iter().find(|&&j| j >= self.n_features()) {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Column {} requested but the design has {} columns.",
                bad,
                self.n_features()
            )));
        }
        if columns.is_empty() {
            return Ok(SurrogateFit {
                features: Vec::new(),
                coefficients: Array1::zeros(0),
                intercept: self.y_mean,
                r2: 0.0,
            });
        }

        let xc = self.xc.select(Axis(1), columns);
        let sqrt_w = self.w.mapv(f64::sqrt).insert_axis(Axis(1));
        let xw = &xc * &sqrt_w;
        let yw = &self.yc * &sqrt_w.column(0);

        let mut gram = xw.t().dot(&xw);
        for k in 0..columns.len() {
            gram[[k, k]] += lambda;
        }
        let rhs = xw.t().dot(&yw);
        let beta = solve_spd(gram, rhs)?;

        let intercept = self.y_mean
            - columns
                .iter()
                .zip(beta.iter())
                .map(|(&j, &b)| self.x_mean[j] * b)
                .sum::<f64>();
        let r2 = self.r2_for(&xc, &beta);

        Ok(SurrogateFit {
            features: columns.to_vec(),
            coefficients: beta,
            intercept,
            r2,
        })
    }

    /// Smallest lasso penalty at which every coefficient is zero.
    pub fn lambda_max(&self) -> f64 {
        let wy = &self.yc * &self.w;
        self.xc
            .t()
            .dot(&wy)
            .iter()
            .fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }

    /// Weighted lasso by cyclic coordinate descent, starting from `beta`.
    ///
    /// Minimizes `0.5 * sum_i w_i (y_i - x_i b)^2 + lambda * |b|_1` on the centred data.
    pub fn lasso(&self, lambda: f64, mut beta: Array1<f64>, max_iter: usize, tol: f64) -> Array1<f64> {
        let p = self.n_features();
        if beta.len() != p {
            beta = Array1::zeros(p);
        }
        let col_norms: Vec<f64> = (0..p)
            .map(|j| {
                self.xc
                    .column(j)
                    .iter()
                    .zip(self.w.iter())
                    .map(|(x, w)| w * x * x)
                    .sum()
            })
            .collect();
        let mut residual = &self.yc - &self.xc.dot(&beta);

        for _ in 0..max_iter {
            let mut max_change: f64 = 0.0;
            for j in 0..p {
                if col_norms[j] <= 0.0 {
                    beta[j] = 0.0;
                    continue;
                }
                let column = self.xc.column(j);
                let old = beta[j];
                let rho: f64 = column
                    .iter()
                    .zip(residual.iter())
                    .zip(self.w.iter())
                    .map(|((x, r), w)| w * x * (r + x * old))
                    .sum();
                let new = soft_threshold(rho, lambda) / col_norms[j];
                if new != old {
                    residual.scaled_add(old - new, &column);
                    beta[j] = new;
                    max_change = max_change.max((new - old).abs());
                }
            }
            if max_change < tol {
                break;
            }
        }
        beta
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// Solves `a * x = b` for a symmetric positive-definite `a`.
fn solve_spd(a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>> {
    #[cfg(feature = "linalg")]
    {
        use ndarray_linalg::SolveH;
        a.solveh_into(b)
            .map_err(|e| LimeError::NumericalError(format!("Ridge solve failed: {}", e)))
    }
    #[cfg(not(feature = "linalg"))]
    {
        cholesky_solve(&a, &b)
    }
}

#[cfg_attr(feature = "linalg", allow(dead_code))]
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(LimeError::NumericalError(
                        "Ridge system is not positive definite. Increase the penalty.".to_string(),
                    ));
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    // L z = b, then L^T x = z
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let s: f64 = (0..i).map(|k| l[[i, k]] * z[k]).sum();
        z[i] = (b[i] - s) / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let s: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (z[i] - s) / l[[i, i]];
    }
    Ok(x)
}
