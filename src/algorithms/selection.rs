// src/algorithms/selection.rs

use crate::algorithms::surrogate::WeightedDesign;
use crate::core::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Strategy for choosing which features appear in an explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSelection {
    /// Forward selection for up to 6 features, highest weights beyond.
    #[default]
    Auto,
    None,
    ForwardSelection,
    HighestWeights,
    LassoPath,
}

const AUTO_FORWARD_LIMIT: usize = 6;
const LASSO_PATH_STEPS: usize = 100;
const LASSO_PATH_RATIO: f64 = 1e-4;

impl FeatureSelection {
    /// Returns at most `n` column indices of `design`, sorted ascending.
    pub fn select(&self, design: &WeightedDesign, n: usize, ridge_lambda: f64) -> Result<Vec<usize>> {
        let p = design.n_features();
        if n >= p {
            return Ok((0..p).collect());
        }
        let mut chosen = match self {
            FeatureSelection::None => (0..p).collect(),
            FeatureSelection::Auto if n <= AUTO_FORWARD_LIMIT => forward_selection(design, n, ridge_lambda)?,
            FeatureSelection::Auto => highest_weights(design, n, ridge_lambda)?,
            FeatureSelection::ForwardSelection => forward_selection(design, n, ridge_lambda)?,
            FeatureSelection::HighestWeights => highest_weights(design, n, ridge_lambda)?,
            FeatureSelection::LassoPath => lasso_path(design, n),
        };
        chosen.sort_unstable();
        Ok(chosen)
    }
}

fn forward_selection(design: &WeightedDesign, n: usize, lambda: f64) -> Result<Vec<usize>> {
    let p = design.n_features();
    let mut chosen: Vec<usize> = Vec::with_capacity(n);
    while chosen.len() < n {
        let mut best: Option<(usize, f64)> = None;
        for candidate in (0..p).filter(|j| !chosen.contains(j)) {
            let mut trial = chosen.clone();
            trial.push(candidate);
            let r2 = design.ridge_on(&trial, lambda)?.r2;
            if best.map_or(true, |(_, b)| r2 > b) {
                best = Some((candidate, r2));
            }
        }
        match best {
            Some((j, _)) => chosen.push(j),
            None => break,
        }
    }
    Ok(chosen)
}

fn highest_weights(design: &WeightedDesign, n: usize, lambda: f64) -> Result<Vec<usize>> {
    let fit = design.ridge(lambda)?;
    let mut order: Vec<usize> = (0..fit.coefficients.len()).collect();
    order.sort_by(|&a, &b| {
        fit.coefficients[b]
            .abs()
            .total_cmp(&fit.coefficients[a].abs())
            .then(a.cmp(&b))
    });
    order.truncate(n);
    Ok(order)
}

/// Walks the lasso path from the empty model towards the unpenalized one and
/// keeps the last active set with no more than `n` features.
fn lasso_path(design: &WeightedDesign, n: usize) -> Vec<usize> {
    let p = design.n_features();
    let lambda_max = design.lambda_max();
    if lambda_max <= 0.0 {
        return Vec::new();
    }
    let mut beta = Array1::zeros(p);
    let mut best: Vec<usize> = Vec::new();
    for step in 0..LASSO_PATH_STEPS {
        let frac = step as f64 / (LASSO_PATH_STEPS - 1) as f64;
        let lambda = lambda_max * LASSO_PATH_RATIO.powf(frac);
        beta = design.lasso(lambda, beta, 1000, 1e-7);
        let active: Vec<usize> = (0..p).filter(|&j| beta[j] != 0.0).collect();
        if active.len() > n {
            break;
        }
        best = active;
    }
    log::trace!("Lasso path kept {} of {} features", best.len(), p);
    best
}
