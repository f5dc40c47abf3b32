// src/algorithms/kernel.rs

use crate::algorithms::sampler::FeatureStats;
use crate::core::{Dataset, FeatureKind, LimeError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Range-normalized mean absolute difference; categorical features count mismatches.
    #[default]
    Gower,
    /// On training-standardized values.
    Euclidean,
    /// On training-standardized values.
    Manhattan,
}

/// Kernel width used when none is configured: `0.75 * sqrt(p)`.
pub fn default_kernel_width(num_features: usize) -> f64 {
    0.75 * (num_features as f64).sqrt()
}

fn distance(
    a: ArrayView1<f64>,
    b: ArrayView1<f64>,
    features: &[FeatureStats],
    metric: DistanceMetric,
) -> f64 {
    let p = features.len();
    if p == 0 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (j, stats) in features.iter().enumerate() {
        let (x, y) = (a[j], b[j]);
        match metric {
            DistanceMetric::Gower => {
                acc += match stats.kind() {
                    FeatureKind::Categorical => {
                        if x == y {
                            0.0
                        } else {
                            1.0
                        }
                    }
                    FeatureKind::Continuous => {
                        let range = stats.range();
                        if range > 0.0 {
                            (x - y).abs() / range
                        } else {
                            0.0
                        }
                    }
                };
            }
            DistanceMetric::Euclidean => acc += ((x - y) / stats.scale()).powi(2),
            DistanceMetric::Manhattan => acc += ((x - y) / stats.scale()).abs(),
        }
    }
    match metric {
        DistanceMetric::Gower => acc / p as f64,
        DistanceMetric::Euclidean => acc.sqrt(),
        DistanceMetric::Manhattan => acc,
    }
}

/// Distance of every row of `raw` from its first row.
pub fn distances_from_first(
    raw: &Dataset,
    features: &[FeatureStats],
    metric: DistanceMetric,
) -> Result<Array1<f64>> {
    if raw.ncols() != features.len() {
        return Err(LimeError::IncompatibleDimensions(format!(
            "Samples have {} features, statistics describe {}.",
            raw.ncols(),
            features.len()
        )));
    }
    if raw.nrows() == 0 {
        return Err(LimeError::InvalidInput("No samples to weigh.".to_string()));
    }
    let origin = raw.row(0);
    Ok(raw
        .rows()
        .into_iter()
        .map(|row| distance(origin, row, features, metric))
        .collect())
}

/// Turns distances into similarity weights in `[0, 1]`.
///
/// Gower distances are already bounded and map to `1 - d`; the others go
/// through the exponential kernel `sqrt(exp(-d^2 / width^2))`.
pub fn similarity_weights(
    distances: &Array1<f64>,
    metric: DistanceMetric,
    kernel_width: f64,
) -> Result<Array1<f64>> {
    match metric {
        DistanceMetric::Gower => Ok(distances.mapv(|d| (1.0 - d).clamp(0.0, 1.0))),
        _ => {
            if kernel_width.is_nan() || kernel_width <= 0.0 {
                return Err(LimeError::InvalidInput(format!(
                    "Kernel width must be positive, got {}.",
                    kernel_width
                )));
            }
            let w2 = kernel_width * kernel_width;
            Ok(distances.mapv(|d| (-(d * d) / w2).exp().sqrt()))
        }
    }
}
