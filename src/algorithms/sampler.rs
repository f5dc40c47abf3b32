// src/algorithms/sampler.rs

use crate::algorithms::discretize::{BinningStrategy, Discretizer};
use crate::core::{Dataset, FeatureKind, LimeError, Result};
use crate::utils::mean_std;
use ndarray::ArrayView1;
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

/// How a feature is resampled and mapped into the surrogate's input space.
#[derive(Debug, Clone)]
pub enum FeatureEncoding {
    /// Continuous feature replaced by its bin; surrogate sees "same bin as the instance".
    Binned(Discretizer),
    /// Continuous feature kept as is; surrogate sees the standardized value.
    Scaled,
    /// Surrogate sees "same category as the instance".
    Categorical { values: Vec<f64>, frequencies: Vec<f64> },
}

/// Training-set statistics for one feature.
#[derive(Debug, Clone)]
pub struct FeatureStats {
    pub name: String,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub max: f64,
    pub encoding: FeatureEncoding,
}

impl FeatureStats {
    pub fn fit(
        name: &str,
        column: ArrayView1<f64>,
        kind: FeatureKind,
        bin_continuous: bool,
        n_bins: usize,
        strategy: BinningStrategy,
    ) -> Result<Self> {
        if column.is_empty() {
            return Err(LimeError::InvalidInput(format!(
                "Feature '{}' has no training values.",
                name
            )));
        }
        if let Some(bad) = column.iter().find(|v| !v.is_finite()) {
            return Err(LimeError::InvalidInput(format!(
                "Feature '{}' has a non-finite training value: {}",
                name, bad
            )));
        }
        let (mean, sd) = mean_std(column);
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let encoding = match kind {
            FeatureKind::Categorical => {
                let mut values: Vec<f64> = Vec::new();
                let mut counts: Vec<usize> = Vec::new();
                for &v in column.iter() {
                    match values.iter().position(|&c| c == v) {
                        Some(i) => counts[i] += 1,
                        None => {
                            values.push(v);
                            counts.push(1);
                        }
                    }
                }
                let total = column.len() as f64;
                FeatureEncoding::Categorical {
                    values,
                    frequencies: counts.into_iter().map(|c| c as f64 / total).collect(),
                }
            }
            FeatureKind::Continuous if bin_continuous => {
                FeatureEncoding::Binned(Discretizer::fit(column, n_bins, strategy)?)
            }
            FeatureKind::Continuous => FeatureEncoding::Scaled,
        };

        Ok(FeatureStats { name: name.to_string(), mean, sd, min, max, encoding })
    }

    pub fn kind(&self) -> FeatureKind {
        match self.encoding {
            FeatureEncoding::Categorical { .. } => FeatureKind::Categorical,
            _ => FeatureKind::Continuous,
        }
    }

    /// Standard deviation used for scaling; 1 for constant columns.
    pub fn scale(&self) -> f64 {
        if self.sd > 0.0 {
            self.sd
        } else {
            1.0
        }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Value of this feature in the surrogate's input space for a sampled raw value.
    pub fn interpretable(&self, instance_value: f64, sampled: f64) -> f64 {
        match &self.encoding {
            FeatureEncoding::Binned(d) => {
                if d.bin_of(sampled) == d.bin_of(instance_value) {
                    1.0
                } else {
                    0.0
                }
            }
            FeatureEncoding::Scaled => (sampled - self.mean) / self.scale(),
            FeatureEncoding::Categorical { .. } => {
                if sampled == instance_value {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Condition shown next to this feature's weight.
    pub fn describe(&self, instance_value: f64) -> String {
        match &self.encoding {
            FeatureEncoding::Binned(d) => d.describe(d.bin_of(instance_value), &self.name),
            FeatureEncoding::Scaled => self.name.clone(),
            FeatureEncoding::Categorical { .. } => {
                if instance_value.fract() == 0.0 {
                    format!("{} = {}", self.name, instance_value as i64)
                } else {
                    format!("{} = {}", self.name, instance_value)
                }
            }
        }
    }
}

/// Per-feature sampling distribution, built once per explanation.
enum Draw {
    Binned {
        bins: WeightedIndex<f64>,
        ranges: Vec<(f64, f64)>,
    },
    Normal(Normal<f64>),
    Categorical {
        index: WeightedIndex<f64>,
        values: Vec<f64>,
    },
}

impl Draw {
    fn new(stats: &FeatureStats) -> Result<Self> {
        let weighted = |w: Vec<f64>| {
            WeightedIndex::<f64>::new(w).map_err(|e| {
                LimeError::InternalError(format!(
                    "Cannot sample feature '{}': {}",
                    stats.name, e
                ))
            })
        };
        Ok(match &stats.encoding {
            FeatureEncoding::Binned(d) => Draw::Binned {
                bins: weighted(d.bins().iter().map(|b| b.frequency).collect())?,
                ranges: d.bins().iter().map(|b| (b.lower, b.upper)).collect(),
            },
            FeatureEncoding::Scaled => Draw::Normal(Normal::new(stats.mean, stats.sd).map_err(|e| {
                LimeError::InternalError(format!("Cannot sample feature '{}': {}", stats.name, e))
            })?),
            FeatureEncoding::Categorical { values, frequencies } => Draw::Categorical {
                index: weighted(frequencies.clone())?,
                values: values.clone(),
            },
        })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Draw::Binned { bins, ranges } => {
                let bin = bins.sample(rng);
                let (lower, upper) = ranges[bin];
                draw_in_bin(lower, upper, bin > 0, rng)
            }
            Draw::Normal(normal) => normal.sample(rng),
            Draw::Categorical { index, values } => values[index.sample(rng)],
        }
    }
}

/// Uniform value in `[lower, upper]`, or in `(lower, upper]` when the lower
/// edge is a cut point owned by the previous bin.
fn draw_in_bin<R: Rng + ?Sized>(lower: f64, upper: f64, lower_open: bool, rng: &mut R) -> f64 {
    if lower >= upper {
        return upper;
    }
    let uniform = Uniform::new_inclusive(lower, upper);
    loop {
        let v = uniform.sample(rng);
        if !lower_open || v > lower {
            return v;
        }
    }
}

/// Perturbed neighbours of an instance in both representations.
#[derive(Debug, Clone)]
pub struct PerturbedSamples {
    /// Rows in the original feature space; fed to the model.
    pub raw: Dataset,
    /// Rows in the surrogate's input space.
    pub interpretable: Dataset,
}

/// Generates synthetic neighbours of an instance from training statistics.
pub struct PerturbationSampler<'a> {
    features: &'a [FeatureStats],
}

impl<'a> PerturbationSampler<'a> {
    pub fn new(features: &'a [FeatureStats]) -> Self {
        PerturbationSampler { features }
    }

    /// Draws `n_samples` rows; row 0 is always the instance itself.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        instance: ArrayView1<f64>,
        n_samples: usize,
        rng: &mut R,
    ) -> Result<PerturbedSamples> {
        let p = self.features.len();
        if instance.len() != p {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Instance has {} features, sampler expects {}.",
                instance.len(),
                p
            )));
        }
        if n_samples < 2 {
            return Err(LimeError::InvalidInput(format!(
                "At least 2 perturbation samples are needed, got {}.",
                n_samples
            )));
        }

        let draws = self
            .features
            .iter()
            .map(Draw::new)
            .collect::<Result<Vec<_>>>()?;

        let mut raw = Dataset::zeros((n_samples, p));
        let mut interpretable = Dataset::zeros((n_samples, p));
        for (j, (stats, draw)) in self.features.iter().zip(&draws).enumerate() {
            let x = instance[j];
            raw[[0, j]] = x;
            interpretable[[0, j]] = stats.interpretable(x, x);
            for i in 1..n_samples {
                let v = draw.sample(rng);
                raw[[i, j]] = v;
                interpretable[[i, j]] = stats.interpretable(x, v);
            }
        }
        log::debug!("Drew {} perturbations over {} features", n_samples, p);

        Ok(PerturbedSamples { raw, interpretable })
    }
}
