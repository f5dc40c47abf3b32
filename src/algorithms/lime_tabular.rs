// src/algorithms/lime_tabular.rs

use crate::algorithms::discretize::BinningStrategy;
use crate::algorithms::kernel::{default_kernel_width, distances_from_first, similarity_weights, DistanceMetric};
use crate::algorithms::sampler::{FeatureStats, PerturbationSampler, PerturbedSamples};
use crate::algorithms::selection::FeatureSelection;
use crate::algorithms::surrogate::WeightedDesign;
use crate::core::{argmax, Dataset, Explanation, FeatureKind, FeatureWeight, LabelExplanation, LimeError, Result};
use crate::traits::{query_model, ProbabilisticClassifier};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Configuration for the tabular LIME explainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimeConfig {
    /// Perturbed samples drawn per explanation, the instance included.
    pub n_permutations: usize,
    pub n_bins: usize,
    pub binning: BinningStrategy,
    /// Replace continuous features by their bins when perturbing and explaining.
    pub bin_continuous: bool,
    pub distance: DistanceMetric,
    /// Width of the exponential kernel; `0.75 * sqrt(p)` when unset. Unused for Gower.
    pub kernel_width: Option<f64>,
    pub feature_selection: FeatureSelection,
    pub ridge_lambda: f64,
    pub seed: Option<u64>,
}

impl Default for LimeConfig {
    fn default() -> Self {
        LimeConfig {
            n_permutations: 5000,
            n_bins: 4,
            binning: BinningStrategy::Quantile,
            bin_continuous: true,
            distance: DistanceMetric::Gower,
            kernel_width: None,
            feature_selection: FeatureSelection::Auto,
            ridge_lambda: 0.001,
            seed: None,
        }
    }
}

/// Which class labels to fit surrogates for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChoice {
    /// The `k` most probable labels for the instance.
    Top(usize),
    Labels(Vec<usize>),
}

/// Everything besides the model and training rows the explainer needs to know.
#[derive(Debug, Clone, Default)]
pub struct ExplainerOptions {
    /// Defaults to `x0`, `x1`, ...
    pub feature_names: Option<Vec<String>>,
    /// Columns holding category codes rather than measurements.
    pub categorical_features: Vec<usize>,
    pub config: LimeConfig,
}

/// Perturbed samples around one instance with the model's answers and the
/// similarity weights. Row 0 of every member is the instance.
#[derive(Debug, Clone)]
pub struct Neighbourhood {
    pub samples: PerturbedSamples,
    pub probabilities: Array2<f64>,
    pub weights: Array1<f64>,
}

pub struct TabularExplainer<M: ProbabilisticClassifier> {
    model: M,
    features: Vec<FeatureStats>,
    config: LimeConfig,
    rng: Mutex<StdRng>,
}

impl<M: ProbabilisticClassifier> TabularExplainer<M> {
    pub fn new(model: M, training: &Dataset, options: ExplainerOptions) -> Result<Self> {
        let num_features = model.num_features();

        if training.is_empty() {
            return Err(LimeError::InvalidInput(
                "Training data cannot be empty.".to_string(),
            ));
        }

        if training.ncols() != num_features {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Training data has {} features, but model expects {}.",
                training.ncols(),
                num_features
            )));
        }

        if model.num_classes() < 2 {
            return Err(LimeError::InvalidInput(format!(
                "A classifier needs at least 2 classes, model reports {}.",
                model.num_classes()
            )));
        }

        let names = match options.feature_names {
            Some(names) if names.len() != num_features => {
                return Err(LimeError::IncompatibleDimensions(format!(
                    "{} feature names given for {} features.",
                    names.len(),
                    num_features
                )));
            }
            Some(names) => names,
            None => (0..num_features).map(|j| format!("x{}", j)).collect(),
        };

        if let Some(&bad) = options.categorical_features.iter().find(|&&j| j >= num_features) {
            return Err(LimeError::InvalidInput(format!(
                "Categorical feature index {} is out of range for {} features.",
                bad, num_features
            )));
        }

        let config = options.config;
        if config.n_permutations < 2 {
            return Err(LimeError::InvalidInput(format!(
                "n_permutations must be at least 2, got {}.",
                config.n_permutations
            )));
        }

        let features = names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let kind = if options.categorical_features.contains(&j) {
                    FeatureKind::Categorical
                } else {
                    FeatureKind::Continuous
                };
                FeatureStats::fit(
                    name,
                    training.column(j),
                    kind,
                    config.bin_continuous,
                    config.n_bins,
                    config.binning,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::debug!(
            "Fitted explainer statistics for {} features over {} training rows",
            num_features,
            training.nrows()
        );

        Ok(TabularExplainer {
            model,
            features,
            config,
            rng: Mutex::new(rng),
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &LimeConfig {
        &self.config
    }

    pub fn feature_stats(&self) -> &[FeatureStats] {
        &self.features
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn explain(
        &self,
        instance: ArrayView1<f64>,
        labels: &LabelChoice,
        n_features: usize,
    ) -> Result<Explanation> {
        self.explain_case("", instance, labels, n_features)
    }

    pub fn explain_case(
        &self,
        case: &str,
        instance: ArrayView1<f64>,
        labels: &LabelChoice,
        n_features: usize,
    ) -> Result<Explanation> {
        if instance.len() != self.num_features() {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Instance to explain has {} features, but explainer expects {}.",
                instance.len(),
                self.num_features()
            )));
        }
        if let Some(bad) = instance.iter().find(|v| !v.is_finite()) {
            return Err(LimeError::InvalidInput(format!(
                "Instance to explain has a non-finite value: {}",
                bad
            )));
        }
        if n_features == 0 {
            return Err(LimeError::InvalidInput(
                "n_features must be at least 1.".to_string(),
            ));
        }

        let Neighbourhood {
            samples,
            probabilities,
            weights,
        } = self.neighbourhood(instance)?;

        let instance_probs: Vec<f64> = probabilities.row(0).to_vec();
        let predicted_label = argmax(&instance_probs).ok_or_else(|| {
            LimeError::InternalError("Model returned no class probabilities.".to_string())
        })?;
        let chosen = self.resolve_labels(labels, &instance_probs)?;
        let class_names = self.model.class_names();

        let mut label_explanations = Vec::with_capacity(chosen.len());
        for label in chosen {
            let design = WeightedDesign::new(
                samples.interpretable.view(),
                probabilities.column(label),
                weights.view(),
            )?;
            let selected = self
                .config
                .feature_selection
                .select(&design, n_features, self.config.ridge_lambda)?;
            let fit = design.ridge_on(&selected, self.config.ridge_lambda)?;

            let mut features: Vec<FeatureWeight> = fit
                .features
                .iter()
                .zip(fit.coefficients.iter())
                .map(|(&j, &weight)| FeatureWeight {
                    feature: j,
                    name: self.features[j].name.clone(),
                    description: self.features[j].describe(instance[j]),
                    value: instance[j],
                    weight,
                })
                .collect();
            features.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()).then(a.feature.cmp(&b.feature)));

            log::debug!(
                "Case '{}' label {}: r2 {:.4} with {} features",
                case,
                label,
                fit.r2,
                features.len()
            );

            label_explanations.push(LabelExplanation {
                label,
                label_name: class_names[label].clone(),
                label_prob: instance_probs[label],
                model_r2: fit.r2,
                model_intercept: fit.intercept,
                model_prediction: fit.predict(samples.interpretable.row(0)),
                features,
            });
        }

        Ok(Explanation {
            case: case.to_string(),
            probabilities: instance_probs,
            predicted_label,
            labels: label_explanations,
        })
    }

    /// Perturbs `instance`, queries the model once for every sample and
    /// weighs the samples by their similarity to the instance.
    pub fn neighbourhood(&self, instance: ArrayView1<f64>) -> Result<Neighbourhood> {
        let samples = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| LimeError::InternalError("Explainer RNG lock poisoned.".to_string()))?;
            PerturbationSampler::new(&self.features).sample(
                instance,
                self.config.n_permutations,
                &mut *rng,
            )?
        };

        let probabilities = query_model(&self.model, &samples.raw)?;
        let distances = distances_from_first(&samples.raw, &self.features, self.config.distance)?;
        let kernel_width = self
            .config
            .kernel_width
            .unwrap_or_else(|| default_kernel_width(self.num_features()));
        let weights = similarity_weights(&distances, self.config.distance, kernel_width)?;

        Ok(Neighbourhood {
            samples,
            probabilities,
            weights,
        })
    }

    /// Explains every row of `instances`; `cases` names the rows.
    pub fn explain_many(
        &self,
        cases: &[String],
        instances: &Dataset,
        labels: &LabelChoice,
        n_features: usize,
    ) -> Result<Vec<Explanation>> {
        if cases.len() != instances.nrows() {
            return Err(LimeError::IncompatibleDimensions(format!(
                "{} case names given for {} instances.",
                cases.len(),
                instances.nrows()
            )));
        }
        cases
            .iter()
            .zip(instances.rows())
            .map(|(case, row)| self.explain_case(case, row, labels, n_features))
            .collect()
    }

    fn resolve_labels(&self, labels: &LabelChoice, probs: &[f64]) -> Result<Vec<usize>> {
        let num_classes = probs.len();
        match labels {
            LabelChoice::Top(k) => {
                if *k == 0 || *k > num_classes {
                    return Err(LimeError::InvalidInput(format!(
                        "Cannot explain the top {} labels of a {}-class model.",
                        k, num_classes
                    )));
                }
                let mut order: Vec<usize> = (0..num_classes).collect();
                order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]).then(a.cmp(&b)));
                order.truncate(*k);
                Ok(order)
            }
            LabelChoice::Labels(list) => {
                if list.is_empty() {
                    return Err(LimeError::InvalidInput(
                        "No labels to explain.".to_string(),
                    ));
                }
                if let Some(&bad) = list.iter().find(|&&l| l >= num_classes) {
                    return Err(LimeError::InvalidInput(format!(
                        "Label {} does not exist in a {}-class model.",
                        bad, num_classes
                    )));
                }
                Ok(list.clone())
            }
        }
    }
}
