// src/model/mlp.rs

use crate::core::{argmax, Dataset, LimeError, Result};
use crate::dataset::{Standardizer, TabularData, TrainingSplit};
use crate::traits::ProbabilisticClassifier;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Hyperparameters of a multi-layer perceptron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpParams {
    /// Units per hidden layer.
    pub hidden: Vec<usize>,
    pub learning_rate: f64,
    pub momentum: f64,
    /// L2 penalty on weights (biases are not decayed).
    pub weight_decay: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for MlpParams {
    fn default() -> Self {
        MlpParams {
            hidden: vec![5],
            learning_rate: 0.1,
            momentum: 0.9,
            weight_decay: 0.0,
            epochs: 300,
            batch_size: 16,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Layer {
    /// `(inputs, outputs)`
    weights: Array2<f64>,
    bias: Array1<f64>,
}

/// Feed-forward classifier: logistic hidden units, softmax output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    params: MlpParams,
    feature_names: Vec<String>,
    class_names: Vec<String>,
    standardizer: Standardizer,
    layers: Vec<Layer>,
    /// Rows of the source dataset the model was fitted on, when known.
    #[serde(default)]
    training_split: Option<TrainingSplit>,
}

fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax_rows(z: &mut Array2<f64>) {
    for mut row in z.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
}

fn forward(layers: &[Layer], input: Dataset) -> Vec<Array2<f64>> {
    let mut activations = Vec::with_capacity(layers.len() + 1);
    activations.push(input);
    for (i, layer) in layers.iter().enumerate() {
        let mut z = activations[i].dot(&layer.weights) + &layer.bias;
        if i + 1 == layers.len() {
            softmax_rows(&mut z);
        } else {
            z.mapv_inplace(logistic);
        }
        activations.push(z);
    }
    activations
}

impl MlpClassifier {
    pub fn fit(
        x: &Dataset,
        y: &[usize],
        feature_names: Vec<String>,
        class_names: Vec<String>,
        params: MlpParams,
    ) -> Result<Self> {
        let (n, p) = x.dim();
        let k = class_names.len();
        if y.len() != n {
            return Err(LimeError::IncompatibleDimensions(format!(
                "{} rows of features but {} labels.",
                n,
                y.len()
            )));
        }
        if n == 0 {
            return Err(LimeError::InvalidInput("Cannot fit with zero samples.".to_string()));
        }
        if feature_names.len() != p {
            return Err(LimeError::IncompatibleDimensions(format!(
                "{} feature names for {} columns.",
                feature_names.len(),
                p
            )));
        }
        if k < 2 {
            return Err(LimeError::InvalidInput("At least 2 classes are needed.".to_string()));
        }
        if let Some(&bad) = y.iter().find(|&&l| l >= k) {
            return Err(LimeError::InvalidInput(format!(
                "Label {} out of range for {} classes.",
                bad, k
            )));
        }
        if params.hidden.iter().any(|&h| h == 0) || params.batch_size == 0 || params.learning_rate <= 0.0 {
            return Err(LimeError::InvalidInput(format!(
                "Invalid MLP parameters: {:?}",
                params
            )));
        }

        let standardizer = Standardizer::fit(x)?;
        let xs = standardizer.transform(x)?;
        let mut targets = Array2::<f64>::zeros((n, k));
        for (i, &l) in y.iter().enumerate() {
            targets[[i, l]] = 1.0;
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut sizes = vec![p];
        sizes.extend_from_slice(&params.hidden);
        sizes.push(k);
        let mut layers: Vec<Layer> = sizes
            .windows(2)
            .map(|w| {
                let limit = (6.0 / (w[0] + w[1]) as f64).sqrt();
                let init = Uniform::new_inclusive(-limit, limit);
                Layer {
                    weights: Array2::from_shape_fn((w[0], w[1]), |_| init.sample(&mut rng)),
                    bias: Array1::zeros(w[1]),
                }
            })
            .collect();
        let mut velocity: Vec<(Array2<f64>, Array1<f64>)> = layers
            .iter()
            .map(|l| (Array2::zeros(l.weights.dim()), Array1::zeros(l.bias.len())))
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        for epoch in 0..params.epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;
            for batch in order.chunks(params.batch_size) {
                let xb = xs.select(Axis(0), batch);
                let yb = targets.select(Axis(0), batch);
                let m = batch.len() as f64;
                let acts = forward(&layers, xb);

                let out = &acts[acts.len() - 1];
                epoch_loss -= (&yb * &out.mapv(|v| v.max(1e-12).ln())).sum();

                // softmax + cross-entropy gradient
                let mut delta = (out - &yb) / m;
                for li in (0..layers.len()).rev() {
                    let grad_w = acts[li].t().dot(&delta) + &(&layers[li].weights * params.weight_decay);
                    let grad_b = delta.sum_axis(Axis(0));
                    if li > 0 {
                        let a = &acts[li];
                        delta = delta.dot(&layers[li].weights.t()) * &a.mapv(|v| v * (1.0 - v));
                    }
                    let (vw, vb) = &mut velocity[li];
                    *vw = &*vw * params.momentum - &(grad_w * params.learning_rate);
                    *vb = &*vb * params.momentum - &(grad_b * params.learning_rate);
                    layers[li].weights += &*vw;
                    layers[li].bias += &*vb;
                }
            }
            if epoch % 50 == 0 || epoch + 1 == params.epochs {
                log::trace!("epoch {}: mean cross-entropy {:.5}", epoch, epoch_loss / n as f64);
            }
        }

        Ok(MlpClassifier {
            params,
            feature_names,
            class_names,
            standardizer,
            layers,
            training_split: None,
        })
    }

    pub fn params(&self) -> &MlpParams {
        &self.params
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn training_split(&self) -> Option<TrainingSplit> {
        self.training_split
    }

    pub fn with_training_split(mut self, split: TrainingSplit) -> Self {
        self.training_split = Some(split);
        self
    }

    /// Checks that `data` has the features and classes the model was trained on.
    pub fn check_matches(&self, data: &TabularData) -> Result<()> {
        if self.feature_names != data.feature_names {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Model was trained on features {:?}, data has {:?}.",
                self.feature_names, data.feature_names
            )));
        }
        if self.class_names != data.class_names {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Model predicts classes {:?}, data is labelled {:?}.",
                self.class_names, data.class_names
            )));
        }
        Ok(())
    }

    pub fn predict(&self, x: &Dataset) -> Result<Vec<usize>> {
        let probs = self.predict_proba(x)?;
        probs
            .rows()
            .into_iter()
            .map(|r| {
                argmax(&r.to_vec()).ok_or_else(|| {
                    LimeError::InternalError("Empty probability row.".to_string())
                })
            })
            .collect()
    }

    /// Fraction of rows whose predicted class equals the label.
    pub fn accuracy(&self, x: &Dataset, y: &[usize]) -> Result<f64> {
        if y.len() != x.nrows() {
            return Err(LimeError::IncompatibleDimensions(format!(
                "{} rows of features but {} labels.",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Ok(0.0);
        }
        let predicted = self.predict(x)?;
        let correct = predicted.iter().zip(y).filter(|(a, b)| a == b).count();
        Ok(correct as f64 / y.len() as f64)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, self)?;
        log::info!("Saved model to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let model: MlpClassifier = serde_json::from_reader(reader)?;
        model.check_shapes()?;
        log::info!("Loaded model from {}", path.as_ref().display());
        Ok(model)
    }

    fn check_shapes(&self) -> Result<()> {
        let mut width = self.feature_names.len();
        if self.standardizer.means.len() != width || self.standardizer.scales.len() != width {
            return Err(LimeError::InvalidInput(
                "Model file: standardizer does not match the feature count.".to_string(),
            ));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.nrows() != width || layer.bias.len() != layer.weights.ncols() {
                return Err(LimeError::InvalidInput(format!(
                    "Model file: layer {} has inconsistent shapes.",
                    i
                )));
            }
            width = layer.weights.ncols();
        }
        if self.layers.is_empty() || width != self.class_names.len() {
            return Err(LimeError::InvalidInput(
                "Model file: output layer does not match the class count.".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for MlpClassifier {
    fn predict_proba(&self, instances: &Dataset) -> Result<Array2<f64>> {
        let input = self.standardizer.transform(instances)?;
        let mut acts = forward(&self.layers, input);
        acts.pop()
            .ok_or_else(|| LimeError::InternalError("Model has no layers.".to_string()))
    }

    fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    /// Three blobs along the first feature; the second feature is noise.
    fn blobs(n_per_class: usize, seed: u64) -> (Dataset, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Array2::zeros((3 * n_per_class, 2));
        let mut y = Vec::with_capacity(3 * n_per_class);
        for class in 0..3 {
            for i in 0..n_per_class {
                let row = class * n_per_class + i;
                x[[row, 0]] = class as f64 * 4.0 + rng.gen_range(-1.0..1.0);
                x[[row, 1]] = rng.gen_range(0.0..10.0);
                y.push(class);
            }
        }
        (x, y)
    }

    fn names() -> (Vec<String>, Vec<String>) {
        (
            vec!["a".to_string(), "b".to_string()],
            vec!["low".to_string(), "medium".to_string(), "high".to_string()],
        )
    }

    #[test]
    fn learns_separable_classes() -> Result<()> {
        let (x, y) = blobs(30, 1);
        let (f, c) = names();
        let model = MlpClassifier::fit(&x, &y, f, c, MlpParams::default())?;
        assert!(model.accuracy(&x, &y)? > 0.95);
        let probs = model.predict_proba(&x)?;
        for row in probs.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn training_is_deterministic_for_a_seed() -> Result<()> {
        let (x, y) = blobs(10, 2);
        let (f, c) = names();
        let params = MlpParams { epochs: 20, ..MlpParams::default() };
        let a = MlpClassifier::fit(&x, &y, f.clone(), c.clone(), params.clone())?;
        let b = MlpClassifier::fit(&x, &y, f, c, params)?;
        assert_eq!(a.predict_proba(&x)?, b.predict_proba(&x)?);
        Ok(())
    }

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let (x, y) = blobs(10, 3);
        let (f, c) = names();
        let model = MlpClassifier::fit(&x, &y, f, c, MlpParams { epochs: 10, ..MlpParams::default() })?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model.json");
        model.save(&path)?;
        let loaded = MlpClassifier::load(&path)?;
        assert_eq!(loaded.params(), model.params());
        assert_eq!(loaded.training_split(), None);
        let (pa, pb) = (model.predict_proba(&x)?, loaded.predict_proba(&x)?);
        for (a, b) in pa.iter().zip(pb.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn rejects_inconsistent_training_input() {
        let (x, y) = blobs(5, 4);
        let (f, c) = names();
        assert!(MlpClassifier::fit(&x, &y[1..], f.clone(), c.clone(), MlpParams::default()).is_err());
        assert!(MlpClassifier::fit(&x, &y, f.clone(), vec!["one".to_string()], MlpParams::default()).is_err());
        let bad = MlpParams { hidden: vec![0], ..MlpParams::default() };
        assert!(MlpClassifier::fit(&x, &y, f, c, bad).is_err());
    }

    #[test]
    fn predict_rejects_wrong_width() -> Result<()> {
        let (x, y) = blobs(5, 5);
        let (f, c) = names();
        let model = MlpClassifier::fit(&x, &y, f, c, MlpParams { epochs: 1, ..MlpParams::default() })?;
        assert!(model.predict_proba(&Array2::zeros((1, 3))).is_err());
        Ok(())
    }

    #[test]
    fn training_split_survives_save_and_load() -> Result<()> {
        let (x, y) = blobs(5, 6);
        let (f, c) = names();
        let split = TrainingSplit { train_fraction: 0.6, seed: 7 };
        let model = MlpClassifier::fit(&x, &y, f, c, MlpParams { epochs: 1, ..MlpParams::default() })?
            .with_training_split(split);
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model.json");
        model.save(&path)?;
        assert_eq!(MlpClassifier::load(&path)?.training_split(), Some(split));
        Ok(())
    }

    #[test]
    fn mismatched_classes_are_rejected() -> Result<()> {
        let (x, y) = blobs(5, 7);
        let (f, c) = names();
        let model = MlpClassifier::fit(&x, &y, f.clone(), c.clone(), MlpParams { epochs: 1, ..MlpParams::default() })?;
        let data = TabularData::new((0..15).map(|i| i.to_string()).collect(), f.clone(), x.clone(), y.clone(), c)?;
        model.check_matches(&data)?;

        let four: Vec<String> = (0..4).map(|i| format!("level_{}", i)).collect();
        let relabelled = TabularData::new(data.ids.clone(), f, x, y, four)?;
        assert!(matches!(
            model.check_matches(&relabelled),
            Err(LimeError::IncompatibleDimensions(_))
        ));

        let mut renamed = data;
        renamed.feature_names = vec!["a".to_string(), "z".to_string()];
        assert!(model.check_matches(&renamed).is_err());
        Ok(())
    }
}
