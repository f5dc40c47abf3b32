// src/traits.rs
use crate::core::{Dataset, LimeError, Result};
use ndarray::Array2;

/// A classifier treated as a black box: rows in, class probabilities out.
pub trait ProbabilisticClassifier {
    /// Returns an `(instances.nrows(), num_classes())` matrix of probabilities.
    fn predict_proba(&self, instances: &Dataset) -> Result<Array2<f64>>;

    fn num_features(&self) -> usize;

    fn class_names(&self) -> &[String];

    fn num_classes(&self) -> usize {
        self.class_names().len()
    }
}

impl<M: ProbabilisticClassifier + ?Sized> ProbabilisticClassifier for &M {
    fn predict_proba(&self, instances: &Dataset) -> Result<Array2<f64>> {
        (**self).predict_proba(instances)
    }

    fn num_features(&self) -> usize {
        (**self).num_features()
    }

    fn class_names(&self) -> &[String] {
        (**self).class_names()
    }
}

/// Queries the model and checks its answer is usable.
pub(crate) fn query_model<M: ProbabilisticClassifier + ?Sized>(
    model: &M,
    instances: &Dataset,
) -> Result<Array2<f64>> {
    let probabilities = model.predict_proba(instances)?;
    let expected = (instances.nrows(), model.num_classes());
    if probabilities.dim() != expected {
        return Err(LimeError::ModelPredictionError(format!(
            "Model returned a {:?} probability matrix, expected {:?}.",
            probabilities.dim(),
            expected
        )));
    }
    if let Some(bad) = probabilities.iter().find(|p| !p.is_finite()) {
        return Err(LimeError::ModelPredictionError(format!(
            "Model returned a non-finite probability: {}",
            bad
        )));
    }
    Ok(probabilities)
}
