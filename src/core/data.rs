// src/core/data.rs
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a single data instance (a row of features).
pub type Instance = Array1<f64>;

/// Represents a dataset (multiple instances, e.g., training data or perturbations).
pub type Dataset = Array2<f64>;

/// How a feature is treated when perturbing and describing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Continuous,
    /// Values are category codes; equality is all that matters.
    Categorical,
}

/// One feature's contribution to a label in a local surrogate model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    /// Column index in the original feature space.
    pub feature: usize,
    pub name: String,
    /// Human readable condition, e.g. `0.81 < Freedom <= 0.93`.
    pub description: String,
    /// The explained instance's raw value for this feature.
    pub value: f64,
    /// Surrogate coefficient. Positive supports the label, negative contradicts it.
    pub weight: f64,
}

impl FeatureWeight {
    pub fn supports(&self) -> bool {
        self.weight > 0.0
    }
}

/// Local surrogate fitted for one class label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelExplanation {
    pub label: usize,
    pub label_name: String,
    /// Model probability of this label for the explained instance.
    pub label_prob: f64,
    /// Weighted r² of the surrogate on the perturbed samples.
    pub model_r2: f64,
    pub model_intercept: f64,
    /// Surrogate prediction for the explained instance.
    pub model_prediction: f64,
    /// Sorted by absolute weight, largest first.
    pub features: Vec<FeatureWeight>,
}

/// Represents the output of a LIME explanation for a single instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Case identifier, e.g. a country name or a row number.
    pub case: String,
    /// The model's class probabilities for the instance.
    pub probabilities: Vec<f64>,
    /// Argmax of `probabilities`.
    pub predicted_label: usize,
    pub labels: Vec<LabelExplanation>,
}

impl Explanation {
    pub fn label(&self, label: usize) -> Option<&LabelExplanation> {
        self.labels.iter().find(|l| l.label == label)
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Explanation for case '{}':", self.case)?;
        writeln!(f, "  Predicted label: {}", self.predicted_label)?;
        for label in &self.labels {
            writeln!(
                f,
                "  Label {} ({}): probability {:.4}, explanation fit {:.4}",
                label.label, label.label_name, label.label_prob, label.model_r2
            )?;
            for fw in &label.features {
                writeln!(f, "    {:<40} {:>9.4}", fw.description, fw.weight)?;
            }
        }
        Ok(())
    }
}

/// Index of the largest value; ties go to the lower index. `None` when empty.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
