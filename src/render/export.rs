// src/render/export.rs

use crate::core::{Explanation, Result};
use serde::Serialize;
use std::io::Write;

/// One row per (case, label, feature).
#[derive(Debug, Serialize)]
struct ExplanationRow<'a> {
    case: &'a str,
    label: &'a str,
    label_prob: f64,
    model_r2: f64,
    model_intercept: f64,
    model_prediction: f64,
    feature: &'a str,
    feature_value: f64,
    feature_weight: f64,
    feature_desc: &'a str,
}

/// Writes explanations as a tidy CSV table with a header row.
pub fn write_explanations_csv<W: Write>(writer: W, explanations: &[Explanation]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0usize;
    for e in explanations {
        for label in &e.labels {
            for fw in &label.features {
                csv_writer.serialize(ExplanationRow {
                    case: &e.case,
                    label: &label.label_name,
                    label_prob: label.label_prob,
                    model_r2: label.model_r2,
                    model_intercept: label.model_intercept,
                    model_prediction: label.model_prediction,
                    feature: &fw.name,
                    feature_value: fw.value,
                    feature_weight: fw.weight,
                    feature_desc: &fw.description,
                })?;
                rows += 1;
            }
        }
    }
    csv_writer.flush()?;
    log::debug!("Wrote {} explanation rows", rows);
    Ok(())
}
