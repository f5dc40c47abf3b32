//! Plain-text renderings of explanations.

pub mod boxplot;
pub mod export;

pub use boxplot::{render_boxplots, Boxplots, BoxplotSummary};
pub use export::write_explanations_csv;

use crate::core::{Explanation, FeatureWeight};
use std::fmt;

fn verdict(fw: &FeatureWeight) -> &'static str {
    if fw.supports() {
        "Supports"
    } else {
        "Contradicts"
    }
}

/// Support/contradiction table for every explained label of a case.
pub struct ExplanationTable<'a>(pub &'a Explanation);

impl fmt::Display for ExplanationTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let explanation = self.0;
        for label in &explanation.labels {
            writeln!(f, "Case: {}", explanation.case)?;
            writeln!(f, "Label: {}", label.label_name)?;
            writeln!(f, "Probability: {:.2}", label.label_prob)?;
            writeln!(f, "Explanation Fit: {:.2}", label.model_r2)?;
            let desc_width = label
                .features
                .iter()
                .map(|fw| fw.description.len())
                .max()
                .unwrap_or(0)
                .max("Feature".len());
            writeln!(f, "  {:<w$}  {:>9}  Effect", "Feature", "Weight", w = desc_width)?;
            for fw in &label.features {
                writeln!(
                    f,
                    "  {:<w$}  {:>9.4}  {}",
                    fw.description,
                    fw.weight,
                    verdict(fw),
                    w = desc_width
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn explanation_table(explanation: &Explanation) -> String {
    ExplanationTable(explanation).to_string()
}

/// Horizontal bar chart of feature weights, bars scaled to the largest weight.
///
/// `+` bars support the label, `-` bars contradict it.
pub struct FeatureBars<'a> {
    pub explanation: &'a Explanation,
    pub width: usize,
}

impl fmt::Display for FeatureBars<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let explanation = self.explanation;
        for label in &explanation.labels {
            writeln!(
                f,
                "{} / {} (p = {:.2}, fit = {:.2})",
                explanation.case, label.label_name, label.label_prob, label.model_r2
            )?;
            let max = label
                .features
                .iter()
                .fold(0.0f64, |m, fw| m.max(fw.weight.abs()));
            let desc_width = label.features.iter().map(|fw| fw.description.len()).max().unwrap_or(0);
            for fw in &label.features {
                let len = if max > 0.0 {
                    ((fw.weight.abs() / max) * self.width as f64).round() as usize
                } else {
                    0
                };
                let glyph = if fw.weight >= 0.0 { "+" } else { "-" };
                writeln!(
                    f,
                    "  {:<w$} |{:<bw$}| {:.4}",
                    fw.description,
                    glyph.repeat(len),
                    fw.weight,
                    w = desc_width,
                    bw = self.width
                )?;
            }
        }
        Ok(())
    }
}

pub fn feature_bars(explanation: &Explanation, width: usize) -> String {
    FeatureBars { explanation, width }.to_string()
}

/// Case by feature-condition grid of weights for one label per case.
///
/// Each case contributes its first explained label; cells a case did not
/// select stay empty. Columns are grouped by feature.
pub struct ExplanationHeatmap<'a>(pub &'a [Explanation]);

impl ExplanationHeatmap<'_> {
    /// Distinct `(feature, description)` pairs ordered by feature index.
    fn conditions(&self) -> Vec<(usize, &str)> {
        let mut conditions: Vec<(usize, &str)> = self
            .0
            .iter()
            .filter_map(|e| e.labels.first())
            .flat_map(|label| label.features.iter().map(|fw| (fw.feature, fw.description.as_str())))
            .collect();
        conditions.sort();
        conditions.dedup();
        conditions
    }
}

impl fmt::Display for ExplanationHeatmap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let explanations = self.0;
        let conditions = self.conditions();
        let case_width = explanations
            .iter()
            .map(|e| e.case.len() + e.labels.first().map_or(0, |l| l.label_name.len() + 3))
            .max()
            .unwrap_or(0)
            .max(4);

        write!(f, "{:<w$}", "Case", w = case_width)?;
        for i in 0..conditions.len() {
            write!(f, " {:>8}", format!("[{}]", i + 1))?;
        }
        writeln!(f)?;
        for e in explanations {
            let Some(label) = e.labels.first() else { continue };
            write!(f, "{:<w$}", format!("{} ({})", e.case, label.label_name), w = case_width)?;
            for &(feature, description) in &conditions {
                match label
                    .features
                    .iter()
                    .find(|fw| fw.feature == feature && fw.description == description)
                {
                    Some(fw) => write!(f, " {:>8.3}", fw.weight)?,
                    None => write!(f, " {:>8}", "")?,
                }
            }
            writeln!(f)?;
        }
        for (i, (_, description)) in conditions.iter().enumerate() {
            writeln!(f, "[{}] {}", i + 1, description)?;
        }
        Ok(())
    }
}

pub fn explanation_heatmap(explanations: &[Explanation]) -> String {
    ExplanationHeatmap(explanations).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LabelExplanation;

    fn explanation(case: &str, weights: &[(&str, f64)]) -> Explanation {
        let indexed: Vec<(usize, &str, f64)> =
            weights.iter().enumerate().map(|(i, &(d, w))| (i, d, w)).collect();
        explanation_with(case, &indexed)
    }

    fn explanation_with(case: &str, weights: &[(usize, &str, f64)]) -> Explanation {
        Explanation {
            case: case.to_string(),
            probabilities: vec![0.2, 0.8],
            predicted_label: 1,
            labels: vec![LabelExplanation {
                label: 1,
                label_name: "high".to_string(),
                label_prob: 0.8,
                model_r2: 0.42,
                model_intercept: 0.3,
                model_prediction: 0.75,
                features: weights
                    .iter()
                    .map(|&(i, d, w)| FeatureWeight {
                        feature: i,
                        name: format!("f{}", i),
                        description: d.to_string(),
                        value: 1.0,
                        weight: w,
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn table_marks_support_and_contradiction() {
        let e = explanation("Norway", &[("1.2 < Family", 0.3), ("Trust <= 0.1", -0.1)]);
        let table = explanation_table(&e);
        assert!(table.contains("Case: Norway"));
        assert!(table.contains("Probability: 0.80"));
        assert!(table.contains("Explanation Fit: 0.42"));
        let family = table.lines().find(|l| l.contains("Family")).unwrap_or_default();
        assert!(family.ends_with("Supports"));
        let trust = table.lines().find(|l| l.contains("Trust")).unwrap_or_default();
        assert!(trust.ends_with("Contradicts"));
    }

    #[test]
    fn bars_scale_to_largest_weight() {
        let e = explanation("Togo", &[("a", 0.4), ("b", -0.2)]);
        let chart = feature_bars(&e, 10);
        assert!(chart.contains("|++++++++++|"));
        assert!(chart.contains("|-----     |"));
    }

    #[test]
    fn heatmap_lists_every_condition_once() {
        let a = explanation("A", &[("x <= 1", 0.5), ("y", 0.1)]);
        let b = explanation("B", &[("x <= 1", -0.5)]);
        let grid = explanation_heatmap(&[a, b]);
        assert!(grid.contains("[1] x <= 1"));
        assert!(grid.contains("[2] y"));
        assert_eq!(grid.matches("x <= 1").count(), 1);
        let row_b = grid.lines().find(|l| l.starts_with("B (high)")).unwrap_or_default();
        assert!(row_b.contains("-0.500"));
    }

    #[test]
    fn heatmap_groups_conditions_by_feature() {
        // Feature 0 is Freedom, feature 1 is Economy.
        let a = explanation_with("A", &[(0, "0.81 < Freedom", 0.4), (1, "Economy <= 0.6", -0.2)]);
        let b = explanation_with("B", &[(1, "0.6 < Economy <= 1.1", 0.3), (0, "Freedom <= 0.5", -0.1)]);
        let grid = explanation_heatmap(&[a, b]);
        let legend: Vec<&str> = grid.lines().filter(|l| l.starts_with('[')).collect();
        assert_eq!(
            legend,
            vec![
                "[1] 0.81 < Freedom",
                "[2] Freedom <= 0.5",
                "[3] 0.6 < Economy <= 1.1",
                "[4] Economy <= 0.6",
            ]
        );
    }

    #[test]
    fn wrappers_render_like_the_string_helpers() {
        let e = explanation("Chad", &[("x", 0.2)]);
        assert_eq!(format!("{}", ExplanationTable(&e)), explanation_table(&e));
        assert_eq!(
            FeatureBars { explanation: &e, width: 5 }.to_string(),
            feature_bars(&e, 5)
        );
    }
}
