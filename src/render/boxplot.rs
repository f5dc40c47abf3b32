// src/render/boxplot.rs

use crate::dataset::TabularData;
use crate::utils::five_number;
use ndarray::Array1;
use std::fmt;

/// Distribution of one feature within one class.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotSummary {
    pub feature: String,
    pub class: String,
    pub count: usize,
    /// Minimum, lower quartile, median, upper quartile, maximum.
    pub five: [f64; 5],
}

impl BoxplotSummary {
    /// One summary per (feature, class) pair that has rows, feature-major.
    pub fn from_data(data: &TabularData) -> Vec<BoxplotSummary> {
        let mut out = Vec::new();
        for (j, feature) in data.feature_names.iter().enumerate() {
            let column = data.features.column(j);
            for (c, class) in data.class_names.iter().enumerate() {
                let values: Array1<f64> = column
                    .iter()
                    .zip(&data.labels)
                    .filter(|(_, &l)| l == c)
                    .map(|(&v, _)| v)
                    .collect();
                if let Some(five) = five_number(values.view()) {
                    out.push(BoxplotSummary {
                        feature: feature.clone(),
                        class: class.clone(),
                        count: values.len(),
                        five,
                    });
                }
            }
        }
        out
    }
}

fn position(value: f64, lo: f64, hi: f64, width: usize) -> usize {
    if hi <= lo {
        return 0;
    }
    (((value - lo) / (hi - lo)) * (width - 1) as f64).round() as usize
}

/// Text boxplots grouped by feature, all classes of a feature on one scale.
pub struct Boxplots<'a> {
    pub summaries: &'a [BoxplotSummary],
    pub width: usize,
}

impl fmt::Display for Boxplots<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.width.max(10);
        let mut features: Vec<&str> = Vec::new();
        for s in self.summaries {
            if !features.contains(&s.feature.as_str()) {
                features.push(&s.feature);
            }
        }
        for feature in features {
            let rows: Vec<&BoxplotSummary> = self.summaries.iter().filter(|s| s.feature == feature).collect();
            let lo = rows.iter().map(|s| s.five[0]).fold(f64::INFINITY, f64::min);
            let hi = rows.iter().map(|s| s.five[4]).fold(f64::NEG_INFINITY, f64::max);
            let class_width = rows.iter().map(|s| s.class.len()).max().unwrap_or(0);
            writeln!(f, "{} [{:.3}, {:.3}]", feature, lo, hi)?;
            for s in rows {
                let mut line = vec![' '; width];
                let p: Vec<usize> = s.five.iter().map(|&v| position(v, lo, hi, width)).collect();
                for cell in line.iter_mut().take(p[4] + 1).skip(p[0]) {
                    *cell = '-';
                }
                for cell in line.iter_mut().take(p[3] + 1).skip(p[1]) {
                    *cell = '=';
                }
                line[p[0]] = '|';
                line[p[4]] = '|';
                line[p[2]] = '#';
                writeln!(
                    f,
                    "  {:<cw$} {} n={:<4} median {:.3}",
                    s.class,
                    line.into_iter().collect::<String>(),
                    s.count,
                    s.five[2],
                    cw = class_width
                )?;
            }
        }
        Ok(())
    }
}

pub fn render_boxplots(summaries: &[BoxplotSummary], width: usize) -> String {
    Boxplots { summaries, width }.to_string()
}
