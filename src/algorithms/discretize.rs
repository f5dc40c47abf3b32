// src/algorithms/discretize.rs

use crate::core::{LimeError, Result};
use crate::utils::{quantile_sorted, sorted_values};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningStrategy {
    /// Cut points at evenly spaced quantiles of the training column.
    #[default]
    Quantile,
    /// Cut points evenly spaced between the training min and max.
    EqualWidth,
}

/// A bin of a continuous feature as seen in the training data.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    /// Exclusive for every bin but the first.
    pub lower: f64,
    pub upper: f64,
    /// Fraction of training rows falling in this bin.
    pub frequency: f64,
}

/// Splits one continuous feature into ordered ranges.
///
/// Bin 0 holds `x <= c1`, bin `i` holds `c_i < x <= c_{i+1}` and the last bin
/// holds `x > c_last`.
#[derive(Debug, Clone)]
pub struct Discretizer {
    cuts: Vec<f64>,
    bins: Vec<Bin>,
}

impl Discretizer {
    pub fn fit(column: ArrayView1<f64>, n_bins: usize, strategy: BinningStrategy) -> Result<Self> {
        if n_bins < 2 {
            return Err(LimeError::InvalidInput(format!(
                "At least 2 bins are needed, got {}.",
                n_bins
            )));
        }
        let sorted = sorted_values(column);
        if sorted.is_empty() {
            return Err(LimeError::InvalidInput(
                "Cannot bin an empty column.".to_string(),
            ));
        }
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];

        let mut cuts: Vec<f64> = (1..n_bins)
            .map(|k| {
                let q = k as f64 / n_bins as f64;
                match strategy {
                    BinningStrategy::Quantile => quantile_sorted(&sorted, q),
                    BinningStrategy::EqualWidth => min + q * (max - min),
                }
            })
            .collect();
        cuts.dedup_by(|a, b| (*a - *b).abs() <= f64::EPSILON * b.abs().max(1.0));
        // A cut at the maximum would leave an empty last bin.
        cuts.retain(|&c| c < max);

        let mut edges = Vec::with_capacity(cuts.len() + 2);
        edges.push(min);
        edges.extend_from_slice(&cuts);
        edges.push(max);

        let mut counts = vec![0usize; cuts.len() + 1];
        for &v in &sorted {
            counts[Self::bin_index(&cuts, v)] += 1;
        }
        let total = sorted.len() as f64;
        let bins = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| Bin {
                lower: edges[i],
                upper: edges[i + 1],
                frequency: c as f64 / total,
            })
            .collect();

        Ok(Discretizer { cuts, bins })
    }

    fn bin_index(cuts: &[f64], value: f64) -> usize {
        cuts.iter().filter(|&&c| value > c).count()
    }

    pub fn bin_of(&self, value: f64) -> usize {
        Self::bin_index(&self.cuts, value)
    }

    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn describe(&self, bin: usize, name: &str) -> String {
        let n_cuts = self.cuts.len();
        if n_cuts == 0 {
            return name.to_string();
        }
        if bin == 0 {
            format!("{} <= {:.2}", name, self.cuts[0])
        } else if bin >= n_cuts {
            format!("{:.2} < {}", self.cuts[n_cuts - 1], name)
        } else {
            format!("{:.2} < {} <= {:.2}", self.cuts[bin - 1], name, self.cuts[bin])
        }
    }

    /// Whether `value` satisfies the condition described for `bin`.
    pub fn contains(&self, bin: usize, value: f64) -> bool {
        let above_lower = bin == 0 || value > self.cuts[bin - 1];
        let below_upper = bin >= self.cuts.len() || value <= self.cuts[bin];
        above_lower && below_upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    #[test]
    fn quartile_bins_on_uniform_column() -> Result<()> {
        let column = Array1::from_iter((1..=9).map(f64::from));
        let d = Discretizer::fit(column.view(), 4, BinningStrategy::Quantile)?;
        assert_eq!(d.cuts(), &[3.0, 5.0, 7.0]);
        assert_eq!(d.n_bins(), 4);
        assert_eq!(d.bin_of(3.0), 0);
        assert_eq!(d.bin_of(3.5), 1);
        assert_eq!(d.bin_of(9.0), 3);
        let total: f64 = d.bins().iter().map(|b| b.frequency).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        assert_eq!(d.bins()[0].lower, 1.0);
        assert_eq!(d.bins()[3].upper, 9.0);
        Ok(())
    }

    #[test]
    fn equal_width_bins() -> Result<()> {
        let d = Discretizer::fit(array![0.0, 1.0, 10.0].view(), 2, BinningStrategy::EqualWidth)?;
        assert_eq!(d.cuts(), &[5.0]);
        assert_eq!(d.bins()[0].frequency, 2.0 / 3.0);
        Ok(())
    }

    #[test]
    fn descriptions_match_membership() -> Result<()> {
        let column = Array1::from_iter((1..=9).map(f64::from));
        let d = Discretizer::fit(column.view(), 4, BinningStrategy::Quantile)?;
        assert_eq!(d.describe(0, "Family"), "Family <= 3.00");
        assert_eq!(d.describe(2, "Family"), "5.00 < Family <= 7.00");
        assert_eq!(d.describe(3, "Family"), "7.00 < Family");
        for v in [0.5, 3.0, 4.2, 6.9, 7.0, 8.8, 12.0] {
            assert!(d.contains(d.bin_of(v), v));
        }
        Ok(())
    }

    #[test]
    fn constant_column_has_one_bin() -> Result<()> {
        let d = Discretizer::fit(array![2.0, 2.0, 2.0].view(), 4, BinningStrategy::Quantile)?;
        assert_eq!(d.n_bins(), 1);
        assert_eq!(d.describe(0, "Trust"), "Trust");
        assert_eq!(d.bins()[0].frequency, 1.0);
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Discretizer::fit(array![1.0].view(), 1, BinningStrategy::Quantile).is_err());
        assert!(Discretizer::fit(Array1::<f64>::zeros(0).view(), 4, BinningStrategy::Quantile).is_err());
    }
}
