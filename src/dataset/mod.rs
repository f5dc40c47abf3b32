//! Tabular data handling: labelled feature matrices, scaling and splitting.

pub mod happiness;

pub use happiness::{load_happiness, read_happiness, HappinessRecord, ScoreBands};

use crate::core::{Dataset, LimeError, Result};
use crate::utils::mean_std;
use ndarray::{Array1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A labelled feature matrix with row identifiers.
#[derive(Debug, Clone)]
pub struct TabularData {
    pub ids: Vec<String>,
    pub feature_names: Vec<String>,
    pub features: Dataset,
    /// Class index per row.
    pub labels: Vec<usize>,
    pub class_names: Vec<String>,
}

impl TabularData {
    pub fn new(
        ids: Vec<String>,
        feature_names: Vec<String>,
        features: Dataset,
        labels: Vec<usize>,
        class_names: Vec<String>,
    ) -> Result<Self> {
        let n = features.nrows();
        if ids.len() != n || labels.len() != n {
            return Err(LimeError::IncompatibleDimensions(format!(
                "{} rows of features, {} ids and {} labels.",
                n,
                ids.len(),
                labels.len()
            )));
        }
        if feature_names.len() != features.ncols() {
            return Err(LimeError::IncompatibleDimensions(format!(
                "{} feature names for {} columns.",
                feature_names.len(),
                features.ncols()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= class_names.len()) {
            return Err(LimeError::InvalidInput(format!(
                "Label {} has no class name ({} classes).",
                bad,
                class_names.len()
            )));
        }
        Ok(TabularData { ids, feature_names, features, labels, class_names })
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.class_names.len()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|i| i == id)
    }

    /// Rows in the given order.
    pub fn subset(&self, rows: &[usize]) -> TabularData {
        TabularData {
            ids: rows.iter().map(|&i| self.ids[i].clone()).collect(),
            feature_names: self.feature_names.clone(),
            features: self.features.select(Axis(0), rows),
            labels: rows.iter().map(|&i| self.labels[i]).collect(),
            class_names: self.class_names.clone(),
        }
    }

    /// The first `n` rows, or all of them when there are fewer.
    pub fn head(&self, n: usize) -> TabularData {
        let rows: Vec<usize> = (0..n.min(self.n_rows())).collect();
        self.subset(&rows)
    }

    /// Rows looked up by id, in the order given. Unknown ids are an error.
    pub fn rows_named(&self, ids: &[String]) -> Result<TabularData> {
        let rows = ids
            .iter()
            .map(|id| {
                self.position(id)
                    .ok_or_else(|| LimeError::InvalidInput(format!("Unknown case '{}'.", id)))
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(self.subset(&rows))
    }

    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes()];
        for &l in &self.labels {
            counts[l] += 1;
        }
        counts
    }
}

/// Centres and scales columns with training means and standard deviations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub means: Array1<f64>,
    /// Constant columns get scale 1.
    pub scales: Array1<f64>,
}

impl Standardizer {
    pub fn fit(data: &Dataset) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(LimeError::InvalidInput(
                "Cannot standardize an empty dataset.".to_string(),
            ));
        }
        let (means, scales): (Vec<f64>, Vec<f64>) = data
            .columns()
            .into_iter()
            .map(|c| {
                let (m, s) = mean_std(c);
                (m, if s > 0.0 { s } else { 1.0 })
            })
            .unzip();
        Ok(Standardizer {
            means: Array1::from(means),
            scales: Array1::from(scales),
        })
    }

    pub fn transform(&self, data: &Dataset) -> Result<Dataset> {
        if data.ncols() != self.means.len() {
            return Err(LimeError::IncompatibleDimensions(format!(
                "Data has {} columns, standardizer was fitted on {}.",
                data.ncols(),
                self.means.len()
            )));
        }
        Ok((data - &self.means) / &self.scales)
    }
}

fn by_class(labels: &[usize]) -> Vec<Vec<usize>> {
    let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups = vec![Vec::new(); n_classes];
    for (i, &l) in labels.iter().enumerate() {
        groups[l].push(i);
    }
    groups
}

/// Splits row indices into (train, test), keeping class proportions.
///
/// Each class contributes `round(fraction * count)` rows to the training side.
pub fn stratified_split(labels: &[usize], fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(LimeError::InvalidInput(format!(
            "Training fraction must lie in [0, 1], got {}.",
            fraction
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut group in by_class(labels) {
        group.shuffle(&mut rng);
        let n_train = ((group.len() as f64) * fraction).round() as usize;
        let (a, b) = group.split_at(n_train.min(group.len()));
        train.extend_from_slice(a);
        test.extend_from_slice(b);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Fraction and seed of a stratified train/held-out split.
///
/// A trained model keeps the split it was fitted on so the held-out rows can
/// be recovered from the dataset later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSplit {
    pub train_fraction: f64,
    pub seed: u64,
}

impl TrainingSplit {
    /// Returns the (train, held-out) parts of `data`.
    pub fn apply(&self, data: &TabularData) -> Result<(TabularData, TabularData)> {
        let (train, test) = stratified_split(&data.labels, self.train_fraction, self.seed)?;
        Ok((data.subset(&train), data.subset(&test)))
    }
}

/// Assigns every row to one of `k` folds, dealing each class round-robin.
/// Returns the held-out rows of each fold.
pub fn stratified_folds(labels: &[usize], k: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
    if k < 2 || k > labels.len() {
        return Err(LimeError::InvalidInput(format!(
            "Cannot build {} folds over {} rows.",
            k,
            labels.len()
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds = vec![Vec::new(); k];
    let mut next = 0;
    for mut group in by_class(labels) {
        group.shuffle(&mut rng);
        for i in group {
            folds[next % k].push(i);
            next += 1;
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn labels() -> Vec<usize> {
        (0..30).map(|i| i % 3).collect()
    }

    #[test]
    fn split_keeps_class_proportions() -> Result<()> {
        let (train, test) = stratified_split(&labels(), 0.7, 1)?;
        assert_eq!(train.len(), 21);
        assert_eq!(test.len(), 9);
        for class in 0..3 {
            assert_eq!(train.iter().filter(|&&i| i % 3 == class).count(), 7);
        }
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..30).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn folds_partition_rows() -> Result<()> {
        let folds = stratified_folds(&labels(), 5, 2)?;
        assert_eq!(folds.len(), 5);
        assert!(folds.iter().all(|f| f.len() == 6));
        let mut all: Vec<usize> = folds.concat();
        all.sort_unstable();
        assert_eq!(all, (0..30).collect::<Vec<_>>());
        assert!(stratified_folds(&labels(), 1, 0).is_err());
        assert!(stratified_folds(&labels(), 31, 0).is_err());
        Ok(())
    }

    #[test]
    fn standardizer_centres_and_scales() -> Result<()> {
        let data = array![[1.0, 5.0], [3.0, 5.0]];
        let s = Standardizer::fit(&data)?;
        let t = s.transform(&data)?;
        assert_abs_diff_eq!(t[[0, 0]], -(2.0f64).sqrt() / 2.0, epsilon = 1e-12);
        assert_eq!(t[[0, 1]], 0.0);
        assert_eq!(s.scales[1], 1.0);
        assert!(s.transform(&array![[1.0]]).is_err());
        Ok(())
    }

    #[test]
    fn subset_and_lookup() -> Result<()> {
        let data = TabularData::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["f".into()],
            array![[1.0], [2.0], [3.0]],
            vec![0, 1, 1],
            vec!["no".into(), "yes".into()],
        )?;
        let sub = data.subset(&[2, 0]);
        assert_eq!(sub.ids, vec!["c", "a"]);
        assert_eq!(sub.features, array![[3.0], [1.0]]);
        assert_eq!(data.position("b"), Some(1));
        assert_eq!(data.class_counts(), vec![1, 2]);
        assert!(TabularData::new(vec![], vec![], Dataset::zeros((0, 0)), vec![], vec![]).is_ok());
        assert!(TabularData::new(vec!["a".into()], vec!["f".into()], array![[1.0]], vec![3], vec!["x".into()]).is_err());
        Ok(())
    }

    #[test]
    fn cases_by_name_and_head() -> Result<()> {
        let data = TabularData::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["f".into()],
            array![[1.0], [2.0], [3.0]],
            vec![0, 1, 1],
            vec!["no".into(), "yes".into()],
        )?;
        let named = data.rows_named(&["c".to_string(), "a".to_string()])?;
        assert_eq!(named.ids, vec!["c", "a"]);
        let err = data.rows_named(&["a".to_string(), "Atlantis".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unknown case 'Atlantis'"));
        assert_eq!(data.head(2).ids, vec!["a", "b"]);
        assert_eq!(data.head(10).n_rows(), 3);
        Ok(())
    }

    #[test]
    fn training_split_partitions_by_seed() -> Result<()> {
        let labels = labels();
        let data = TabularData::new(
            (0..30).map(|i| format!("r{}", i)).collect(),
            vec!["f".into()],
            ndarray::Array2::from_shape_fn((30, 1), |(i, _)| i as f64),
            labels.clone(),
            vec!["a".into(), "b".into(), "c".into()],
        )?;
        let split = TrainingSplit { train_fraction: 0.7, seed: 7 };
        let (train, test) = split.apply(&data)?;
        assert_eq!(train.n_rows() + test.n_rows(), 30);
        assert!(test.ids.iter().all(|id| !train.ids.contains(id)));
        let (_, expected) = stratified_split(&labels, 0.7, 7)?;
        assert_eq!(test.ids, expected.iter().map(|i| format!("r{}", i)).collect::<Vec<_>>());
        Ok(())
    }
}
