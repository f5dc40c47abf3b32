// src/config.rs

//! JSON-loadable settings. Every field has a default, so a config file only
//! needs the values it changes.

pub use crate::algorithms::LimeConfig;

use crate::core::Result;
use crate::dataset::{ScoreBands, TrainingSplit};
use crate::model::{GridSearch, MlpParams};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Share of each class used for training; the rest is held out.
    pub train_fraction: f64,
    pub folds: usize,
    /// Worker threads for cross-validation; all cores when unset.
    pub workers: Option<usize>,
    pub seed: u64,
    pub hidden_sizes: Vec<usize>,
    pub weight_decays: Vec<f64>,
    /// Base parameters each grid candidate starts from.
    pub mlp: MlpParams,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_fraction: 0.7,
            folds: 5,
            workers: None,
            seed: 42,
            hidden_sizes: vec![3, 5, 7],
            weight_decays: vec![0.0, 1e-4, 1e-3],
            mlp: MlpParams::default(),
        }
    }
}

impl TrainConfig {
    pub fn split(&self) -> TrainingSplit {
        TrainingSplit {
            train_fraction: self.train_fraction,
            seed: self.seed,
        }
    }

    pub fn grid_search(&self) -> GridSearch {
        let base = MlpParams { seed: self.seed, ..self.mlp.clone() };
        GridSearch {
            candidates: GridSearch::from_grid(&base, &self.hidden_sizes, &self.weight_decays),
            folds: self.folds,
            workers: self.workers,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bands: ScoreBands,
    pub train: TrainConfig,
    pub lime: LimeConfig,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let config = serde_json::from_reader(reader)?;
        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{DistanceMetric, FeatureSelection};
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{
                "bands": {{"kind": "quantile", "levels": 3}},
                "train": {{"folds": 3, "workers": 2}},
                "lime": {{"n_permutations": 800, "distance": "euclidean", "feature_selection": "lasso_path"}}
            }}"#
        )?;
        let config = AppConfig::load(file.path())?;
        assert_eq!(config.bands, ScoreBands::Quantile(3));
        assert_eq!(config.train.folds, 3);
        assert_eq!(config.train.workers, Some(2));
        assert_eq!(config.train.train_fraction, 0.7);
        assert_eq!(config.lime.n_permutations, 800);
        assert_eq!(config.lime.distance, DistanceMetric::Euclidean);
        assert_eq!(config.lime.feature_selection, FeatureSelection::LassoPath);
        assert_eq!(config.lime.n_bins, 4);
        Ok(())
    }

    #[test]
    fn missing_path_means_defaults() -> Result<()> {
        assert_eq!(AppConfig::load_or_default(None)?, AppConfig::default());
        assert!(AppConfig::load_or_default(Some(Path::new("/nonexistent/lime.json"))).is_err());
        Ok(())
    }

    #[test]
    fn grid_search_uses_configured_grid() {
        let search = TrainConfig::default().grid_search();
        assert_eq!(search.candidates.len(), 9);
        assert!(search.candidates.iter().all(|c| c.seed == 42));
        let split = TrainConfig { seed: 7, ..TrainConfig::default() }.split();
        assert_eq!(split, TrainingSplit { train_fraction: 0.7, seed: 7 });
    }
}
