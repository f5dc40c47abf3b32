// src/model/train.rs

use crate::core::{LimeError, Result};
use crate::dataset::{stratified_folds, TabularData};
use crate::model::mlp::{MlpClassifier, MlpParams};
use rayon::prelude::*;

/// Cross-validated accuracy of one hyperparameter candidate.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub params: MlpParams,
    pub fold_accuracy: Vec<f64>,
    pub mean_accuracy: f64,
}

#[derive(Debug)]
pub struct TrainReport {
    pub scores: Vec<CandidateScore>,
    pub best_index: usize,
    /// Best candidate refitted on all rows.
    pub model: MlpClassifier,
}

/// Stratified k-fold grid search over MLP hyperparameters.
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub candidates: Vec<MlpParams>,
    pub folds: usize,
    /// Worker threads; `None` uses every core.
    pub workers: Option<usize>,
    pub seed: u64,
}

impl GridSearch {
    /// Every combination of hidden layer size and weight decay on top of `base`.
    pub fn from_grid(base: &MlpParams, hidden_sizes: &[usize], weight_decays: &[f64]) -> Vec<MlpParams> {
        hidden_sizes
            .iter()
            .flat_map(|&h| {
                weight_decays.iter().map(move |&decay| MlpParams {
                    hidden: vec![h],
                    weight_decay: decay,
                    ..base.clone()
                })
            })
            .collect()
    }

    pub fn run(&self, data: &TabularData) -> Result<TrainReport> {
        if self.candidates.is_empty() {
            return Err(LimeError::InvalidInput(
                "Grid search needs at least one candidate.".to_string(),
            ));
        }
        let folds = stratified_folds(&data.labels, self.folds, self.seed)?;

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .map_err(|e| LimeError::InternalError(format!("Cannot start worker pool: {}", e)))?;
        log::info!(
            "Grid search: {} candidates x {} folds on {} workers",
            self.candidates.len(),
            folds.len(),
            pool.current_num_threads()
        );

        let jobs: Vec<(usize, usize)> = (0..self.candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();
        let results: Vec<Result<f64>> = pool.install(|| {
            jobs.par_iter()
                .map(|&(c, f)| self.evaluate(data, &folds[f], &self.candidates[c]))
                .collect()
        });

        let mut scores = Vec::with_capacity(self.candidates.len());
        let mut results = results.into_iter();
        for params in &self.candidates {
            let fold_accuracy = results
                .by_ref()
                .take(folds.len())
                .collect::<Result<Vec<f64>>>()?;
            let mean_accuracy = fold_accuracy.iter().sum::<f64>() / fold_accuracy.len() as f64;
            log::info!(
                "hidden {:?}, decay {}: accuracy {:.4}",
                params.hidden,
                params.weight_decay,
                mean_accuracy
            );
            scores.push(CandidateScore { params: params.clone(), fold_accuracy, mean_accuracy });
        }

        let mut best_index = 0;
        for (i, s) in scores.iter().enumerate() {
            if s.mean_accuracy > scores[best_index].mean_accuracy {
                best_index = i;
            }
        }

        let model = MlpClassifier::fit(
            &data.features,
            &data.labels,
            data.feature_names.clone(),
            data.class_names.clone(),
            scores[best_index].params.clone(),
        )?;

        Ok(TrainReport { scores, best_index, model })
    }

    fn evaluate(&self, data: &TabularData, held_out: &[usize], params: &MlpParams) -> Result<f64> {
        let train_rows: Vec<usize> = (0..data.n_rows()).filter(|i| !held_out.contains(i)).collect();
        let train = data.subset(&train_rows);
        let test = data.subset(held_out);
        let model = MlpClassifier::fit(
            &train.features,
            &train.labels,
            train.feature_names.clone(),
            train.class_names.clone(),
            params.clone(),
        )?;
        model.accuracy(&test.features, &test.labels)
    }
}
