use lime_rs::algorithms::sampler::FeatureEncoding;
use lime_rs::config::{AppConfig, TrainConfig};
use lime_rs::core::argmax;
use lime_rs::dataset::{load_happiness, stratified_split, ScoreBands};
use lime_rs::render;
use lime_rs::{ExplainerOptions, LabelChoice, LimeConfig, MlpClassifier, MlpParams, ProbabilisticClassifier, Result, TabularExplainer};

mod common;

use common::write_synthetic_csv;

fn fast_config() -> AppConfig {
    AppConfig {
        bands: ScoreBands::EqualWidth(3),
        train: TrainConfig {
            folds: 3,
            workers: Some(2),
            hidden_sizes: vec![4],
            weight_decays: vec![0.0, 1e-3],
            mlp: MlpParams { epochs: 120, ..MlpParams::default() },
            ..TrainConfig::default()
        },
        lime: LimeConfig {
            n_permutations: 1500,
            seed: Some(17),
            ..LimeConfig::default()
        },
    }
}

#[test]
fn train_save_load_and_explain_six_cases() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("happiness.csv");
    write_synthetic_csv(&csv_path)?;
    let config = fast_config();

    let data = load_happiness(&csv_path, config.bands)?;
    assert_eq!(data.n_rows(), 90);
    assert_eq!(data.class_names, vec!["low", "medium", "high"]);

    let (train_rows, test_rows) = stratified_split(&data.labels, config.train.train_fraction, config.train.seed)?;
    let train = data.subset(&train_rows);
    let test = data.subset(&test_rows);

    let report = config.train.grid_search().run(&train)?;
    assert_eq!(report.scores.len(), 2);
    assert!(report.model.accuracy(&test.features, &test.labels)? > 0.7);

    let model_path = dir.path().join("model.json");
    report.model.save(&model_path)?;
    let model = MlpClassifier::load(&model_path)?;
    let (before, after) = (report.model.predict_proba(&test.features)?, model.predict_proba(&test.features)?);
    for (a, b) in before.iter().zip(after.iter()) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }

    let explainer = TabularExplainer::new(
        &model,
        &train.features,
        ExplainerOptions {
            feature_names: Some(train.feature_names.clone()),
            categorical_features: Vec::new(),
            config: config.lime.clone(),
        },
    )?;
    let cases = test.subset(&(0..6).collect::<Vec<_>>());
    let explanations = explainer.explain_many(&cases.ids, &cases.features, &LabelChoice::Top(1), 4)?;
    assert_eq!(explanations.len(), 6);

    for (explanation, row) in explanations.iter().zip(cases.features.rows()) {
        // The explained label is the model's prediction for the case.
        assert_eq!(Some(explanation.predicted_label), argmax(&explanation.probabilities));
        assert_eq!(explanation.labels[0].label, explanation.predicted_label);
        assert_eq!(explanation.labels[0].features.len(), 4);

        // Each reported condition holds for the case's own value.
        for fw in &explanation.labels[0].features {
            assert_eq!(fw.value, row[fw.feature]);
            match &explainer.feature_stats()[fw.feature].encoding {
                FeatureEncoding::Binned(d) => assert!(d.contains(d.bin_of(fw.value), fw.value)),
                _ => unreachable!("continuous features are binned by default"),
            }
        }
    }

    let table = render::explanation_table(&explanations[0]);
    assert!(table.contains(&format!("Case: {}", cases.ids[0])));
    let heatmap = render::explanation_heatmap(&explanations);
    assert!(heatmap.contains("[1] "));

    let export = dir.path().join("explanations.csv");
    render::write_explanations_csv(std::fs::File::create(&export)?, &explanations)?;
    let written = std::fs::read_to_string(&export)?;
    assert_eq!(written.lines().count(), 1 + 6 * 4);
    Ok(())
}

#[test]
fn boxplots_cover_every_feature_and_class() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("happiness.csv");
    write_synthetic_csv(&csv_path)?;
    let data = load_happiness(&csv_path, ScoreBands::Quantile(3))?;
    let summaries = render::BoxplotSummary::from_data(&data);
    assert_eq!(summaries.len(), 7 * 3);
    let text = render::render_boxplots(&summaries, 40);
    for name in &data.feature_names {
        assert!(text.contains(name.as_str()));
    }
    Ok(())
}
