// src/dataset/happiness.rs

use crate::core::{Dataset, LimeError, Result};
use crate::dataset::TabularData;
use crate::utils::quantile_sorted;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One row of the World Happiness report CSV.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HappinessRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Region", default)]
    pub region: Option<String>,
    #[serde(rename = "Happiness Rank", default)]
    pub rank: Option<u32>,
    #[serde(rename = "Happiness Score")]
    pub score: Option<f64>,
    #[serde(rename = "Standard Error", default)]
    pub standard_error: Option<f64>,
    #[serde(rename = "Economy (GDP per Capita)")]
    pub economy: Option<f64>,
    #[serde(rename = "Family")]
    pub family: Option<f64>,
    #[serde(rename = "Health (Life Expectancy)")]
    pub health: Option<f64>,
    #[serde(rename = "Freedom")]
    pub freedom: Option<f64>,
    #[serde(rename = "Trust (Government Corruption)")]
    pub trust: Option<f64>,
    #[serde(rename = "Generosity")]
    pub generosity: Option<f64>,
    #[serde(rename = "Dystopia Residual")]
    pub dystopia_residual: Option<f64>,
}

pub const FEATURE_NAMES: [&str; 7] = [
    "Economy",
    "Family",
    "Health",
    "Freedom",
    "Trust",
    "Generosity",
    "Dystopia",
];

impl HappinessRecord {
    fn feature_row(&self) -> Option<[f64; 7]> {
        Some([
            self.economy?,
            self.family?,
            self.health?,
            self.freedom?,
            self.trust?,
            self.generosity?,
            self.dystopia_residual?,
        ])
    }
}

/// How the happiness score is cut into ordered levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "levels")]
pub enum ScoreBands {
    /// Levels of equal score width between the observed min and max.
    EqualWidth(usize),
    /// Levels holding roughly equal numbers of countries.
    Quantile(usize),
}

impl Default for ScoreBands {
    fn default() -> Self {
        ScoreBands::EqualWidth(3)
    }
}

impl ScoreBands {
    pub fn levels(&self) -> usize {
        match *self {
            ScoreBands::EqualWidth(k) | ScoreBands::Quantile(k) => k,
        }
    }

    pub fn class_names(&self) -> Vec<String> {
        match self.levels() {
            3 => vec!["low".to_string(), "medium".to_string(), "high".to_string()],
            k => (0..k).map(|i| format!("level_{}", i)).collect(),
        }
    }

    /// Level index of every score.
    pub fn assign(&self, scores: &[f64]) -> Result<Vec<usize>> {
        let k = self.levels();
        if k < 2 {
            return Err(LimeError::InvalidInput(format!(
                "At least 2 score levels are needed, got {}.",
                k
            )));
        }
        if scores.is_empty() {
            return Ok(Vec::new());
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
        let cuts: Vec<f64> = (1..k)
            .map(|i| {
                let q = i as f64 / k as f64;
                match self {
                    ScoreBands::EqualWidth(_) => min + q * (max - min),
                    ScoreBands::Quantile(_) => quantile_sorted(&sorted, q),
                }
            })
            .collect();
        Ok(scores
            .iter()
            .map(|&s| cuts.iter().filter(|&&c| s > c).count())
            .collect())
    }
}

/// Reads happiness records from any CSV source; rows missing a value are skipped.
pub fn read_happiness<R: Read>(reader: R, bands: ScoreBands) -> Result<TabularData> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut ids = Vec::new();
    let mut rows: Vec<f64> = Vec::new();
    let mut scores = Vec::new();
    let mut skipped = 0usize;
    for record in csv_reader.deserialize::<HappinessRecord>() {
        let record = record?;
        match (record.feature_row(), record.score) {
            (Some(row), Some(score)) => {
                ids.push(record.country);
                rows.extend_from_slice(&row);
                scores.push(score);
            }
            _ => {
                log::warn!("Skipping '{}': missing values", record.country);
                skipped += 1;
            }
        }
    }
    if ids.is_empty() {
        return Err(LimeError::InvalidInput(
            "No complete happiness records found.".to_string(),
        ));
    }

    let features = Dataset::from_shape_vec((ids.len(), FEATURE_NAMES.len()), rows)?;
    let labels = bands.assign(&scores)?;
    log::info!(
        "Loaded {} countries ({} skipped) into {} score levels",
        ids.len(),
        skipped,
        bands.levels()
    );

    TabularData::new(
        ids,
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        features,
        labels,
        bands.class_names(),
    )
}

pub fn load_happiness<P: AsRef<Path>>(path: P, bands: ScoreBands) -> Result<TabularData> {
    let file = std::fs::File::open(path.as_ref())?;
    read_happiness(file, bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Country,Region,Happiness Rank,Happiness Score,Standard Error,Economy (GDP per Capita),Family,Health (Life Expectancy),Freedom,Trust (Government Corruption),Generosity,Dystopia Residual
Switzerland,Western Europe,1,7.587,0.03411,1.39651,1.34951,0.94143,0.66557,0.41978,0.29678,2.51738
Iceland,Western Europe,2,7.561,0.04884,1.30232,1.40223,0.94784,0.62877,0.14145,0.4363,2.70201
Nowhere,Limbo,3,6.0,0.1,,1.0,0.5,0.5,0.1,0.2,2.0
Greece,Western Europe,102,4.857,0.05062,1.15406,0.92933,0.88213,0.07699,0.01397,0,1.80101
Togo,Sub-Saharan Africa,158,2.839,0.06727,0.20868,0.13995,0.28443,0.36453,0.10731,0.16681,1.56726
";

    #[test]
    fn reads_records_and_skips_incomplete_rows() -> Result<()> {
        let data = read_happiness(SAMPLE.as_bytes(), ScoreBands::EqualWidth(3))?;
        assert_eq!(data.ids, vec!["Switzerland", "Iceland", "Greece", "Togo"]);
        assert_eq!(data.n_features(), 7);
        assert_eq!(data.features[[0, 0]], 1.39651);
        assert_eq!(data.features[[2, 5]], 0.0);
        assert_eq!(data.class_names, vec!["low", "medium", "high"]);
        // Range 2.839..7.587 in thirds: cuts at ~4.42 and ~6.00.
        assert_eq!(data.labels, vec![2, 2, 1, 0]);
        Ok(())
    }

    #[test]
    fn quantile_bands_balance_counts() -> Result<()> {
        let scores: Vec<f64> = (0..9).map(f64::from).collect();
        let levels = ScoreBands::Quantile(3).assign(&scores)?;
        assert_eq!(levels, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert!(ScoreBands::Quantile(1).assign(&scores).is_err());
        assert_eq!(ScoreBands::EqualWidth(4).class_names()[3], "level_3");
        Ok(())
    }

    #[test]
    fn empty_file_is_an_error() {
        let header = SAMPLE.lines().next().unwrap_or_default().to_string() + "\n";
        assert!(read_happiness(header.as_bytes(), ScoreBands::default()).is_err());
    }
}
