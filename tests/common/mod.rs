//! Fixtures shared by the integration tests.

use lime_rs::Result;
use std::fmt::Write as _;
use std::path::Path;

const HEADER: &str = "Country,Region,Happiness Rank,Happiness Score,Standard Error,Economy (GDP per Capita),Family,Health (Life Expectancy),Freedom,Trust (Government Corruption),Generosity,Dystopia Residual";

/// Countries whose score is driven mostly by economy and health.
pub fn write_synthetic_csv(path: &Path) -> Result<()> {
    let mut text = String::from(HEADER);
    text.push('\n');
    for i in 0..90 {
        let t = i as f64 / 89.0;
        let wobble = |k: f64| ((i as f64) * k).sin() * 0.5 + 0.5;
        let economy = 0.1 + 1.4 * t;
        let family = 0.6 + 0.6 * wobble(1.3);
        let health = 0.1 + 0.8 * t + 0.05 * wobble(2.1);
        let freedom = 0.2 + 0.4 * wobble(0.7);
        let trust = 0.02 + 0.3 * wobble(3.3);
        let generosity = 0.1 + 0.3 * wobble(1.9);
        let dystopia = 1.8 + 0.4 * wobble(0.9);
        let score = 2.0 + 3.0 * economy + 2.0 * health + 0.3 * family;
        let _ = writeln!(
            text,
            "Country {},Region,{},{:.4},0.05,{:.5},{:.5},{:.5},{:.5},{:.5},{:.5},{:.5}",
            i,
            90 - i,
            score,
            economy,
            family,
            health,
            freedom,
            trust,
            generosity,
            dystopia
        );
    }
    std::fs::write(path, text)?;
    Ok(())
}
