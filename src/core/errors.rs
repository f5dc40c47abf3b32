// src/core/errors.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LimeError {
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    #[error("Incompatible Dimensions: {0}")]
    IncompatibleDimensions(String),
    #[error("Model Prediction Error: {0}")]
    ModelPredictionError(String),
    #[error("Numerical Error: {0}")]
    NumericalError(String),
    #[error("Internal Error: {0}")]
    InternalError(String),
    #[error("Ndarray Error: {0}")]
    Ndarray(#[from] ndarray::ShapeError),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, LimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn shape_errors_convert_with_question_mark() {
        fn build() -> Result<Array2<f64>> {
            Ok(Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0])?)
        }
        let err = build().unwrap_err();
        assert!(matches!(err, LimeError::Ndarray(_)));
        assert!(err.to_string().starts_with("Ndarray Error:"));
    }

    #[test]
    fn display_keeps_variant_prefix() {
        let err = LimeError::IncompatibleDimensions("3 vs 4".to_string());
        assert_eq!(err.to_string(), "Incompatible Dimensions: 3 vs 4");
    }
}
