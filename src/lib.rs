// src/lib.rs

//! `lime_rs` is a Rust crate for explaining classifier predictions with LIME
//! (Local Interpretable Model-agnostic Explanations): a weighted linear
//! surrogate fitted on perturbed neighbours of the instance being explained.
//!
//! The crate also carries the small workflow around it: loading a tabular
//! dataset, training a multi-layer perceptron to explain, and rendering the
//! explanations as text.

pub mod algorithms;
pub mod config;
pub mod core;
pub mod dataset;
pub mod model;
pub mod render;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{ExplainerOptions, LabelChoice, LimeConfig, TabularExplainer};
pub use crate::core::{Dataset, Explanation, FeatureWeight, Instance, LabelExplanation, LimeError, Result};
pub use crate::model::{MlpClassifier, MlpParams};
pub use crate::traits::ProbabilisticClassifier;
