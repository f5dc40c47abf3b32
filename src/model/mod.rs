//! The classifier under explanation and how it is trained.

pub mod mlp;
pub mod train;

pub use mlp::{MlpClassifier, MlpParams};
pub use train::{CandidateScore, GridSearch, TrainReport};
