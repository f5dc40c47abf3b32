pub mod discretize;
pub mod kernel;
pub mod lime_tabular;
pub mod sampler;
pub mod selection;
pub mod surrogate;

pub use discretize::{BinningStrategy, Discretizer};
pub use kernel::DistanceMetric;
pub use lime_tabular::{ExplainerOptions, LabelChoice, LimeConfig, Neighbourhood, TabularExplainer};
pub use sampler::{FeatureStats, PerturbationSampler};
pub use selection::FeatureSelection;
pub use surrogate::{SurrogateFit, WeightedDesign};
