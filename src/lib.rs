pub mod analysis;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod model;
pub mod similarity;
pub mod store;
pub mod tree;
pub mod util;

pub use analysis::Analyzer;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, InputValidationError, RecommendationGenerationError};
pub use model::StructureAnalysisResult;
