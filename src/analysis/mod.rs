pub mod citation;
pub mod classifier;
pub mod cross_reference;
pub mod navigation;
pub mod orchestrator;
pub mod recommendations;
pub mod scoring;

pub use citation::build_citation_refs;
pub use classifier::classify;
pub use cross_reference::build_cross_references;
pub use navigation::build_navigation_path;
pub use orchestrator::{Analyzer, summarize};
pub use recommendations::{generate_local_recommendations, generate_recommendations};
pub use scoring::{evaluate_compliance, evaluate_flow};
