//! Analysis Execution
//!
//! Triggers remote analysis runs and folds their results back into the
//! displayed history.

pub mod executor;

pub use executor::{AnalysisExecutor, RunningAnalyses};
