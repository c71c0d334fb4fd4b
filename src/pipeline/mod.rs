//! Pipeline composition and execution for the reconciliation stages.

mod runner;

pub use runner::{
    run_from_config, Inputs, MatchedDataset, Pipeline, PipelineConfig, PipelineReport,
};
