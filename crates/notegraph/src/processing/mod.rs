//! Sequential processing of the input directory

mod pipeline;

pub use pipeline::{Pipeline, PipelineState, RunSummary};
