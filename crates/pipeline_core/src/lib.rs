//! Candidate pipeline engine: filters, stage buckets, the pipeline data source,
//! single-flight stage moves and the render-ready board.

pub mod api;
pub mod bucket;
pub mod config;
pub mod controller;
pub mod data_source;
pub mod error;
pub mod events;
pub mod filter;
mod sort;
pub mod view_model;

pub use api::{HttpPipelineApi, PipelineApi};
pub use bucket::{bucketize, Bucket, StageBuckets};
pub use config::{load_settings, ClientSettings};
pub use controller::{MoveOutcome, StageTransitionController};
pub use data_source::{
    PipelineDataSource, PipelineSeed, PipelineSnapshot, ReconcileStrategy, ReloadHook,
};
pub use error::PipelineError;
pub use events::PipelineEvent;
pub use filter::matches;
pub use view_model::{Board, PipelineView, PipelineViewModel, StageColumn};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
