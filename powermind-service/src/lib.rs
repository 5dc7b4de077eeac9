pub mod pipeline;
pub mod config;
pub mod sources;
pub mod sinks;
pub mod transform;
pub mod forecast;
pub mod detect;
pub mod fingerprint;
pub mod observability;
pub mod metrics_snapshot;

pub use pipeline::{Pipeline, PipelineError, PipelineOutput};
