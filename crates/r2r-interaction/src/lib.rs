//! Remote interaction with the paper-processing pipeline.

pub mod http_client;
pub mod wire;

pub use http_client::{DEFAULT_BASE_URL, HttpPipelineClient};
pub use wire::ProcessPaperResponse;
