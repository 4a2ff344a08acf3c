use async_trait::async_trait;

use super::PipelineResult;
use crate::error::Result;
use crate::intake::CandidateFile;

/// Status value the backend uses for a completed run.
pub const SUCCESS_STATUS: &str = "success";

/// What the pipeline service answered, once a response body was understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResponse {
    /// `status == "success"`.
    Success(PipelineResult),
    /// Any other status. `message` is the server's explanation, if any.
    Failure { message: Option<String> },
}

/// Boundary to the remote analysis pipeline.
///
/// Implementations send the file and interpret the response body. An `Err`
/// means the request did not complete (unreachable host, unreadable body,
/// timeout, unreadable file); an application-level failure is
/// `Ok(PipelineResponse::Failure { .. })`.
#[async_trait]
pub trait PipelineService: Send + Sync {
    async fn process_paper(&self, file: &CandidateFile) -> Result<PipelineResponse>;
}
