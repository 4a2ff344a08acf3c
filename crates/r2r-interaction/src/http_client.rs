//! HttpPipelineClient - multipart upload to the pipeline REST service.
//!
//! Sends the held PDF to `POST {base_url}/process-paper` and interprets the
//! JSON body. The HTTP status code does not decide the outcome: whatever
//! JSON comes back is read for its `status` field, and a body that is not
//! JSON is a transport failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use r2r_core::error::{R2rError, Result};
use r2r_core::intake::{CandidateFile, FileHandle, PDF_MEDIA_TYPE};
use r2r_core::pipeline::{PipelineResponse, PipelineService};

use crate::wire::ProcessPaperResponse;

pub const DEFAULT_BASE_URL: &str = r2r_core::config::DEFAULT_API_BASE_URL;
pub const PROCESS_PAPER_PATH: &str = "/process-paper";
/// Name of the multipart field carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// Pipeline service reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpPipelineClient {
    client: Client,
    base_url: String,
}

impl HttpPipelineClient {
    /// Creates a client without a request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client whose requests fail after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| R2rError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the processing endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            PROCESS_PAPER_PATH
        )
    }

    async fn read_content(file: &CandidateFile) -> Result<Vec<u8>> {
        match file.handle() {
            FileHandle::Path(path) => tokio::fs::read(path).await.map_err(|err| {
                R2rError::io(format!("Failed to read {}: {err}", path.display()))
            }),
            FileHandle::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }

    fn build_form(file: &CandidateFile, bytes: Vec<u8>) -> Result<Form> {
        let part = Part::bytes(bytes)
            .file_name(file.name().to_string())
            .mime_str(PDF_MEDIA_TYPE)
            .map_err(|err| R2rError::internal(format!("Invalid multipart media type: {err}")))?;

        Ok(Form::new().part(FILE_FIELD, part))
    }
}

#[async_trait]
impl PipelineService for HttpPipelineClient {
    async fn process_paper(&self, file: &CandidateFile) -> Result<PipelineResponse> {
        let bytes = Self::read_content(file).await?;
        let size = bytes.len();
        let form = Self::build_form(file, bytes)?;
        let url = self.endpoint();

        tracing::info!(url = %url, file = %file.name(), size, "Uploading paper to pipeline");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| R2rError::transport(format!("Pipeline request failed: {err}")))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Pipeline service responded");

        let body = response.text().await.map_err(|err| {
            R2rError::transport_with_status(
                format!("Failed to read pipeline response body: {err}"),
                status.as_u16(),
            )
        })?;

        let parsed: ProcessPaperResponse = serde_json::from_str(&body).map_err(|err| {
            R2rError::transport_with_status(
                format!("Failed to parse pipeline response: {err}"),
                status.as_u16(),
            )
        })?;

        if !parsed.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                reported = parsed.status.as_deref().unwrap_or("<missing>"),
                message = parsed.message.as_deref().unwrap_or(""),
                "Pipeline reported failure"
            );
        }

        Ok(parsed.into_response(file.name()))
    }
}
