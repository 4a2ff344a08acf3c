//! JSON shape of the `/process-paper` response.
//!
//! Every field is optional on the wire. Normalization into the domain types
//! fills the gaps: default titles, `python` as coder language, the submitted
//! file name when the server does not echo one.

use serde::Deserialize;

use r2r_core::pipeline::{
    CodeStep, DEFAULT_CODE_LANGUAGE, PipelineResponse, PipelineResult, PipelineSteps,
    ResultMetadata, SUCCESS_STATUS, Step, StepKey,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessPaperResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub metadata: Option<MetadataDto>,
    #[serde(default)]
    pub steps: Option<StepsDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataDto {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub is_authentic: Option<bool>,
    #[serde(default)]
    pub verdict_label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepsDto {
    #[serde(default)]
    pub researcher: Option<StepDto>,
    #[serde(default)]
    pub coder: Option<CodeStepDto>,
    #[serde(default)]
    pub execution: Option<StepDto>,
    #[serde(default)]
    pub verifier: Option<StepDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepDto {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeStepDto {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl ProcessPaperResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS_STATUS)
    }

    /// Converts the payload into a domain response.
    ///
    /// `submitted_name` is the display name of the uploaded file, used when
    /// the metadata does not carry a filename.
    pub fn into_response(self, submitted_name: &str) -> PipelineResponse {
        if !self.is_success() {
            return PipelineResponse::Failure {
                message: self.message,
            };
        }

        let metadata = self.metadata.map(|m| m.into_domain(submitted_name));
        let steps = self.steps.map(StepsDto::into_domain).unwrap_or_default();
        PipelineResponse::Success(PipelineResult::new(metadata, steps))
    }
}

impl MetadataDto {
    fn into_domain(self, submitted_name: &str) -> ResultMetadata {
        ResultMetadata {
            session_id: self.session_id.unwrap_or_default(),
            filename: self
                .filename
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| submitted_name.to_string()),
            is_authentic: self.is_authentic.unwrap_or(false),
            verdict_label: self.verdict_label,
        }
    }
}

impl StepsDto {
    fn into_domain(self) -> PipelineSteps {
        PipelineSteps {
            researcher: self.researcher.map(|s| s.into_domain(StepKey::Researcher)),
            coder: self.coder.map(CodeStepDto::into_domain),
            execution: self.execution.map(|s| s.into_domain(StepKey::Execution)),
            verifier: self.verifier.map(|s| s.into_domain(StepKey::Verifier)),
        }
    }
}

impl StepDto {
    fn into_domain(self, key: StepKey) -> Step {
        Step {
            title: title_or_default(self.title, key),
            content: self.content.unwrap_or_default(),
        }
    }
}

impl CodeStepDto {
    fn into_domain(self) -> CodeStep {
        CodeStep {
            title: title_or_default(self.title, StepKey::Coder),
            content: self.content.unwrap_or_default(),
            language: self
                .language
                .filter(|language| !language.is_empty())
                .unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string()),
        }
    }
}

fn title_or_default(title: Option<String>, key: StepKey) -> String {
    title
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| key.default_title().to_string())
}
