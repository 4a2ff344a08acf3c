use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Language assumed for the coder step when the payload does not name one.
pub const DEFAULT_CODE_LANGUAGE: &str = "python";

/// Identifies one stage of the backend pipeline.
///
/// Declaration order is display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepKey {
    Researcher,
    Coder,
    Execution,
    Verifier,
}

impl StepKey {
    /// All keys in display order.
    pub fn ordered() -> impl Iterator<Item = StepKey> {
        StepKey::iter()
    }

    /// 1-based position shown next to the step title.
    pub fn ordinal(self) -> u8 {
        match self {
            StepKey::Researcher => 1,
            StepKey::Coder => 2,
            StepKey::Execution => 3,
            StepKey::Verifier => 4,
        }
    }

    /// Title used when the payload omits one.
    pub fn default_title(self) -> &'static str {
        match self {
            StepKey::Researcher => "Research Summary",
            StepKey::Coder => "Generated Implementation",
            StepKey::Execution => "Execution Logs",
            StepKey::Verifier => "Verification Verdict",
        }
    }
}

/// A text step (researcher, execution, verifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub content: String,
}

/// The coder step: source code plus its language tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStep {
    pub title: String,
    pub content: String,
    pub language: String,
}

/// Borrowed view over any present step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRef<'a> {
    pub key: StepKey,
    pub title: &'a str,
    pub content: &'a str,
    /// Only set for the coder step.
    pub language: Option<&'a str>,
}

/// The sparse set of steps returned by the pipeline.
///
/// A `None` step was not returned and is not rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSteps {
    pub researcher: Option<Step>,
    pub coder: Option<CodeStep>,
    pub execution: Option<Step>,
    pub verifier: Option<Step>,
}

impl PipelineSteps {
    pub fn get(&self, key: StepKey) -> Option<StepRef<'_>> {
        fn text(key: StepKey, step: &Option<Step>) -> Option<StepRef<'_>> {
            step.as_ref().map(|step| StepRef {
                key,
                title: &step.title,
                content: &step.content,
                language: None,
            })
        }

        match key {
            StepKey::Researcher => text(key, &self.researcher),
            StepKey::Coder => self.coder.as_ref().map(|step| StepRef {
                key,
                title: &step.title,
                content: &step.content,
                language: Some(&step.language),
            }),
            StepKey::Execution => text(key, &self.execution),
            StepKey::Verifier => text(key, &self.verifier),
        }
    }

    /// Present steps in display order, regardless of payload field order.
    pub fn iter(&self) -> impl Iterator<Item = StepRef<'_>> {
        StepKey::ordered().filter_map(move |key| self.get(key))
    }

    pub fn present_keys(&self) -> Vec<StepKey> {
        self.iter().map(|step| step.key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Session and verdict information about a processed paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub session_id: String,
    pub filename: String,
    pub is_authentic: bool,
    pub verdict_label: Option<String>,
}

impl ResultMetadata {
    /// Label shown as the verdict: the server's label, or one derived from
    /// the authenticity flag.
    pub fn verdict(&self) -> &str {
        match self.verdict_label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ if self.is_authentic => "AUTHENTIC",
            _ => "NOT_VERIFIED",
        }
    }
}

/// A successful pipeline run, created atomically from one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: String,
    pub message: Option<String>,
    pub metadata: Option<ResultMetadata>,
    pub steps: PipelineSteps,
}

impl PipelineResult {
    pub fn new(metadata: Option<ResultMetadata>, steps: PipelineSteps) -> Self {
        Self {
            status: super::SUCCESS_STATUS.to_string(),
            message: None,
            metadata,
            steps,
        }
    }

    pub fn is_authentic(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.is_authentic)
    }
}
