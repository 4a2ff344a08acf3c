//! Pure projection of [`WorkflowState`] into what the user sees.
//!
//! Nothing here is stored: every call to [`render`] derives the view again,
//! including the numbered code lines of the coder step.

use crate::pipeline::{PipelineResult, StepKey, StepRef};
use crate::workflow::WorkflowState;

pub const PROCESS_BUTTON_LABEL: &str = "Process Paper";
pub const PROCESSING_BUTTON_LABEL: &str = "Processing...";
pub const PROCESSING_TEXT: &str = "Processing your research paper...";
pub const RESULTS_TITLE: &str = "Analysis Complete";
pub const AUTHENTIC_BADGE: &str = "Verified Authentic";
pub const COPY_LABEL: &str = "Copy Code";
pub const COPIED_LABEL: &str = "Copied!";
pub const NO_LOGS_PLACEHOLDER: &str = "No logs available";
/// Stands in for an empty code line so the line keeps its height.
pub const BLANK_LINE_PLACEHOLDER: &str = " ";

/// Complete visible UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub screen: Screen,
    pub overlay: Option<ProcessingOverlay>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Upload(UploadView),
    Results(ResultsView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    pub selected_file: Option<String>,
    pub error: Option<String>,
    pub process_enabled: bool,
    pub process_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub title: &'static str,
    pub authentic_badge: Option<&'static str>,
    pub metadata: Option<MetadataView>,
    pub steps: Vec<StepView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataView {
    pub session_id: String,
    pub filename: String,
    pub verdict: String,
    pub authentic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub key: StepKey,
    pub ordinal: u8,
    pub title: String,
    pub expanded: bool,
    pub body: StepBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepBody {
    /// Researcher summary, one paragraph per source line.
    Paragraphs(Vec<String>),
    /// Coder output.
    Code(CodeView),
    /// Sandbox execution logs.
    Logs(String),
    /// Verifier verdict text.
    Verdict(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeView {
    pub language: String,
    pub copy_label: &'static str,
    pub copied: bool,
    /// Raw content, what the copy button copies.
    pub source: String,
    pub lines: Vec<CodeLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine {
    /// 1-based.
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOverlay {
    pub text: &'static str,
    pub stage: Option<&'static str>,
}

/// Splits source code into numbered display lines.
pub fn code_lines(code: &str) -> Vec<CodeLine> {
    code.split('\n')
        .enumerate()
        .map(|(index, line)| CodeLine {
            number: index + 1,
            text: if line.is_empty() {
                BLANK_LINE_PLACEHOLDER.to_string()
            } else {
                line.to_string()
            },
        })
        .collect()
}

pub fn render(state: &WorkflowState) -> View {
    let overlay = state.session().map(|session| ProcessingOverlay {
        text: PROCESSING_TEXT,
        stage: session.stage(),
    });

    let screen = match state.result() {
        Some(result) => Screen::Results(render_results(state, result)),
        None => Screen::Upload(UploadView {
            selected_file: state.file().map(|file| file.name().to_string()),
            error: state.error().map(|error| error.to_string()),
            process_enabled: state.file().is_some() && !state.is_processing(),
            process_label: if state.is_processing() {
                PROCESSING_BUTTON_LABEL
            } else {
                PROCESS_BUTTON_LABEL
            },
        }),
    };

    View { screen, overlay }
}

fn render_results(state: &WorkflowState, result: &PipelineResult) -> ResultsView {
    let metadata = result.metadata.as_ref().map(|metadata| MetadataView {
        session_id: metadata.session_id.clone(),
        filename: metadata.filename.clone(),
        verdict: metadata.verdict().to_string(),
        authentic: metadata.is_authentic,
    });

    let steps = result
        .steps
        .iter()
        .map(|step| StepView {
            key: step.key,
            ordinal: step.key.ordinal(),
            title: step.title.to_string(),
            expanded: state.expansion().is_expanded(step.key),
            body: render_body(step, state.is_copied()),
        })
        .collect();

    ResultsView {
        title: RESULTS_TITLE,
        authentic_badge: result.is_authentic().then_some(AUTHENTIC_BADGE),
        metadata,
        steps,
    }
}

fn render_body(step: StepRef<'_>, copied: bool) -> StepBody {
    match step.key {
        StepKey::Researcher => {
            StepBody::Paragraphs(step.content.split('\n').map(str::to_string).collect())
        }
        StepKey::Coder => StepBody::Code(CodeView {
            language: step.language.unwrap_or_default().to_string(),
            copy_label: if copied { COPIED_LABEL } else { COPY_LABEL },
            copied,
            source: step.content.to_string(),
            lines: code_lines(step.content),
        }),
        StepKey::Execution if step.content.is_empty() => {
            StepBody::Logs(NO_LOGS_PLACEHOLDER.to_string())
        }
        StepKey::Execution => StepBody::Logs(step.content.to_string()),
        StepKey::Verifier => StepBody::Verdict(step.content.to_string()),
    }
}
