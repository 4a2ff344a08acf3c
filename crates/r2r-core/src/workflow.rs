//! The upload → processing → result state machine.
//!
//! All client state lives in one [`WorkflowState`] and changes only through
//! the named operations below:
//!
//! ```text
//! IDLE --begin_submission--> ACTIVE
//! ACTIVE --finish_submission(success)--> SHOWING_RESULT
//! ACTIVE --finish_submission(failure)--> IDLE (error set)
//! SHOWING_RESULT --reset--> IDLE
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clipboard::ClipboardFlag;
use crate::expansion::StepExpansion;
use crate::intake::{CandidateFile, FileHandle, FileOffer, FilePicker, OfferSource};
use crate::pipeline::{PipelineResponse, PipelineResult, StepKey};
use crate::session::ProcessingSession;

pub const INVALID_FILE_TYPE_MESSAGE: &str = "Please upload a PDF file";
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while processing the paper";
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Failed to connect to the server. Please ensure the backend is running.";

/// Errors the user gets to see. Each one leaves the machine in IDLE.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum WorkflowError {
    /// A non-PDF file was offered.
    #[error("Please upload a PDF file")]
    InvalidFileType,

    /// The backend answered with a non-success status.
    #[error("{0}")]
    ApplicationFailure(String),

    /// The request did not complete. Details go to the log only.
    #[error("Failed to connect to the server. Please ensure the backend is running.")]
    TransportFailure,
}

impl WorkflowError {
    /// Uses the server message verbatim, or the generic text when it is
    /// missing or empty.
    pub fn application_failure(message: Option<String>) -> Self {
        match message {
            Some(message) if !message.is_empty() => Self::ApplicationFailure(message),
            _ => Self::ApplicationFailure(GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }
}

/// Coarse state of the machine, derived from the state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Active,
    ShowingResult,
}

/// Why `begin_submission` did not start anything.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRefusal {
    #[error("no file selected")]
    NoFile,
    #[error("a submission is already in progress")]
    AlreadyActive,
}

/// How the network call of a submission settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Response(PipelineResponse),
    TransportFailed,
}

/// Result of finishing a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Succeeded,
    Failed(WorkflowError),
}

/// Everything the client knows, in one place.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    file: Option<CandidateFile>,
    picker: FilePicker,
    session: Option<ProcessingSession>,
    result: Option<PipelineResult>,
    error: Option<WorkflowError>,
    expansion: StepExpansion,
    clipboard: ClipboardFlag,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn file(&self) -> Option<&CandidateFile> {
        self.file.as_ref()
    }

    pub fn picker(&self) -> &FilePicker {
        &self.picker
    }

    pub fn session(&self) -> Option<&ProcessingSession> {
        self.session.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.session.is_some()
    }

    pub fn result(&self) -> Option<&PipelineResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }

    pub fn expansion(&self) -> &StepExpansion {
        &self.expansion
    }

    pub fn is_copied(&self) -> bool {
        self.clipboard.is_raised()
    }

    pub fn phase(&self) -> Phase {
        if self.session.is_some() {
            Phase::Active
        } else if self.result.is_some() {
            Phase::ShowingResult
        } else {
            Phase::Idle
        }
    }

    // ============================================================================
    // Intake
    // ============================================================================

    /// Offers a file to the intake controller.
    ///
    /// - `None` (nothing offered, e.g. a cancelled dialog) changes nothing and
    ///   returns `Ok(false)`.
    /// - A PDF replaces the held file, clears the error and returns `Ok(true)`.
    /// - Anything else sets [`WorkflowError::InvalidFileType`] and keeps the
    ///   held file.
    pub fn select_file(
        &mut self,
        offer: Option<FileOffer>,
        source: OfferSource,
    ) -> Result<bool, WorkflowError> {
        let Some(offer) = offer else {
            return Ok(false);
        };

        match CandidateFile::try_from_offer(offer) {
            Ok(file) => {
                let picker_value = match (source, file.handle()) {
                    (OfferSource::Browse, FileHandle::Path(path)) => {
                        Some(path.display().to_string())
                    }
                    (OfferSource::Browse, FileHandle::Memory(_)) => Some(file.name().to_string()),
                    (OfferSource::Drop, _) => None,
                };
                self.picker.set(picker_value);
                self.file = Some(file);
                self.error = None;
                Ok(true)
            }
            Err(_) => {
                self.error = Some(WorkflowError::InvalidFileType);
                Err(WorkflowError::InvalidFileType)
            }
        }
    }

    /// Removes the held file, the pending error and the picker value.
    pub fn clear_file(&mut self) {
        self.file = None;
        self.error = None;
        self.picker.reset();
    }

    // ============================================================================
    // Submission
    // ============================================================================

    /// Starts a submission and returns the file to send.
    ///
    /// Refused when no file is held or a submission is already active.
    /// Otherwise the previous error, result and expansion state are dropped.
    pub fn begin_submission(&mut self) -> Result<CandidateFile, SubmitRefusal> {
        if self.session.is_some() {
            return Err(SubmitRefusal::AlreadyActive);
        }
        let file = self.file.clone().ok_or(SubmitRefusal::NoFile)?;

        self.session = Some(ProcessingSession::new());
        self.error = None;
        self.result = None;
        self.expansion.clear();
        Ok(file)
    }

    /// Shows a simulated stage label. Ignored when nothing is in flight.
    pub fn show_stage(&mut self, stage: &'static str) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.show_stage(stage);
                true
            }
            None => false,
        }
    }

    /// Single finalization path of a submission.
    ///
    /// Always ends the processing session and clears the stage label, then
    /// applies the outcome: a success becomes the result with all present
    /// steps expanded; anything else becomes the visible error.
    pub fn finish_submission(&mut self, settlement: Settlement) -> SubmissionOutcome {
        self.session = None;

        match settlement {
            Settlement::Response(PipelineResponse::Success(result)) => {
                self.expansion.expand_only(result.steps.present_keys());
                self.result = Some(result);
                self.error = None;
                SubmissionOutcome::Succeeded
            }
            Settlement::Response(PipelineResponse::Failure { message }) => {
                let error = WorkflowError::application_failure(message);
                self.error = Some(error.clone());
                SubmissionOutcome::Failed(error)
            }
            Settlement::TransportFailed => {
                self.error = Some(WorkflowError::TransportFailure);
                SubmissionOutcome::Failed(WorkflowError::TransportFailure)
            }
        }
    }

    /// Drops the file, the result, the error and the expansion state.
    pub fn reset(&mut self) {
        self.file = None;
        self.result = None;
        self.error = None;
        self.expansion.clear();
        self.picker.reset();
    }

    // ============================================================================
    // Results
    // ============================================================================

    pub fn toggle_step(&mut self, key: StepKey) -> bool {
        self.expansion.toggle(key)
    }

    pub fn raise_copied(&mut self) -> u64 {
        self.clipboard.raise()
    }

    pub fn lower_copied(&mut self, generation: u64) -> bool {
        self.clipboard.lower(generation)
    }
}
