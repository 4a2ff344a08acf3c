//! Processing session: exists only while a submission is in flight.

use std::time::Duration;

/// Cosmetic progress labels shown while the pipeline request is pending.
///
/// They are generated locally on a fixed schedule and carry no information
/// about the backend's real progress.
pub const PROCESSING_STAGES: [&str; 5] = [
    "Extracting text from PDF...",
    "Researcher agent analyzing paper...",
    "Coder agent generating implementation...",
    "Executing code in Docker sandbox...",
    "Verifier agent validating results...",
];

/// Period between two simulated stage labels.
pub const STAGE_INTERVAL: Duration = Duration::from_millis(3000);

/// An in-flight submission.
///
/// Being active is represented by the session existing at all, so a stage
/// label can never outlive the submission it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingSession {
    stage: Option<&'static str>,
    stages_shown: usize,
}

impl ProcessingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent stage label, if the simulator has emitted one yet.
    pub fn stage(&self) -> Option<&'static str> {
        self.stage
    }

    /// Number of labels shown during this session.
    pub fn stages_shown(&self) -> usize {
        self.stages_shown
    }

    pub(crate) fn show_stage(&mut self, stage: &'static str) {
        self.stage = Some(stage);
        self.stages_shown += 1;
    }
}
