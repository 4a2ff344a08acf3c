//! Workflow controller: the shared [`WorkflowState`] plus every operation a
//! front end can trigger on it.
//!
//! The state sits behind one `tokio::sync::Mutex`. The lock is taken for each
//! transition and released before any network or clipboard await, so a front
//! end can read a consistent snapshot at any time while a submission runs.

use std::sync::Arc;
use std::time::Duration;

use r2r_core::clipboard::{COPIED_FLAG_DURATION, ClipboardWriter};
use r2r_core::intake::{CandidateFile, FileOffer, OfferSource};
use r2r_core::pipeline::{PipelineService, StepKey};
use r2r_core::session::{PROCESSING_STAGES, STAGE_INTERVAL};
use r2r_core::view::{self, View};
use r2r_core::workflow::{
    Settlement, SubmissionOutcome, SubmitRefusal, WorkflowError, WorkflowState,
};
use tokio::sync::{Mutex, mpsc};

use crate::stage_simulator::StageSimulator;

/// Notifications for front ends that re-render on change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// A simulated stage label was shown.
    StageChanged { stage: &'static str },
    /// The in-flight submission finished.
    Settled(SubmissionOutcome),
    /// The "copied" flag was raised or lowered.
    CopiedChanged { copied: bool },
}

/// What a call to [`WorkflowController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionReport {
    /// Nothing was sent.
    Refused(SubmitRefusal),
    /// A request was sent and has settled.
    Settled(SubmissionOutcome),
}

/// Settles a submission as a transport failure if it is dropped while armed.
///
/// `submit` disarms it under the state lock right before the normal
/// finalization, so exactly one of the two paths ends the session.
struct AbandonGuard {
    state: Arc<Mutex<WorkflowState>>,
    events: Option<mpsc::UnboundedSender<WorkflowEvent>>,
    armed: bool,
}

impl AbandonGuard {
    fn new(
        state: Arc<Mutex<WorkflowState>>,
        events: Option<mpsc::UnboundedSender<WorkflowEvent>>,
    ) -> Self {
        Self {
            state,
            events,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }

    fn abandon(state: &mut WorkflowState, events: Option<&mpsc::UnboundedSender<WorkflowEvent>>) {
        let outcome = state.finish_submission(Settlement::TransportFailed);
        if let Some(events) = events {
            let _ = events.send(WorkflowEvent::Settled(outcome));
        }
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!("Submission abandoned before the pipeline answered");

        match self.state.try_lock() {
            Ok(mut state) => Self::abandon(&mut state, self.events.as_ref()),
            // Another holder has the lock; finish as soon as it is released.
            Err(_) => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let state = Arc::clone(&self.state);
                    let events = self.events.take();
                    handle.spawn(async move {
                        Self::abandon(&mut *state.lock().await, events.as_ref());
                    });
                }
                Err(_) => tracing::error!("No runtime to finalize the abandoned submission"),
            },
        }
    }
}

#[derive(Clone)]
pub struct WorkflowController {
    state: Arc<Mutex<WorkflowState>>,
    pipeline: Arc<dyn PipelineService>,
    clipboard: Arc<dyn ClipboardWriter>,
    events: Option<mpsc::UnboundedSender<WorkflowEvent>>,
    stages: &'static [&'static str],
    stage_interval: Duration,
}

impl WorkflowController {
    pub fn new(pipeline: Arc<dyn PipelineService>, clipboard: Arc<dyn ClipboardWriter>) -> Self {
        Self {
            state: Arc::new(Mutex::new(WorkflowState::new())),
            pipeline,
            clipboard,
            events: None,
            stages: &PROCESSING_STAGES,
            stage_interval: STAGE_INTERVAL,
        }
    }

    /// Publishes [`WorkflowEvent`]s on `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Overrides the simulated stage labels and their period.
    pub fn with_stage_schedule(
        mut self,
        stages: &'static [&'static str],
        interval: Duration,
    ) -> Self {
        self.stages = stages;
        self.stage_interval = interval;
        self
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> WorkflowState {
        self.state.lock().await.clone()
    }

    /// Renders the current state.
    pub async fn render(&self) -> View {
        view::render(&*self.state.lock().await)
    }

    // ============================================================================
    // Intake
    // ============================================================================

    pub async fn select_file(
        &self,
        offer: Option<FileOffer>,
        source: OfferSource,
    ) -> Result<bool, WorkflowError> {
        let name = offer.as_ref().map(|o| o.name.clone());
        let result = self.state.lock().await.select_file(offer, source);
        match &result {
            Ok(true) => tracing::info!(file = ?name, ?source, "File selected"),
            Ok(false) => tracing::debug!(?source, "Nothing offered"),
            Err(_) => tracing::info!(file = ?name, ?source, "Rejected non-PDF file"),
        }
        result
    }

    pub async fn clear_file(&self) {
        self.state.lock().await.clear_file();
        tracing::debug!("File removed");
    }

    // ============================================================================
    // Submission
    // ============================================================================

    /// Sends the held file to the pipeline and waits for it to settle.
    ///
    /// Refused without any network call when no file is held or another
    /// submission is in flight. While waiting, stage labels are shown on the
    /// simulator's schedule; the simulator is dropped as soon as the request
    /// settles, before the state is finalized.
    ///
    /// Dropping the returned future before it completes abandons the request
    /// and settles the submission as a transport failure.
    pub async fn submit(&self) -> SubmissionReport {
        let file = match self.state.lock().await.begin_submission() {
            Ok(file) => file,
            Err(refusal) => {
                tracing::debug!(%refusal, "Submission refused");
                return SubmissionReport::Refused(refusal);
            }
        };

        tracing::info!(file = %file.name(), "Submitting paper");
        let guard = AbandonGuard::new(Arc::clone(&self.state), self.events.clone());
        let settlement = self.await_settlement(&file).await;
        let outcome = {
            let mut state = self.state.lock().await;
            guard.disarm();
            state.finish_submission(settlement)
        };

        match &outcome {
            SubmissionOutcome::Succeeded => {
                tracing::info!(file = %file.name(), "Paper processed");
            }
            SubmissionOutcome::Failed(error) => {
                tracing::warn!(file = %file.name(), %error, "Paper processing failed");
            }
        }
        self.emit(WorkflowEvent::Settled(outcome.clone()));
        SubmissionReport::Settled(outcome)
    }

    async fn await_settlement(&self, file: &CandidateFile) -> Settlement {
        let mut simulator = StageSimulator::with_schedule(self.stages, self.stage_interval);
        let request = self.pipeline.process_paper(file);
        tokio::pin!(request);

        loop {
            tokio::select! {
                // The response wins a tie with a tick, so no label follows settlement.
                biased;

                response = &mut request => {
                    return match response {
                        Ok(response) => Settlement::Response(response),
                        Err(err) => {
                            tracing::error!(error = %err, file = %file.name(), "Pipeline request failed");
                            Settlement::TransportFailed
                        }
                    };
                }
                Some(stage) = simulator.next_stage(), if !simulator.is_exhausted() => {
                    if self.state.lock().await.show_stage(stage) {
                        tracing::debug!(stage, "Processing stage");
                        self.emit(WorkflowEvent::StageChanged { stage });
                    }
                }
            }
        }
    }

    /// Drops file, result, error and expansion state.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
        tracing::debug!("Workflow reset");
    }

    // ============================================================================
    // Results
    // ============================================================================

    /// Flips a step's expansion. Returns the new value.
    pub async fn toggle_step(&self, key: StepKey) -> bool {
        self.state.lock().await.toggle_step(key)
    }

    /// Content of a step in the current result, if both exist.
    pub async fn step_content(&self, key: StepKey) -> Option<String> {
        let state = self.state.lock().await;
        let step = state.result()?.steps.get(key)?;
        Some(step.content.to_string())
    }

    /// Copies `text` to the clipboard.
    ///
    /// On success the "copied" flag is raised and a task lowers it after
    /// [`COPIED_FLAG_DURATION`]. On failure only a warning is logged.
    pub async fn copy_step_content(&self, text: &str) -> bool {
        if let Err(err) = self.clipboard.write_text(text).await {
            tracing::warn!(error = %err, "Failed to copy to clipboard");
            return false;
        }

        let generation = self.state.lock().await.raise_copied();
        self.emit(WorkflowEvent::CopiedChanged { copied: true });

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COPIED_FLAG_DURATION).await;
            if state.lock().await.lower_copied(generation) {
                if let Some(events) = events {
                    let _ = events.send(WorkflowEvent::CopiedChanged { copied: false });
                }
            }
        });
        true
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(events) = &self.events {
            // A front end that went away is not an error
            let _ = events.send(event);
        }
    }
}
