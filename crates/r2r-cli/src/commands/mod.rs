pub mod process;
pub mod repl;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use r2r_application::{SubmissionReport, WorkflowController, WorkflowEvent};
use r2r_core::config::ClientConfig;
use r2r_infrastructure::Osc52Clipboard;
use r2r_interaction::HttpPipelineClient;
use tokio::sync::mpsc;

use crate::render;

/// Wires the HTTP pipeline client and the terminal clipboard into a controller.
pub fn build_controller(
    config: &ClientConfig,
    events: mpsc::UnboundedSender<WorkflowEvent>,
) -> Result<WorkflowController> {
    let pipeline = match config.api.timeout_secs {
        Some(secs) => {
            HttpPipelineClient::with_timeout(&config.api.base_url, Duration::from_secs(secs))?
        }
        None => HttpPipelineClient::new(&config.api.base_url),
    };
    let clipboard = Osc52Clipboard::stdout();

    Ok(WorkflowController::new(Arc::new(pipeline), Arc::new(clipboard)).with_events(events))
}

/// Runs a submission, printing stage labels as they arrive.
pub async fn drive_submission(
    controller: &WorkflowController,
    events: &mut mpsc::UnboundedReceiver<WorkflowEvent>,
) -> SubmissionReport {
    watch_submission(controller, events, render::print_stage).await
}

async fn watch_submission(
    controller: &WorkflowController,
    events: &mut mpsc::UnboundedReceiver<WorkflowEvent>,
    mut on_stage: impl FnMut(&'static str),
) -> SubmissionReport {
    // Leftovers such as clipboard notifications are not for this submission
    while events.try_recv().is_ok() {}

    let submission = controller.submit();
    tokio::pin!(submission);

    let report = loop {
        tokio::select! {
            // Queued labels are handled before the report is taken.
            biased;

            Some(event) = events.recv() => {
                if let WorkflowEvent::StageChanged { stage } = event {
                    on_stage(stage);
                }
            }
            report = &mut submission => break report,
        }
    };

    // Labels sent in the same poll that settled the submission
    while let Ok(event) = events.try_recv() {
        if let WorkflowEvent::StageChanged { stage } = event {
            on_stage(stage);
        }
    }
    report
}
