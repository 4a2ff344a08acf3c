//! `r2r process <file>`: one submission, then exit.

use std::path::Path;

use anyhow::{Result, bail};
use r2r_application::{SubmissionReport, WorkflowController, WorkflowEvent};
use r2r_core::intake::OfferSource;
use r2r_core::view::PROCESSING_TEXT;
use r2r_core::workflow::SubmissionOutcome;
use r2r_infrastructure::file_source;
use tokio::sync::mpsc;

use super::drive_submission;
use crate::render;

pub async fn run(
    controller: WorkflowController,
    mut events: mpsc::UnboundedReceiver<WorkflowEvent>,
    file: &Path,
) -> Result<()> {
    let offer = file_source::offer_from_path(file).await?;
    if let Err(err) = controller.select_file(Some(offer), OfferSource::Browse).await {
        bail!("{}", err);
    }

    render::print_notice(PROCESSING_TEXT);
    match drive_submission(&controller, &mut events).await {
        SubmissionReport::Settled(SubmissionOutcome::Succeeded) => {
            render::print_view(&controller.render().await);
            Ok(())
        }
        SubmissionReport::Settled(SubmissionOutcome::Failed(err)) => bail!("{}", err),
        SubmissionReport::Refused(refusal) => bail!("{}", refusal),
    }
}
