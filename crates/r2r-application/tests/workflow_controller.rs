use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use r2r_application::{DiagnosticsLayer, SubmissionReport, WorkflowController, WorkflowEvent};
use r2r_core::clipboard::ClipboardWriter;
use r2r_core::error::{R2rError, Result};
use r2r_core::intake::{CandidateFile, FileOffer, OfferSource, PDF_MEDIA_TYPE};
use r2r_core::pipeline::{
    CodeStep, PipelineResponse, PipelineResult, PipelineService, PipelineSteps, ResultMetadata,
    StepKey,
};
use r2r_core::session::PROCESSING_STAGES;
use r2r_core::view::{Screen, StepBody};
use r2r_core::workflow::{
    Phase, SubmissionOutcome, SubmitRefusal, TRANSPORT_FAILURE_MESSAGE, WorkflowError,
};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Mocks
// ============================================================================

struct MockPipelineService {
    delay: Duration,
    reply: Result<PipelineResponse>,
    calls: AtomicUsize,
    submitted: StdMutex<Vec<String>>,
}

impl MockPipelineService {
    fn new(delay: Duration, reply: Result<PipelineResponse>) -> Self {
        Self {
            delay,
            reply,
            calls: AtomicUsize::new(0),
            submitted: StdMutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineService for MockPipelineService {
    async fn process_paper(&self, file: &CandidateFile) -> Result<PipelineResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(file.name().to_string());
        tokio::time::sleep(self.delay).await;
        self.reply.clone()
    }
}

#[derive(Default)]
struct MockClipboard {
    fail: bool,
    written: StdMutex<Vec<String>>,
}

#[async_trait]
impl ClipboardWriter for MockClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(R2rError::clipboard("no terminal attached"));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn coder_only_result() -> PipelineResponse {
    PipelineResponse::Success(PipelineResult::new(
        Some(ResultMetadata {
            session_id: "s1".to_string(),
            filename: "paper.pdf".to_string(),
            is_authentic: true,
            verdict_label: None,
        }),
        PipelineSteps {
            coder: Some(CodeStep {
                title: "Generated Implementation".to_string(),
                content: "print(1)\nprint(2)".to_string(),
                language: "python".to_string(),
            }),
            ..PipelineSteps::default()
        },
    ))
}

fn pdf_offer() -> FileOffer {
    FileOffer::from_bytes("paper.pdf", PDF_MEDIA_TYPE, b"%PDF-1.7".to_vec())
}

struct Harness {
    controller: WorkflowController,
    pipeline: Arc<MockPipelineService>,
    clipboard: Arc<MockClipboard>,
    events: mpsc::UnboundedReceiver<WorkflowEvent>,
}

fn harness(pipeline: MockPipelineService, clipboard: MockClipboard) -> Harness {
    let pipeline = Arc::new(pipeline);
    let clipboard = Arc::new(clipboard);
    let (tx, events) = mpsc::unbounded_channel();
    let controller = WorkflowController::new(pipeline.clone(), clipboard.clone()).with_events(tx);
    Harness {
        controller,
        pipeline,
        clipboard,
        events,
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn stage_count(events: &[WorkflowEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, WorkflowEvent::StageChanged { .. }))
        .count()
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_successful_submission_shows_result() {
    let mut h = harness(
        MockPipelineService::new(Duration::from_secs(7), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    let report = h.controller.submit().await;
    assert_eq!(report, SubmissionReport::Settled(SubmissionOutcome::Succeeded));

    let events = drain(&mut h.events);
    assert_eq!(
        events,
        vec![
            WorkflowEvent::StageChanged {
                stage: PROCESSING_STAGES[0]
            },
            WorkflowEvent::StageChanged {
                stage: PROCESSING_STAGES[1]
            },
            WorkflowEvent::Settled(SubmissionOutcome::Succeeded),
        ]
    );

    let state = h.controller.snapshot().await;
    assert_eq!(state.phase(), Phase::ShowingResult);
    assert!(state.session().is_none());
    assert!(state.error().is_none());
    assert!(state.expansion().is_expanded(StepKey::Coder));
    assert!(!state.expansion().is_expanded(StepKey::Researcher));
    assert_eq!(*h.pipeline.submitted.lock().unwrap(), vec!["paper.pdf"]);

    let view = h.controller.render().await;
    assert!(view.overlay.is_none());
    let Screen::Results(results) = view.screen else {
        panic!("expected results screen");
    };
    let metadata = results.metadata.unwrap();
    assert_eq!(metadata.session_id, "s1");
    assert_eq!(metadata.verdict, "AUTHENTIC");
    assert_eq!(results.steps.len(), 1);
    assert!(results.steps[0].expanded);
    match &results.steps[0].body {
        StepBody::Code(code) => {
            let lines: Vec<String> = code
                .lines
                .iter()
                .map(|line| format!("{}: {}", line.number, line.text))
                .collect();
            assert_eq!(lines, vec!["1: print(1)", "2: print(2)"]);
        }
        other => panic!("expected code body, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_at_most_five_stages_for_long_requests() {
    let mut h = harness(
        MockPipelineService::new(Duration::from_secs(60), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    h.controller.submit().await;

    let events = drain(&mut h.events);
    assert_eq!(stage_count(&events), PROCESSING_STAGES.len());
    let shown: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::StageChanged { stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(shown, PROCESSING_STAGES.to_vec());
    assert_eq!(
        events.last(),
        Some(&WorkflowEvent::Settled(SubmissionOutcome::Succeeded))
    );
}

#[tokio::test(start_paused = true)]
async fn test_response_on_a_tick_wins() {
    let mut h = harness(
        MockPipelineService::new(Duration::from_secs(6), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    h.controller.submit().await;

    // The second tick and the response land on the same instant
    let events = drain(&mut h.events);
    assert_eq!(stage_count(&events), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fast_response_shows_no_stage() {
    let mut h = harness(
        MockPipelineService::new(Duration::from_millis(100), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    h.controller.submit().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    let events = drain(&mut h.events);
    assert_eq!(stage_count(&events), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_file_makes_no_call() {
    let h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard::default(),
    );

    let report = h.controller.submit().await;

    assert_eq!(report, SubmissionReport::Refused(SubmitRefusal::NoFile));
    assert_eq!(h.pipeline.calls(), 0);
    assert_eq!(h.controller.snapshot().await.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_second_submit_while_active_is_refused() {
    let h = harness(
        MockPipelineService::new(Duration::from_secs(10), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    let (first, second) = tokio::join!(h.controller.submit(), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let view = h.controller.render().await;
        assert!(view.overlay.is_some());
        h.controller.submit().await
    });

    assert_eq!(first, SubmissionReport::Settled(SubmissionOutcome::Succeeded));
    assert_eq!(second, SubmissionReport::Refused(SubmitRefusal::AlreadyActive));
    assert_eq!(h.pipeline.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stage_label_visible_while_active() {
    let h = harness(
        MockPipelineService::new(Duration::from_secs(10), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    tokio::join!(h.controller.submit(), async {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let state = h.controller.snapshot().await;
        assert_eq!(state.phase(), Phase::Active);
        assert_eq!(state.session().unwrap().stage(), None);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let state = h.controller.snapshot().await;
        assert_eq!(state.session().unwrap().stage(), Some(PROCESSING_STAGES[0]));
    });

    assert!(h.controller.snapshot().await.session().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failure_response_sets_server_message() {
    let mut h = harness(
        MockPipelineService::new(
            Duration::from_secs(1),
            Ok(PipelineResponse::Failure {
                message: Some("extraction failed".to_string()),
            }),
        ),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    let report = h.controller.submit().await;

    let expected = WorkflowError::ApplicationFailure("extraction failed".to_string());
    assert_eq!(
        report,
        SubmissionReport::Settled(SubmissionOutcome::Failed(expected.clone()))
    );
    let state = h.controller.snapshot().await;
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.result().is_none());
    assert_eq!(state.error(), Some(&expected));
    // The file stays held so the user can retry
    assert!(state.file().is_some());

    match h.controller.render().await.screen {
        Screen::Upload(upload) => {
            assert_eq!(upload.error.as_deref(), Some("extraction failed"));
            assert!(upload.process_enabled);
        }
        other => panic!("expected upload screen, got {other:?}"),
    }
    assert_eq!(
        drain(&mut h.events).last(),
        Some(&WorkflowEvent::Settled(SubmissionOutcome::Failed(expected)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_logs_cause() {
    let (diag_tx, mut diag_rx) = mpsc::unbounded_channel();
    let subscriber =
        tracing_subscriber::registry().with(DiagnosticsLayer::new(diag_tx, tracing::Level::ERROR));
    let _guard = tracing::subscriber::set_default(subscriber);

    let h = harness(
        MockPipelineService::new(
            Duration::from_millis(10),
            Err(R2rError::transport("connection refused")),
        ),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    let report = h.controller.submit().await;

    assert_eq!(
        report,
        SubmissionReport::Settled(SubmissionOutcome::Failed(WorkflowError::TransportFailure))
    );
    let state = h.controller.snapshot().await;
    assert_eq!(state.error(), Some(&WorkflowError::TransportFailure));
    assert_eq!(
        state.error().unwrap().to_string(),
        TRANSPORT_FAILURE_MESSAGE
    );

    let mut causes = Vec::new();
    while let Ok(event) = diag_rx.try_recv() {
        if let Some(cause) = event.field_str("error") {
            causes.push(cause.to_string());
        }
    }
    assert!(
        causes.iter().any(|c| c.contains("connection refused")),
        "cause not logged: {causes:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_without_message_uses_fallback() {
    let h = harness(
        MockPipelineService::new(
            Duration::from_secs(1),
            Ok(PipelineResponse::Failure { message: None }),
        ),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    let report = h.controller.submit().await;
    assert_eq!(
        report,
        SubmissionReport::Settled(SubmissionOutcome::Failed(
            WorkflowError::application_failure(None)
        ))
    );
    assert_eq!(
        h.controller.snapshot().await.error().unwrap().to_string(),
        "An error occurred while processing the paper"
    );
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_submission_settles_as_transport_failure() {
    let mut h = harness(
        MockPipelineService::new(Duration::from_secs(60), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    let timed_out = tokio::time::timeout(Duration::from_secs(4), h.controller.submit()).await;
    assert!(timed_out.is_err());

    let state = h.controller.snapshot().await;
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.session().is_none());
    assert_eq!(state.error(), Some(&WorkflowError::TransportFailure));
    assert!(state.file().is_some());
    assert_eq!(
        drain(&mut h.events).last(),
        Some(&WorkflowEvent::Settled(SubmissionOutcome::Failed(
            WorkflowError::TransportFailure
        )))
    );

    // Nothing left behind blocks the next attempt
    tokio::time::sleep(Duration::from_secs(120)).await;
    let report = h.controller.submit().await;
    assert_eq!(report, SubmissionReport::Settled(SubmissionOutcome::Succeeded));
    assert_eq!(h.pipeline.calls(), 2);
    assert_eq!(
        drain(&mut h.events)
            .iter()
            .filter(|e| matches!(e, WorkflowEvent::Settled(_)))
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_completed_submission_is_not_settled_twice() {
    let mut h = harness(
        MockPipelineService::new(Duration::from_secs(1), Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    h.controller.submit().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let settled: Vec<_> = drain(&mut h.events)
        .into_iter()
        .filter(|e| matches!(e, WorkflowEvent::Settled(_)))
        .collect();
    assert_eq!(
        settled,
        vec![WorkflowEvent::Settled(SubmissionOutcome::Succeeded)]
    );
    assert!(h.controller.snapshot().await.error().is_none());
}

// ============================================================================
// Intake and reset
// ============================================================================

#[tokio::test]
async fn test_non_pdf_keeps_held_file() {
    let h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();

    let err = h
        .controller
        .select_file(
            Some(FileOffer::from_bytes("notes.txt", "text/plain", b"hi".to_vec())),
            OfferSource::Browse,
        )
        .await
        .unwrap_err();

    assert_eq!(err, WorkflowError::InvalidFileType);
    let state = h.controller.snapshot().await;
    assert_eq!(state.file().unwrap().name(), "paper.pdf");
    assert_eq!(state.error(), Some(&WorkflowError::InvalidFileType));
}

#[tokio::test]
async fn test_reset_after_result() {
    let h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Browse)
        .await
        .unwrap();
    h.controller.submit().await;
    assert_eq!(h.controller.snapshot().await.phase(), Phase::ShowingResult);

    h.controller.reset().await;

    let state = h.controller.snapshot().await;
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.file().is_none());
    assert!(state.result().is_none());
    assert!(state.error().is_none());
    assert!(state.expansion().is_empty());
    assert_eq!(state.picker().value(), None);
}

#[tokio::test]
async fn test_toggle_step() {
    let h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();
    h.controller.submit().await;

    assert!(!h.controller.toggle_step(StepKey::Coder).await);
    assert!(h.controller.toggle_step(StepKey::Coder).await);
    // Absent keys start collapsed
    assert!(h.controller.toggle_step(StepKey::Verifier).await);
}

// ============================================================================
// Clipboard
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_copied_flag_clears_after_two_seconds() {
    let mut h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard::default(),
    );
    h.controller
        .select_file(Some(pdf_offer()), OfferSource::Drop)
        .await
        .unwrap();
    h.controller.submit().await;
    drain(&mut h.events);

    let code = h.controller.step_content(StepKey::Coder).await.unwrap();
    assert!(h.controller.copy_step_content(&code).await);
    assert_eq!(
        *h.clipboard.written.lock().unwrap(),
        vec!["print(1)\nprint(2)"]
    );
    assert!(h.controller.snapshot().await.is_copied());

    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert!(h.controller.snapshot().await.is_copied());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(!h.controller.snapshot().await.is_copied());

    assert_eq!(
        drain(&mut h.events),
        vec![
            WorkflowEvent::CopiedChanged { copied: true },
            WorkflowEvent::CopiedChanged { copied: false },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_second_copy_restarts_window() {
    let h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard::default(),
    );

    assert!(h.controller.copy_step_content("a").await);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(h.controller.copy_step_content("b").await);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(h.controller.snapshot().await.is_copied());

    tokio::time::sleep(Duration::from_millis(1001)).await;
    assert!(!h.controller.snapshot().await.is_copied());
}

#[tokio::test]
async fn test_clipboard_failure_leaves_flag_down() {
    let h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard {
            fail: true,
            ..MockClipboard::default()
        },
    );

    assert!(!h.controller.copy_step_content("print(1)").await);
    let state = h.controller.snapshot().await;
    assert!(!state.is_copied());
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_step_content_requires_result() {
    let h = harness(
        MockPipelineService::new(Duration::ZERO, Ok(coder_only_result())),
        MockClipboard::default(),
    );
    assert_eq!(h.controller.step_content(StepKey::Coder).await, None);
}
