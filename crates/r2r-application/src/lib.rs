//! Application layer: runs the workflow against the pipeline and clipboard
//! boundaries.

pub mod stage_simulator;
pub mod tracing_layer;
pub mod workflow_controller;

pub use stage_simulator::StageSimulator;
pub use tracing_layer::{DiagnosticEvent, DiagnosticsLayer};
pub use workflow_controller::{SubmissionReport, WorkflowController, WorkflowEvent};
