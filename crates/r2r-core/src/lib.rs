//! Domain model of the Research2Runtime client.
//!
//! The whole client state is one [`WorkflowState`](workflow::WorkflowState),
//! changed only through its named operations. [`view::render`] projects it
//! into what the user sees. The remote pipeline and the clipboard are reached
//! through the [`PipelineService`](pipeline::PipelineService) and
//! [`ClipboardWriter`](clipboard::ClipboardWriter) traits, implemented in
//! other crates.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod expansion;
pub mod intake;
pub mod pipeline;
pub mod session;
pub mod view;
pub mod workflow;

// Re-export common types
pub use error::R2rError;
pub use workflow::{Phase, WorkflowError, WorkflowState};
