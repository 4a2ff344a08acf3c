//! Pipeline result domain.
//!
//! # Module Structure
//!
//! - `model`: result, metadata and step types (`PipelineResult`, `StepKey`, ...)
//! - `service`: boundary trait to the remote pipeline (`PipelineService`)

mod model;
mod service;

pub use model::{
    CodeStep, DEFAULT_CODE_LANGUAGE, PipelineResult, PipelineSteps, ResultMetadata, Step,
    StepKey, StepRef,
};
pub use service::{PipelineResponse, PipelineService, SUCCESS_STATUS};
