//! The orchestration pipeline: result accumulation, per-action execution,
//! and the controller driving a plan to completion.

pub mod controller;
pub mod executor;
pub mod results;

pub use controller::{PipelineController, PipelineOutcome};
pub use executor::{ActionExecutor, ActionOutcome};
pub use results::{ResultSet, StepResult};
