//! # chorus-runtime
//!
//! The request orchestration engine and collaborative-session synchronizer.
//!
//! A submitted message flows through the [`planner::OrchestrationPlanner`]:
//! either it needs a multi-step pipeline — driven by
//! [`pipeline::PipelineController`] against the write-once
//! [`pipeline::ResultSet`] — or it takes the single-call direct-response
//! path. Independently, per-session timer tasks keep the conversation
//! shared: [`collab::PresenceSynchronizer`] pushes this viewer's liveness
//! and typing state on a heartbeat, and [`collab::SessionReconciler`] polls
//! the authoritative record and adopts it when it diverges.
//!
//! [`session::SessionController`] owns all of it: the local message
//! sequence, the attached uploads, the pipeline progress snapshot, and the
//! collaboration timer handles (constructed on activation, canceled on
//! deactivation).
//!
//! ## Crate Position
//!
//! Depends on `chorus-core`, `chorus-llm`, `chorus-store`, and
//! `chorus-settings`. Wired up by `chorus-agent`.

#![deny(unsafe_code)]

pub mod collab;
pub mod emitter;
pub mod errors;
pub mod pipeline;
pub mod planner;
pub mod prompts;
pub mod session;
pub mod state;
pub mod testutil;

pub use emitter::EventEmitter;
pub use errors::{RuntimeError, RuntimeResult};
pub use session::SessionController;
