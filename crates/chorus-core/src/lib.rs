//! # chorus-core
//!
//! Foundation types for the Chorus assistant engine.
//!
//! This crate provides the shared vocabulary that all other Chorus crates
//! depend on:
//!
//! - **Messages**: [`messages::Message`] with sender, text, image, and
//!   transient orchestration state
//! - **Sessions**: [`session::ConversationSession`] and the mode tag
//! - **Presence**: [`presence::PresenceRecord`] plus the pure active/typing
//!   set computation
//! - **Plans**: [`plan::OrchestrationPlan`] and the closed [`plan::ActionKind`]
//!   action set
//! - **Tabular data**: [`table::DataTable`] parsed from CSV/JSON uploads
//! - **Knowledge**: [`knowledge::KnowledgeEntry`] and [`knowledge::LearnedFact`]
//! - **Visualizations**: [`viz::Visualization`] and [`viz::ChartSpec`]
//! - **Events**: [`events::ChorusEvent`] lifecycle events for UI consumers
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other chorus crates.

#![deny(unsafe_code)]

pub mod events;
pub mod knowledge;
pub mod messages;
pub mod plan;
pub mod presence;
pub mod session;
pub mod table;
pub mod text;
pub mod viz;
