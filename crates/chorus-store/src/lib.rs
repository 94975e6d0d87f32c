//! # chorus-store
//!
//! Persistence collaborator clients for the Chorus engine.
//!
//! The engine treats every record type — conversation sessions, presence,
//! knowledge entries, learned facts, visualizations, uploaded files, the
//! viewer identity — as externally owned. This crate defines the contracts
//! the engine consumes ([`traits`]), the reqwest-backed implementation over
//! the REST CRUD API ([`http::HttpStore`]), and an in-process implementation
//! for tests and embedding ([`memory::InMemoryStore`]).
//!
//! ## Crate Position
//!
//! Depends on `chorus-core`. Consumed by `chorus-runtime` and wired up in
//! `chorus-agent`.

#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use http::HttpStore;
pub use memory::InMemoryStore;
pub use traits::{
    FileStore, IdentityStore, KnowledgeStore, LearningStore, PresenceStore, SessionStore,
    Stores, VisualizationStore,
};
