//! # chorus-llm
//!
//! Generation collaborators for the Chorus engine.
//!
//! The engine never talks to a model vendor directly; it consumes two small
//! contracts — [`TextProvider`] for (optionally schema-constrained) text
//! generation and [`ImageProvider`] for image generation — and the gateway
//! backend does the vendor pass-through. [`GatewayClient`] is the
//! reqwest-backed implementation of both contracts.
//!
//! ## Crate Position
//!
//! Leaf crate. Consumed by `chorus-runtime` and wired up in `chorus-agent`.

#![deny(unsafe_code)]

pub mod gateway;
pub mod provider;

pub use gateway::GatewayClient;
pub use provider::{
    GenerateRequest, ImageProvider, ProviderError, ProviderResult, TextProvider,
};
