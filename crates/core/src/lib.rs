//! # Folio Core
//!
//! Domain types, traits, and error definitions for the Folio portfolio
//! assistant. This crate has **zero framework dependencies**. It defines the
//! profile model, the conversation messages, and the provider seam that every
//! other crate implements against.
//!
//! ## Design Philosophy
//!
//! Model backends are defined as a trait here and implemented in
//! `folio-providers`. This enables:
//! - Swapping embedding / generation backends via configuration
//! - Easy testing with scripted stub providers
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod profile;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GenerationError, ProfileError, ProviderError, Result};
pub use message::{Message, Role};
pub use profile::Profile;
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    SamplingParams, StreamChunk,
};
