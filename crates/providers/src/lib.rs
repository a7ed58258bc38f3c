//! Model provider implementations for Folio.
//!
//! All providers implement the `folio_core::Provider` trait.
//! The router selects the correct provider based on configuration, and the
//! loader probes a provider once before the assistant first relies on it.

pub mod loader;
pub mod openai_compat;
pub mod router;

pub use loader::{ModelLoader, ProbingLoader, ProgressFn, ReadyLoader};
pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
