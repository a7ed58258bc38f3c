//! The Folio assistant — answers visitor questions about one profile.
//!
//! A turn flows through the crate like this:
//!
//! ```text
//! query ─► CachedEmbedder ─► rank() over build_documents(profile)
//!                               │
//!                               ▼
//!                    top-k context ─► Composer
//!                                      ├─ Generator (streamed LLM)
//!                                      └─ TemplateComposer (on failure)
//!                               │
//!   embedding failure ──────────┴─► fallback_search()
//!                               ▼
//!        AssistantSession records the exchange and publishes events
//! ```

pub mod composer;
pub mod conversation;
pub mod documents;
pub mod embedder;
pub mod event;
pub mod fallback;
pub mod ranker;
pub mod session;
pub mod templates;
pub mod transcript;

#[cfg(test)]
mod test_helpers;

pub use composer::{ComposedResponse, Composer, GenerationSettings, Generator, Strategy};
pub use conversation::{ConversationState, ConversationTurn};
pub use documents::{Category, ProfileDocument, build_documents};
pub use embedder::{CachedEmbedder, LazyModel, LoadingTracker};
pub use event::{AssistantEvent, EventBus, LoadingState};
pub use fallback::fallback_search;
pub use ranker::{ScoredDocument, cosine_similarity, rank};
pub use session::{AssistantSession, SessionBuilder, TurnOutcome};
pub use templates::{Intent, NoPhrases, PhrasePicker, RandomPhrases, TemplateComposer};
pub use transcript::{Sender, Transcript, TranscriptEntry};
