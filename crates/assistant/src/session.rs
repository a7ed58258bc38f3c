//! Assistant session — the public entry point for answering questions.
//!
//! One session owns everything that lives across turns: the profile, the
//! lazily loaded models and their embedding cache, the conversation window,
//! the transcript and the event bus. Turns take `&mut self`, so two turns can
//! never interleave; callers that share a session put it behind a lock.

use crate::composer::{ComposedResponse, Composer, GenerationSettings, Generator, Strategy};
use crate::conversation::{ConversationState, DEFAULT_MAX_TURNS};
use crate::documents::{ProfileDocument, build_documents};
use crate::embedder::{CachedEmbedder, LazyModel, LoadingTracker};
use crate::event::{AssistantEvent, EventBus, LoadingState};
use crate::templates::{PhrasePicker, RandomPhrases, TemplateComposer};
use crate::transcript::{Transcript, TranscriptEntry};
use folio_config::{AppConfig, GenerationStrategy};
use folio_core::error::Error;
use folio_core::profile::Profile;
use folio_providers::loader::{ModelLoader, ProbingLoader};
use folio_providers::router::build_from_config;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// The result of one answered query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub text: String,
    pub sections: Vec<ProfileDocument>,
    pub strategy: Strategy,
}

/// Builder for [`AssistantSession`].
pub struct SessionBuilder {
    profile: Profile,
    embedding: Option<(Arc<dyn ModelLoader>, String)>,
    generation: Option<(Arc<dyn ModelLoader>, GenerationSettings)>,
    top_k: usize,
    max_turns: usize,
    min_score: f32,
    personal_touches: bool,
    picker: Option<Arc<dyn PhrasePicker>>,
    event_capacity: usize,
}

impl SessionBuilder {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            embedding: None,
            generation: None,
            top_k: 3,
            max_turns: DEFAULT_MAX_TURNS,
            min_score: 0.1,
            personal_touches: true,
            picker: None,
            event_capacity: 256,
        }
    }

    /// Embedding model. Without one every turn is answered by keyword search.
    pub fn embedding(mut self, loader: Arc<dyn ModelLoader>, model: impl Into<String>) -> Self {
        self.embedding = Some((loader, model.into()));
        self
    }

    /// Generative model. Without one answers come from templates.
    pub fn generation(mut self, loader: Arc<dyn ModelLoader>, settings: GenerationSettings) -> Self {
        self.generation = Some((loader, settings));
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn personal_touches(mut self, enabled: bool) -> Self {
        self.personal_touches = enabled;
        self
    }

    pub fn phrase_picker(mut self, picker: Arc<dyn PhrasePicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> AssistantSession {
        let events = EventBus::new(self.event_capacity);
        let tracker = Arc::new(LoadingTracker::new(events.clone()));

        let embedder = self.embedding.map(|(loader, model)| {
            CachedEmbedder::new(LazyModel::new(loader, Arc::clone(&tracker)), model)
        });
        let generator = self.generation.map(|(loader, settings)| {
            Generator::new(LazyModel::new(loader, Arc::clone(&tracker)), settings)
        });
        let picker = self
            .picker
            .unwrap_or_else(|| Arc::new(RandomPhrases::new()));
        let templates = TemplateComposer::new(self.min_score, self.personal_touches, picker);

        AssistantSession {
            profile: self.profile,
            composer: Composer::new(embedder, generator, templates, self.top_k),
            conversation: ConversationState::new(self.max_turns),
            transcript: Transcript::new(),
            events,
            tracker,
        }
    }
}

pub struct AssistantSession {
    profile: Profile,
    composer: Composer,
    conversation: ConversationState,
    transcript: Transcript,
    events: EventBus,
    tracker: Arc<LoadingTracker>,
}

impl AssistantSession {
    pub fn builder(profile: Profile) -> SessionBuilder {
        SessionBuilder::new(profile)
    }

    /// Build a session with remote providers as described by `config`.
    pub fn from_config(config: &AppConfig, profile: Profile) -> Result<Self, Error> {
        let router = build_from_config(config);

        let embedding_provider = router
            .get_or_default(config.embedding_provider())
            .ok_or_else(|| Error::Config {
                message: format!(
                    "embedding provider '{}' is not available",
                    config.embedding_provider()
                ),
            })?;

        let mut builder = Self::builder(profile)
            .embedding(
                Arc::new(ProbingLoader::new(
                    embedding_provider,
                    &config.embedding.model,
                )),
                &config.embedding.model,
            )
            .top_k(config.retrieval.top_k)
            .max_turns(config.conversation.max_turns)
            .min_score(config.templates.min_score)
            .personal_touches(config.templates.personal_touches);

        if config.generation.strategy == GenerationStrategy::Llm {
            let provider = router
                .get_or_default(config.generation_provider())
                .ok_or_else(|| Error::Config {
                    message: format!(
                        "generation provider '{}' is not available",
                        config.generation_provider()
                    ),
                })?;
            builder = builder.generation(
                Arc::new(ProbingLoader::new(provider, &config.generation.model)),
                GenerationSettings::from_config(&config.generation),
            );
        }

        Ok(builder.build())
    }

    /// Answer one visitor query.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the reply streams
    /// as `StreamingResponse { done: false }` events, the exchange is recorded,
    /// and exactly one `StreamingResponse { done: true }` is published.
    pub async fn submit_query(&mut self, text: &str) -> Option<TurnOutcome> {
        let query = text.trim();
        if query.is_empty() {
            return None;
        }
        info!(query_len = query.len(), "Answering query");

        self.transcript.push_user(query);
        self.transcript.begin_reply();

        let events = &self.events;
        let transcript = &mut self.transcript;
        let mut on_partial = |content: &str| {
            let event = AssistantEvent::StreamingResponse {
                content: content.to_string(),
                done: false,
                sections: None,
            };
            transcript.apply(&event);
            events.publish(event);
        };

        let ComposedResponse {
            text,
            sections,
            strategy,
        } = self
            .composer
            .generate(&self.profile, query, &self.conversation, &mut on_partial)
            .await;

        let text = if text.trim().is_empty() {
            apology(&self.profile)
        } else {
            text
        };
        let shown_sections = (!sections.is_empty()).then(|| sections.clone());

        self.conversation
            .push_exchange(query, text.clone(), shown_sections.clone());

        let done = AssistantEvent::StreamingResponse {
            content: text.clone(),
            done: true,
            sections: shown_sections,
        };
        self.transcript.apply(&done);
        self.events.publish(done);

        info!(strategy = strategy.as_str(), "Turn complete");
        Some(TurnOutcome {
            text,
            sections,
            strategy,
        })
    }

    /// Register an observer for loading and streaming events.
    pub fn subscribe(&self) -> broadcast::Receiver<AssistantEvent> {
        self.events.subscribe()
    }

    /// A handle to the event bus, usable without holding the session.
    pub fn event_bus(&self) -> EventBus {
        self.events.clone()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.tracker.current()
    }

    /// Shared handle to the loading state, readable while a turn runs.
    pub fn loading_tracker(&self) -> Arc<LoadingTracker> {
        Arc::clone(&self.tracker)
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.transcript.entries()
    }

    pub fn documents(&self) -> Vec<ProfileDocument> {
        build_documents(&self.profile)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn has_generator(&self) -> bool {
        self.composer.has_generator()
    }

    /// Forget the conversation and transcript. Loaded models and cached
    /// embeddings are kept.
    pub fn reset(&mut self) {
        self.conversation.clear();
        self.transcript.clear();
        info!("Session reset");
    }
}

/// Shown when every strategy produced an empty answer.
pub fn apology(profile: &Profile) -> String {
    format!(
        "I apologize, but I'm having trouble generating a response. Please try asking a different question about {}'s background, skills, or experience.",
        profile.basics.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::transcript::Sender;

    fn drain(rx: &mut broadcast::Receiver<AssistantEvent>) -> Vec<AssistantEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn streaming(events: &[AssistantEvent]) -> Vec<(String, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                AssistantEvent::StreamingResponse { content, done, .. } => {
                    Some((content.clone(), *done))
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let mut session = session_with(Arc::new(KeywordEmbedder::default()), None);
        let mut rx = session.subscribe();
        assert!(session.submit_query("   ").await.is_none());
        assert!(session.submit_query("").await.is_none());
        assert!(session.transcript().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn scenario_skills_via_templates() {
        let mut session = session_with(Arc::new(KeywordEmbedder::default()), None);
        let outcome = session.submit_query("What are your skills?").await.unwrap();
        assert_eq!(outcome.strategy, Strategy::Template);
        assert!(outcome.text.contains("JavaScript"));
        assert!(outcome.text.contains("Python"));
    }

    #[tokio::test]
    async fn scenario_contact_contains_email() {
        let mut session = session_with(Arc::new(KeywordEmbedder::default()), None);
        let outcome = session.submit_query("How can I contact you?").await.unwrap();
        assert!(outcome.text.contains("ada@example.com"));
    }

    #[tokio::test]
    async fn scenario_embedding_down_uses_fallback_search() {
        let mut session = session_with(Arc::new(FailingProvider), None);
        let outcome = session.submit_query("Tell me about your projects").await.unwrap();
        assert_eq!(outcome.strategy, Strategy::FallbackSearch);
        assert!(outcome.text.contains("Engine Notes"));
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn scenario_streaming_contract() {
        let mut session = session_with(
            Arc::new(KeywordEmbedder::default()),
            Some(Arc::new(ScriptedStream::new(&["Hello", " world."]))),
        );
        let mut rx = session.subscribe();
        let outcome = session.submit_query("Say hello").await.unwrap();
        assert_eq!(outcome.strategy, Strategy::Llm);

        let stream = streaming(&drain(&mut rx));
        assert_eq!(
            stream,
            vec![
                ("Hello".to_string(), false),
                ("Hello world.".to_string(), false),
                ("Hello world.".to_string(), true),
            ]
        );
        assert_eq!(stream.iter().filter(|(_, done)| *done).count(), 1);
        assert!(stream.last().unwrap().1);
    }

    #[tokio::test]
    async fn loading_events_precede_streaming() {
        let mut session = session_with(
            Arc::new(KeywordEmbedder::default()),
            Some(Arc::new(ScriptedStream::new(&["Hi."]))),
        );
        let mut rx = session.subscribe();
        assert_eq!(session.loading_state(), LoadingState::idle());

        session.submit_query("Hello there").await.unwrap();
        let events = drain(&mut rx);
        assert!(matches!(
            events.first(),
            Some(AssistantEvent::LoadingStateChanged(s)) if s.loading
        ));
        assert!(!session.loading_state().loading);

        // Models stay loaded for the next turn
        session.submit_query("Hello again").await.unwrap();
        let events = drain(&mut rx);
        assert!(
            events
                .iter()
                .all(|e| matches!(e, AssistantEvent::StreamingResponse { .. }))
        );
    }

    #[tokio::test]
    async fn transcript_tracks_turns() {
        let mut session = session_with(
            Arc::new(KeywordEmbedder::default()),
            Some(Arc::new(ScriptedStream::new(&["I'm Ada."]))),
        );
        session.submit_query("  Who are you?  ").await.unwrap();

        let entries = session.transcript();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sender, Sender::User);
        assert_eq!(entries[0].text, "Who are you?");
        assert_eq!(entries[1].sender, Sender::Bot);
        assert_eq!(entries[1].text, "I'm Ada.");
        assert!(!entries[1].streaming);
        assert_eq!(entries[1].sections.as_ref().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn conversation_window_is_bounded() {
        let mut session = session_with(Arc::new(KeywordEmbedder::default()), None);
        for i in 0..6 {
            session.submit_query(&format!("Where are you based? #{i}")).await.unwrap();
        }
        let conversation = session.conversation();
        assert_eq!(conversation.len(), 8);
        assert_eq!(
            conversation.turns().next().unwrap().content,
            "Where are you based? #2"
        );
        assert_eq!(session.transcript().len(), 12);
    }

    #[tokio::test]
    async fn reset_clears_history_but_keeps_cache() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let mut session = session_with(embedder.clone(), None);
        session.submit_query("Where are you based?").await.unwrap();
        let calls = embedder.call_count();

        session.reset();
        assert!(session.conversation().is_empty());
        assert!(session.transcript().is_empty());

        session.submit_query("Where are you based?").await.unwrap();
        assert_eq!(embedder.call_count(), calls);
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_abort_turn() {
        let mut session = session_with(
            Arc::new(KeywordEmbedder::default()),
            Some(Arc::new(ScriptedStream::new(&["Still here."]))),
        );
        drop(session.subscribe());
        let outcome = session.submit_query("Anyone there?").await.unwrap();
        assert_eq!(outcome.text, "Still here.");
        assert_eq!(session.conversation().len(), 2);
    }

    #[test]
    fn apology_names_owner() {
        let text = apology(&sample_profile());
        assert!(text.contains("Ada Lovelace's background"));
    }

    #[test]
    fn from_config_builds_without_network() {
        let config = AppConfig::default();
        let session = AssistantSession::from_config(&config, sample_profile()).unwrap();
        assert!(session.has_generator());
        assert_eq!(session.loading_state(), LoadingState::idle());

        let mut template_only = AppConfig::default();
        template_only.generation.strategy = GenerationStrategy::Template;
        let session = AssistantSession::from_config(&template_only, sample_profile()).unwrap();
        assert!(!session.has_generator());
    }
}
