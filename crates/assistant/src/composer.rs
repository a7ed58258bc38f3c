//! Response composer — retrieval, then generation with fallbacks.
//!
//! Strategy order for one turn:
//!
//! 1. Retrieve: embed the query and every document, rank, take the top k.
//!    If embedding fails the turn is answered by [`fallback_search`].
//! 2. Generate with the LLM (if configured), streaming partial text.
//! 3. If generation fails or yields nothing usable, compose from templates.

use crate::conversation::ConversationState;
use crate::documents::{ProfileDocument, build_documents};
use crate::embedder::{CachedEmbedder, LazyModel};
use crate::fallback::fallback_search;
use crate::ranker::{ScoredDocument, rank};
use crate::templates::TemplateComposer;
use folio_config::GenerationConfig;
use folio_core::error::GenerationError;
use folio_core::message::Message;
use folio_core::profile::Profile;
use folio_core::provider::{ProviderRequest, SamplingParams};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which strategy produced the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Llm,
    Template,
    FallbackSearch,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Template => "template",
            Self::FallbackSearch => "fallback_search",
        }
    }
}

/// The composer's answer for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedResponse {
    pub text: String,
    /// Top-ranked documents the answer was grounded on (empty for fallback search)
    pub sections: Vec<ProfileDocument>,
    pub strategy: Strategy,
}

/// Settings for the streamed LLM strategy.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub sampling: SamplingParams,
    /// Longest wait for the next stream chunk
    pub idle_timeout: Duration,
    /// Conversation messages included in the prompt
    pub history_messages: usize,
}

impl GenerationSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            sampling: SamplingParams {
                temperature: config.temperature,
                top_p: Some(config.top_p),
                max_tokens: Some(config.max_tokens),
                frequency_penalty: Some(config.frequency_penalty),
                presence_penalty: Some(config.presence_penalty),
            },
            idle_timeout: Duration::from_secs(config.timeout_secs),
            history_messages: config.history_messages,
        }
    }
}

/// Streams a grounded answer from a generative model.
pub struct Generator {
    model: LazyModel,
    settings: GenerationSettings,
}

impl Generator {
    pub fn new(model: LazyModel, settings: GenerationSettings) -> Self {
        Self { model, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Build the request messages: persona, recent history, grounded prompt.
    pub fn build_messages(
        &self,
        profile: &Profile,
        context: &str,
        query: &str,
        history: &ConversationState,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.settings.history_messages + 2);
        messages.push(Message::system(system_prompt(profile)));
        messages.extend(history.to_messages(self.settings.history_messages));
        messages.push(Message::user(format!(
            "Context about me:\n{context}\n\nQuestion: {query}\n\nAnswer in the first person using only the context above."
        )));
        messages
    }

    /// Stream a completion, calling `on_partial` with the accumulated text
    /// after every non-empty delta. Returns the cleaned final text.
    pub async fn generate(
        &self,
        messages: Vec<Message>,
        on_partial: &mut (dyn FnMut(&str) + Send),
    ) -> Result<String, GenerationError> {
        let provider = self.model.get().await?;
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages,
            sampling: self.settings.sampling.clone(),
            stream: true,
            stop: vec![],
        };

        let mut rx = provider.stream(request).await?;
        let mut accumulated = String::new();

        loop {
            let next = tokio::time::timeout(self.settings.idle_timeout, rx.recv())
                .await
                .map_err(|_| {
                    GenerationError::ModelUnavailable(format!(
                        "no output for {}s",
                        self.settings.idle_timeout.as_secs()
                    ))
                })?;

            let chunk = match next {
                Some(chunk) => chunk?,
                None => break,
            };
            if let Some(delta) = chunk.content.filter(|c| !c.is_empty()) {
                accumulated.push_str(&delta);
                on_partial(&accumulated);
            }
            if chunk.done {
                break;
            }
        }

        let cleaned = clean_to_sentence(&accumulated);
        if cleaned.is_empty() {
            return Err(GenerationError::EmptyGeneration);
        }
        Ok(cleaned)
    }
}

fn system_prompt(profile: &Profile) -> String {
    let b = &profile.basics;
    format!(
        "You are {name}, a {title} based in {location}, answering visitors' questions on your portfolio website. \
         Speak in the first person as {name}. Keep answers concise and conversational, two to four sentences. \
         Only use facts from the context you are given. \
         If the context does not contain the answer, say that you're not sure instead of guessing.",
        name = b.name,
        title = b.title,
        location = b.location,
    )
}

/// Cut generated text after its last sentence terminator and trim it.
///
/// Text without any `.`, `!` or `?` yields an empty string.
pub fn clean_to_sentence(text: &str) -> String {
    match text.rfind(['.', '!', '?']) {
        Some(end) => text[..=end].trim().to_string(),
        None => String::new(),
    }
}

/// Ties retrieval and the generation strategies together.
pub struct Composer {
    embedder: Option<CachedEmbedder>,
    generator: Option<Generator>,
    templates: TemplateComposer,
    top_k: usize,
}

impl Composer {
    pub fn new(
        embedder: Option<CachedEmbedder>,
        generator: Option<Generator>,
        templates: TemplateComposer,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            generator,
            templates,
            top_k: top_k.max(1),
        }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Rank every profile document against `query`.
    pub async fn retrieve(
        &self,
        profile: &Profile,
        query: &str,
    ) -> Result<Vec<ScoredDocument>, GenerationError> {
        let embedder = self.embedder.as_ref().ok_or_else(|| {
            GenerationError::ModelUnavailable("no embedding model configured".into())
        })?;

        let documents = build_documents(profile);
        let texts: Vec<String> = documents.iter().map(ProfileDocument::embedding_text).collect();

        let query_vector = embedder.embed(query).await?;
        let document_vectors = embedder.embed_many(&texts).await?;
        Ok(rank(&query_vector, documents, &document_vectors))
    }

    /// Produce the answer for one turn. Never fails: every error is absorbed
    /// by the next strategy in line.
    pub async fn generate(
        &self,
        profile: &Profile,
        query: &str,
        history: &ConversationState,
        on_partial: &mut (dyn FnMut(&str) + Send),
    ) -> ComposedResponse {
        let scored = match self.retrieve(profile, query).await {
            Ok(scored) => scored,
            Err(e) => {
                warn!(error = %e, "Retrieval failed, using keyword search");
                return ComposedResponse {
                    text: fallback_search(query, profile),
                    sections: Vec::new(),
                    strategy: Strategy::FallbackSearch,
                };
            }
        };

        let top: Vec<ProfileDocument> = scored
            .iter()
            .take(self.top_k)
            .map(|s| s.document.clone())
            .collect();
        debug!(
            top = ?top.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            "Retrieved context"
        );

        if let Some(generator) = &self.generator {
            let context = top
                .iter()
                .map(|d| d.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let messages = generator.build_messages(profile, &context, query, history);
            match generator.generate(messages, on_partial).await {
                Ok(text) => {
                    info!(chars = text.len(), "Answered with LLM");
                    return ComposedResponse {
                        text,
                        sections: top,
                        strategy: Strategy::Llm,
                    };
                }
                Err(e) => warn!(error = %e, "Generation failed, using templates"),
            }
        }

        ComposedResponse {
            text: self.templates.compose(query, &scored, profile),
            sections: top,
            strategy: Strategy::Template,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::LoadingTracker;
    use crate::event::EventBus;
    use crate::templates::NoPhrases;
    use crate::test_helpers::*;
    use folio_core::message::Role;
    use folio_core::provider::Provider;
    use folio_providers::loader::ReadyLoader;
    use std::sync::Arc;

    fn lazy(provider: Arc<dyn Provider>) -> LazyModel {
        LazyModel::new(
            Arc::new(ReadyLoader::new(provider, "test")),
            Arc::new(LoadingTracker::new(EventBus::default())),
        )
    }

    fn composer(embedder: Arc<dyn Provider>, generator: Option<Arc<dyn Provider>>) -> Composer {
        Composer::new(
            Some(CachedEmbedder::new(lazy(embedder), "keyword-1")),
            generator.map(|g| Generator::new(lazy(g), test_settings())),
            TemplateComposer::new(0.1, true, Arc::new(NoPhrases)),
            3,
        )
    }

    async fn run(composer: &Composer, query: &str) -> (ComposedResponse, Vec<String>) {
        let mut partials = Vec::new();
        let mut on_partial = |text: &str| partials.push(text.to_string());
        let response = composer
            .generate(&sample_profile(), query, &ConversationState::default(), &mut on_partial)
            .await;
        (response, partials)
    }

    #[test]
    fn cleaning_truncates_to_last_sentence() {
        assert_eq!(clean_to_sentence("  Hello world. And then"), "Hello world.");
        assert_eq!(clean_to_sentence("Really? Yes!"), "Really? Yes!");
        assert_eq!(clean_to_sentence("no terminator"), "");
        assert_eq!(clean_to_sentence(""), "");
    }

    #[tokio::test]
    async fn streams_llm_answer() {
        let llm = Arc::new(ScriptedStream::new(&["Hello", " world.", " Trailing"]));
        let composer = composer(Arc::new(KeywordEmbedder::default()), Some(llm));
        let (response, partials) = run(&composer, "Tell me something").await;

        assert_eq!(response.strategy, Strategy::Llm);
        assert_eq!(response.text, "Hello world.");
        assert_eq!(partials, vec!["Hello", "Hello world.", "Hello world. Trailing"]);
        assert_eq!(response.sections.len(), 3);
    }

    #[tokio::test]
    async fn prompt_carries_context_history_and_sampling() {
        let llm = Arc::new(ScriptedStream::new(&["Sure."]));
        let composer = composer(Arc::new(KeywordEmbedder::default()), Some(llm.clone()));

        let mut history = ConversationState::default();
        for i in 0..4 {
            history.push_exchange(format!("q{i}"), format!("a{i}."), None);
        }
        let mut sink = |_: &str| {};
        composer
            .generate(&sample_profile(), "How can I contact you?", &history, &mut sink)
            .await;

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.stream);
        assert_eq!(request.sampling.max_tokens, Some(256));

        // system + 6 history + prompt
        assert_eq!(request.messages.len(), 8);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Ada Lovelace"));
        assert_eq!(request.messages[1].content, "q1");
        let prompt = &request.messages[7].content;
        assert!(prompt.starts_with("Context about me:\n"));
        assert!(prompt.contains("ada@example.com"));
        assert!(prompt.contains("Question: How can I contact you?"));
    }

    #[tokio::test]
    async fn embedding_failure_uses_fallback_search() {
        let llm = Arc::new(ScriptedStream::new(&["Never used."]));
        let composer = composer(Arc::new(FailingProvider), Some(llm.clone()));
        let (response, partials) = run(&composer, "What skills do you know?").await;

        assert_eq!(response.strategy, Strategy::FallbackSearch);
        assert_eq!(
            response.text,
            fallback_search("What skills do you know?", &sample_profile())
        );
        assert!(response.sections.is_empty());
        assert!(partials.is_empty());
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_uses_templates() {
        let composer = composer(
            Arc::new(KeywordEmbedder::default()),
            Some(Arc::new(FailingProvider)),
        );
        let (response, _) = run(&composer, "What are your skills?").await;
        assert_eq!(response.strategy, Strategy::Template);
        assert!(response.text.contains("JavaScript"));
        assert!(response.text.contains("Python"));
    }

    #[tokio::test]
    async fn empty_generation_uses_templates() {
        let llm = Arc::new(ScriptedStream::new(&["no sentence end"]));
        let composer = composer(Arc::new(KeywordEmbedder::default()), Some(llm));
        let (response, partials) = run(&composer, "How can I contact you?").await;
        assert_eq!(response.strategy, Strategy::Template);
        assert!(response.text.contains("ada@example.com"));
        assert_eq!(partials.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_stream_times_out_into_templates() {
        let composer = composer(
            Arc::new(KeywordEmbedder::default()),
            Some(Arc::new(HangingStream)),
        );
        let (response, _) = run(&composer, "Where are you based?").await;
        assert_eq!(response.strategy, Strategy::Template);
        assert_eq!(response.text, "I'm based in London, UK.");
    }

    #[tokio::test]
    async fn template_only_without_generator() {
        let composer = composer(Arc::new(KeywordEmbedder::default()), None);
        assert!(!composer.has_generator());
        let (response, _) = run(&composer, "How can I contact you?").await;
        assert_eq!(response.strategy, Strategy::Template);
        assert!(response.text.contains("ada@example.com"));
    }

    #[tokio::test]
    async fn retrieval_ranks_relevant_document_first() {
        let composer = composer(Arc::new(KeywordEmbedder::default()), None);
        let scored = composer
            .retrieve(&sample_profile(), "How can I contact you?")
            .await
            .unwrap();
        assert_eq!(scored[0].document.id, "contact");
        assert_eq!(scored.len(), build_documents(&sample_profile()).len());
    }

    #[test]
    fn settings_from_config_defaults() {
        let settings = GenerationSettings::from_config(&GenerationConfig::default());
        assert_eq!(settings.idle_timeout, Duration::from_secs(60));
        assert_eq!(settings.history_messages, 6);
        assert_eq!(settings.sampling.top_p, Some(0.1));
    }
}
