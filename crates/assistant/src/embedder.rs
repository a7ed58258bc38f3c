//! Lazy model acquisition and the memoizing embedder.
//!
//! Models are brought online on first use. A [`LazyModel`] runs its loader at
//! most once at a time: concurrent callers await the same in-flight load, and
//! a failed load leaves the model unloaded so the next turn can try again.

use crate::event::{AssistantEvent, EventBus, LoadingState};
use folio_core::error::GenerationError;
use folio_core::provider::{EmbeddingRequest, Provider};
use folio_providers::loader::ModelLoader;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, watch};
use tracing::{debug, info, warn};

/// Holds the current [`LoadingState`] and announces every change.
pub struct LoadingTracker {
    state: watch::Sender<LoadingState>,
    events: EventBus,
}

impl LoadingTracker {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: watch::Sender::new(LoadingState::idle()),
            events,
        }
    }

    pub fn current(&self) -> LoadingState {
        self.state.borrow().clone()
    }

    pub fn set(&self, state: LoadingState) {
        self.state.send_replace(state.clone());
        self.events
            .publish(AssistantEvent::LoadingStateChanged(state));
    }
}

/// A provider that is acquired on first use.
pub struct LazyModel {
    loader: Arc<dyn ModelLoader>,
    cell: OnceCell<Arc<dyn Provider>>,
    tracker: Arc<LoadingTracker>,
}

impl LazyModel {
    pub fn new(loader: Arc<dyn ModelLoader>, tracker: Arc<LoadingTracker>) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
            tracker,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the provider, loading it first if needed.
    pub async fn get(&self) -> Result<Arc<dyn Provider>, GenerationError> {
        let provider = self
            .cell
            .get_or_try_init(|| async {
                let label = self.loader.label().to_string();
                info!(model = %label, "Loading model");
                self.tracker
                    .set(LoadingState::in_progress(0.0, format!("Loading {label}")));

                let tracker = Arc::clone(&self.tracker);
                let progress = move |fraction: f32, status: &str| {
                    tracker.set(LoadingState::in_progress(fraction, status));
                };

                match self.loader.load(&progress).await {
                    Ok(provider) => {
                        self.tracker.set(LoadingState::finished("Model ready"));
                        Ok(provider)
                    }
                    Err(e) => {
                        warn!(model = %label, error = %e, "Model failed to load");
                        self.tracker
                            .set(LoadingState::failed(format!("Failed to load {label}")));
                        Err(GenerationError::from(e))
                    }
                }
            })
            .await?;
        Ok(Arc::clone(provider))
    }
}

/// Turns text into embedding vectors, memoized by exact text.
pub struct CachedEmbedder {
    model: LazyModel,
    model_name: String,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl CachedEmbedder {
    pub fn new(model: LazyModel, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Number of distinct texts embedded so far.
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| GenerationError::ModelUnavailable("empty embedding batch".into()))
    }

    /// Embed `texts`, sending only uncached ones to the provider in one batch.
    ///
    /// The result is in input order.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GenerationError> {
        let mut missing = Vec::new();
        {
            let cache = self.cache.lock().await;
            let mut seen = HashSet::new();
            for text in texts {
                if !cache.contains_key(text) && seen.insert(text.as_str()) {
                    missing.push(text.clone());
                }
            }
        }

        if !missing.is_empty() {
            let provider = self.model.get().await?;
            debug!(
                model = %self.model_name,
                requested = texts.len(),
                uncached = missing.len(),
                "Embedding batch"
            );
            let response = provider
                .embed(EmbeddingRequest {
                    model: self.model_name.clone(),
                    inputs: missing.clone(),
                })
                .await?;

            if response.embeddings.len() != missing.len() {
                return Err(GenerationError::ModelUnavailable(format!(
                    "expected {} embeddings, got {}",
                    missing.len(),
                    response.embeddings.len()
                )));
            }

            let mut cache = self.cache.lock().await;
            for (text, vector) in missing.into_iter().zip(response.embeddings) {
                cache.insert(text, vector);
            }
        }

        let cache = self.cache.lock().await;
        texts
            .iter()
            .map(|t| {
                cache.get(t).cloned().ok_or_else(|| {
                    GenerationError::ModelUnavailable(format!("no embedding for {t:?}"))
                })
            })
            .collect()
    }
}
