//! Shared test helpers: a sample profile and scripted providers.

use crate::composer::GenerationSettings;
use crate::session::{AssistantSession, SessionBuilder};
use crate::templates::NoPhrases;
use async_trait::async_trait;
use folio_core::error::ProviderError;
use folio_core::message::Message;
use folio_core::profile::Profile;
use folio_core::provider::*;
use folio_providers::loader::{ModelLoader, ProgressFn, ReadyLoader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SAMPLE_PROFILE: &str = r#"{
    "basics": {
        "name": "Ada Lovelace",
        "title": "Software Engineer",
        "location": "London, UK",
        "bio": "I build reliable systems and enjoy turning complex problems into simple tools.",
        "email": "ada@example.com",
        "github": "https://github.com/ada",
        "linkedin": "https://linkedin.com/in/ada",
        "avatar": ""
    },
    "skills": [
        {"category": "Languages", "items": ["JavaScript", "Python", "Rust"]},
        {"category": "Cloud", "items": ["AWS", "Docker"]}
    ],
    "projects": [
        {
            "title": "Engine Notes",
            "description": "Annotated programs for the Analytical Engine.",
            "technologies": ["Python"],
            "github": "https://github.com/ada/engine-notes",
            "image": ""
        },
        {
            "title": "Loom Scheduler",
            "description": "A job scheduler inspired by the Jacquard loom.",
            "technologies": ["Rust", "Docker"],
            "github": "https://github.com/ada/loom",
            "demo": "https://loom.example.com",
            "image": ""
        }
    ],
    "experience": [
        {
            "company": "Babbage Labs",
            "position": "Lead Engineer",
            "duration": "2020 - Present",
            "description": "I lead a team building calculation engines and mentor junior engineers."
        },
        {
            "company": "Analytical Co",
            "position": "Software Engineer",
            "duration": "2016 - 2020",
            "description": "Built data pipelines in Python."
        }
    ],
    "education": [
        {"degree": "BSc Mathematics", "institution": "University of London", "duration": "2012 - 2016"}
    ],
    "certifications": ["AWS Solutions Architect"],
    "honors": ["Royal Society Fellow"],
    "languages": [
        {"name": "English", "level": "Native"},
        {"name": "French", "level": "Professional"}
    ]
}"#;

pub fn sample_profile() -> Profile {
    Profile::from_json(SAMPLE_PROFILE).unwrap()
}

const VOCABULARY: &[&str] = &[
    "skill",
    "contact",
    "email",
    "project",
    "experience",
    "work",
    "education",
    "degree",
    "language",
    "speak",
    "name",
    "engineer",
    "javascript",
    "python",
    "rust",
];

/// Bag-of-keywords vector plus a constant bias dimension, so no vector is zero.
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut v: Vec<f32> = VOCABULARY
        .iter()
        .map(|word| lower.matches(word).count() as f32)
        .collect();
    v.push(1.0);
    v
}

/// An embedding provider backed by [`keyword_vector`]. Counts requests.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl KeywordEmbedder {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword-embedder"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("embedding only".into()))
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs
            .lock()
            .unwrap()
            .extend(request.inputs.iter().cloned());
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| keyword_vector(t)).collect(),
            model: request.model,
            usage: None,
        })
    }
}

/// Fails every call.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }

    async fn stream(&self, _request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }

    async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// Streams a fixed list of deltas, then a final chunk. Records requests.
pub struct ScriptedStream {
    chunks: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedStream {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedStream {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(ProviderResponse {
            message: Message::assistant(self.chunks.concat()),
            usage: None,
            model: request.model,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let chunks = self.chunks.clone();
        tokio::spawn(async move {
            for chunk in chunks {
                let _ = tx
                    .send(Ok(StreamChunk {
                        content: Some(chunk),
                        done: false,
                        usage: None,
                    }))
                    .await;
            }
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                    usage: None,
                }))
                .await;
        });
        Ok(rx)
    }
}

/// Opens a stream and never sends anything.
pub struct HangingStream;

#[async_trait]
impl Provider for HangingStream {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Timeout("never answers".into()))
    }

    async fn stream(&self, _request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            drop(tx);
        });
        Ok(rx)
    }
}

/// Counts loads; fails the first `fail_first` attempts.
pub struct CountingLoader {
    provider: Arc<dyn Provider>,
    loads: AtomicUsize,
    fail_first: usize,
    delay: Duration,
}

impl CountingLoader {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            loads: AtomicUsize::new(0),
            fail_first: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for CountingLoader {
    fn label(&self) -> &str {
        "counting"
    }

    async fn load(&self, progress: &ProgressFn) -> Result<Arc<dyn Provider>, ProviderError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        progress(0.5, "Downloading");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if attempt < self.fail_first {
            return Err(ProviderError::Network("download failed".into()));
        }
        progress(1.0, "Model ready");
        Ok(Arc::clone(&self.provider))
    }
}

pub fn test_settings() -> GenerationSettings {
    GenerationSettings {
        model: "scripted-1".into(),
        sampling: SamplingParams {
            temperature: 0.2,
            top_p: Some(0.1),
            max_tokens: Some(256),
            frequency_penalty: Some(0.5),
            presence_penalty: Some(0.3),
        },
        idle_timeout: Duration::from_secs(60),
        history_messages: 6,
    }
}

/// A session over the sample profile with deterministic phrasing.
pub fn session_with(
    embedder: Arc<dyn Provider>,
    generator: Option<Arc<dyn Provider>>,
) -> AssistantSession {
    let mut builder = SessionBuilder::new(sample_profile())
        .embedding(
            Arc::new(ReadyLoader::new(embedder, "keyword")),
            "keyword-1",
        )
        .phrase_picker(Arc::new(NoPhrases));
    if let Some(generator) = generator {
        builder = builder.generation(
            Arc::new(ReadyLoader::new(generator, "scripted")),
            test_settings(),
        );
    }
    builder.build()
}
