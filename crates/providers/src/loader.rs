//! Model loaders — acquire a ready-to-use provider and report progress.
//!
//! Acquisition is the slow part of bringing a model online: reaching the
//! endpoint and confirming the requested model is served there. Loaders report
//! progress as a fraction in `[0, 1]` plus a short status line so callers can
//! surface it as a loading indicator.

use async_trait::async_trait;
use folio_core::error::ProviderError;
use folio_core::provider::Provider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress callback: `(fraction, status)`.
pub type ProgressFn = dyn Fn(f32, &str) + Send + Sync;

/// Something that can bring a provider online for one model.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Label used in logs and status messages (usually the model name).
    fn label(&self) -> &str;

    /// Acquire the provider. May be called again after a failure.
    async fn load(&self, progress: &ProgressFn) -> Result<Arc<dyn Provider>, ProviderError>;
}

/// Loads a remote provider by probing its health and model list.
pub struct ProbingLoader {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProbingLoader {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ModelLoader for ProbingLoader {
    fn label(&self) -> &str {
        &self.model
    }

    async fn load(&self, progress: &ProgressFn) -> Result<Arc<dyn Provider>, ProviderError> {
        let name = self.provider.name().to_string();

        progress(0.1, &format!("Connecting to {name}"));
        if !self.provider.health_check().await? {
            return Err(ProviderError::Network(format!(
                "Provider '{name}' failed its health check"
            )));
        }

        progress(0.5, &format!("Checking model {}", self.model));
        match self.provider.list_models().await {
            Ok(models) if models.is_empty() => {
                debug!(provider = %name, "Provider does not list models, skipping check");
            }
            Ok(models) => {
                let served = models
                    .iter()
                    .any(|m| m == &self.model || m.starts_with(&format!("{}:", self.model)));
                if !served {
                    return Err(ProviderError::ModelNotFound(format!(
                        "'{}' is not served by '{name}'",
                        self.model
                    )));
                }
            }
            Err(e) => {
                warn!(provider = %name, error = %e, "Model listing failed, continuing");
            }
        }

        progress(1.0, "Model ready");
        info!(provider = %name, model = %self.model, "Model loaded");
        Ok(Arc::clone(&self.provider))
    }
}

/// A loader for a provider that needs no acquisition step.
pub struct ReadyLoader {
    provider: Arc<dyn Provider>,
    label: String,
}

impl ReadyLoader {
    pub fn new(provider: Arc<dyn Provider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

#[async_trait]
impl ModelLoader for ReadyLoader {
    fn label(&self) -> &str {
        &self.label
    }

    async fn load(&self, progress: &ProgressFn) -> Result<Arc<dyn Provider>, ProviderError> {
        progress(1.0, "Model ready");
        Ok(Arc::clone(&self.provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::message::Message;
    use folio_core::provider::{ProviderRequest, ProviderResponse};
    use std::sync::Mutex;

    struct StubProvider {
        healthy: bool,
        models: Result<Vec<String>, ProviderError>,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant("ok."),
                usage: None,
                model: request.model,
            })
        }

        async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
            self.models.clone()
        }

        async fn health_check(&self) -> Result<bool, ProviderError> {
            Ok(self.healthy)
        }
    }

    fn stub(healthy: bool, models: Result<Vec<String>, ProviderError>) -> Arc<dyn Provider> {
        Arc::new(StubProvider { healthy, models })
    }

    fn recorder() -> (Arc<Mutex<Vec<(f32, String)>>>, Box<ProgressFn>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: Box<ProgressFn> = Box::new(move |fraction, status| {
            sink.lock().unwrap().push((fraction, status.to_string()));
        });
        (seen, progress)
    }

    #[tokio::test]
    async fn probing_reports_monotonic_progress() {
        let loader = ProbingLoader::new(stub(true, Ok(vec!["gpt-4o-mini".into()])), "gpt-4o-mini");
        let (seen, progress) = recorder();
        let provider = loader.load(progress.as_ref()).await.unwrap();
        assert_eq!(provider.name(), "stub");

        let seen = seen.lock().unwrap();
        let fractions: Vec<f32> = seen.iter().map(|(f, _)| *f).collect();
        assert_eq!(fractions, vec![0.1, 0.5, 1.0]);
        assert_eq!(seen[2].1, "Model ready");
    }

    #[tokio::test]
    async fn probing_accepts_tagged_model_names() {
        let loader = ProbingLoader::new(stub(true, Ok(vec!["llama3.2:latest".into()])), "llama3.2");
        let (_, progress) = recorder();
        assert!(loader.load(progress.as_ref()).await.is_ok());
    }

    #[tokio::test]
    async fn probing_rejects_unserved_model() {
        let loader = ProbingLoader::new(stub(true, Ok(vec!["other".into()])), "gpt-4o-mini");
        let (_, progress) = recorder();
        let err = loader.load(progress.as_ref()).await.err().unwrap();
        assert!(matches!(err, ProviderError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn probing_fails_when_unhealthy() {
        let loader = ProbingLoader::new(stub(false, Ok(vec![])), "m");
        let (seen, progress) = recorder();
        let err = loader.load(progress.as_ref()).await.err().unwrap();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_errors_are_not_fatal() {
        let loader = ProbingLoader::new(
            stub(true, Err(ProviderError::Network("boom".into()))),
            "m",
        );
        let (_, progress) = recorder();
        assert!(loader.load(progress.as_ref()).await.is_ok());
    }

    #[tokio::test]
    async fn ready_loader_completes_immediately() {
        let loader = ReadyLoader::new(stub(true, Ok(vec![])), "scripted");
        assert_eq!(loader.label(), "scripted");
        let (seen, progress) = recorder();
        loader.load(progress.as_ref()).await.unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[(1.0, "Model ready".to_string())]);
    }
}
