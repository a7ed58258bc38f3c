//! Events: what a presentation layer observes during a session.
//!
//! Events are published on a broadcast bus owned by the session. A consumer
//! that falls behind loses the oldest events; one that drops its receiver is
//! simply detached.

use crate::documents::ProfileDocument;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Progress of lazily acquiring a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingState {
    pub loading: bool,
    /// Fraction in `[0, 1]`
    pub progress: f32,
    pub status: String,
}

impl LoadingState {
    /// Nothing loading, nothing loaded yet.
    pub fn idle() -> Self {
        Self {
            loading: false,
            progress: 0.0,
            status: String::new(),
        }
    }

    pub fn in_progress(progress: f32, status: impl Into<String>) -> Self {
        Self {
            loading: true,
            progress: progress.clamp(0.0, 1.0),
            status: status.into(),
        }
    }

    pub fn finished(status: impl Into<String>) -> Self {
        Self {
            loading: false,
            progress: 1.0,
            status: status.into(),
        }
    }

    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            loading: false,
            progress: 0.0,
            status: status.into(),
        }
    }
}

impl Default for LoadingState {
    fn default() -> Self {
        Self::idle()
    }
}

/// All events a session publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    /// Model acquisition started, progressed, finished or failed
    LoadingStateChanged(LoadingState),

    /// Partial (`done: false`) or final (`done: true`) assistant text.
    ///
    /// `content` is always the full text accumulated so far, not a delta.
    StreamingResponse {
        content: String,
        done: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sections: Option<Vec<ProfileDocument>>,
    },
}

impl AssistantEvent {
    /// Short name used as the SSE `event:` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadingStateChanged(_) => "loading_state_changed",
            Self::StreamingResponse { .. } => "streaming_response",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::StreamingResponse { done: true, .. })
    }
}

/// A broadcast-based bus for assistant events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AssistantEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: AssistantEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<AssistantEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
