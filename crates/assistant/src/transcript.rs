//! The ordered message list a chat UI renders.
//!
//! Unlike [`ConversationState`](crate::conversation::ConversationState) it is
//! never trimmed, and it shows the in-flight reply while it streams.

use crate::documents::ProfileDocument;
use crate::event::AssistantEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<ProfileDocument>>,
    pub streaming: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            sender: Sender::User,
            text: text.into(),
            sections: None,
            streaming: false,
        });
    }

    /// Add the empty placeholder that streaming events fill in.
    pub fn begin_reply(&mut self) {
        self.entries.push(TranscriptEntry {
            sender: Sender::Bot,
            text: String::new(),
            sections: None,
            streaming: true,
        });
    }

    /// Fold a streaming event into the last bot entry. Other events, or a
    /// transcript that does not end with a bot entry, are left unchanged.
    pub fn apply(&mut self, event: &AssistantEvent) {
        let AssistantEvent::StreamingResponse {
            content,
            done,
            sections,
        } = event
        else {
            return;
        };
        if let Some(last) = self.entries.last_mut().filter(|e| e.sender == Sender::Bot) {
            last.text.clone_from(content);
            last.sections.clone_from(sections);
            last.streaming = !done;
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_streaming(&self) -> bool {
        self.entries.last().is_some_and(|e| e.streaming)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LoadingState;

    fn partial(content: &str, done: bool) -> AssistantEvent {
        AssistantEvent::StreamingResponse {
            content: content.into(),
            done,
            sections: None,
        }
    }

    #[test]
    fn streaming_updates_placeholder() {
        let mut transcript = Transcript::new();
        transcript.push_user("Hi");
        transcript.begin_reply();
        assert!(transcript.is_streaming());

        transcript.apply(&partial("Hel", false));
        assert_eq!(transcript.entries()[1].text, "Hel");
        assert!(transcript.entries()[1].streaming);

        transcript.apply(&partial("Hello.", true));
        let last = &transcript.entries()[1];
        assert_eq!(last.text, "Hello.");
        assert!(!last.streaming);
        assert!(!transcript.is_streaming());
        assert_eq!(transcript.entries()[0].text, "Hi");
    }

    #[test]
    fn ignores_events_without_bot_entry() {
        let mut transcript = Transcript::new();
        transcript.push_user("Hi");
        transcript.apply(&partial("stray", true));
        transcript.apply(&AssistantEvent::LoadingStateChanged(LoadingState::idle()));
        assert_eq!(transcript.entries().len(), 1);
        assert_eq!(transcript.entries()[0].text, "Hi");
    }

    #[test]
    fn serializes_for_ui() {
        let mut transcript = Transcript::new();
        transcript.push_user("Hi");
        let json = serde_json::to_value(transcript.entries()).unwrap();
        assert_eq!(json[0]["sender"], "user");
        assert_eq!(json[0]["streaming"], false);
    }
}
