//! The bounded conversation history used for prompt assembly.

use crate::documents::ProfileDocument;
use folio_core::message::{Message, Role};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default capacity: four user/assistant exchanges.
pub const DEFAULT_MAX_TURNS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<ProfileDocument>>,
}

/// Ordered turns, oldest evicted first once `capacity` is exceeded.
///
/// Only complete exchanges are appended, so the history always alternates
/// user/assistant and starts with a user turn.
#[derive(Debug, Clone)]
pub struct ConversationState {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationState {
    /// `capacity` is rounded up to an even number of at least 2.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_multiple_of(2);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push_exchange(
        &mut self,
        user: impl Into<String>,
        assistant: impl Into<String>,
        sections: Option<Vec<ProfileDocument>>,
    ) {
        self.turns.push_back(ConversationTurn {
            role: Role::User,
            content: user.into(),
            sections: None,
        });
        self.turns.push_back(ConversationTurn {
            role: Role::Assistant,
            content: assistant.into(),
            sections,
        });
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().skip(self.turns.len().saturating_sub(n))
    }

    /// The last `n` turns as provider messages.
    pub fn to_messages(&self, n: usize) -> Vec<Message> {
        self.recent(n)
            .map(|turn| match turn.role {
                Role::User => Message::user(&turn.content),
                Role::Assistant => Message::assistant(&turn.content),
                Role::System => Message::system(&turn.content),
            })
            .collect()
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}
