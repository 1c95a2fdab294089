//! Conversation turn and session domain types.
//!
//! These are the core value objects that flow through the entire system:
//! the user sends a message → the safety gate screens it → the classifier
//! labels it → the dispatcher routes it → a chain replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The assistant
    Assistant,
}

/// A single turn in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Identifies one conversation owned by one user.
///
/// Transcripts, turn locks, and memory files are all keyed by this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub username: String,
    pub conversation_id: String,
}

impl SessionKey {
    pub fn new(username: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.username, self.conversation_id)
    }
}

/// Immutable per-session identity, fixed at login and passed by reference
/// into every chain call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub username: String,
    pub conversation_id: String,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            conversation_id: conversation_id.into(),
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.username.clone(), self.conversation_id.clone())
    }
}

/// A raw user message, before history enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInput {
    pub text: String,
}

impl RawInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Attach conversation history, producing the value chains consume.
    /// Enrichment builds a new value; the raw input is never mutated.
    pub fn enrich(self, history: Vec<Turn>) -> EnrichedInput {
        EnrichedInput {
            text: self.text,
            history,
        }
    }
}

/// A user message together with the conversation history at the time it
/// arrived. Every chain receives this by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedInput {
    pub text: String,
    pub history: Vec<Turn>,
}

impl EnrichedInput {
    /// Render the history as a plain transcript block for inclusion in
    /// prompts. Empty history renders as an empty string.
    pub fn history_block(&self) -> String {
        let mut out = String::new();
        for turn in &self.history {
            let who = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            out.push_str(who);
            out.push_str(": ");
            out.push_str(&turn.content);
            out.push('\n');
        }
        out
    }
}

/// The safety gate's judgment of one raw input. Computed fresh every turn,
/// never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    Flagged { reason: String },
}

impl SafetyVerdict {
    pub fn is_flagged(&self) -> bool {
        matches!(self, SafetyVerdict::Flagged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Recommend me a book");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Recommend me a book");
    }

    #[test]
    fn session_key_display() {
        let key = SessionKey::new("alice", "conv-42");
        assert_eq!(key.to_string(), "alice/conv-42");
    }

    #[test]
    fn enrichment_carries_history() {
        let raw = RawInput::new("and by the same author?");
        let enriched = raw.enrich(vec![
            Turn::user("Suggest a fantasy book"),
            Turn::assistant("Try The Name of the Wind."),
        ]);
        assert_eq!(enriched.text, "and by the same author?");
        assert_eq!(enriched.history.len(), 2);
        let block = enriched.history_block();
        assert!(block.contains("User: Suggest a fantasy book"));
        assert!(block.contains("Assistant: Try The Name of the Wind."));
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = Turn::assistant("Here are three picks.");
        let json = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Assistant);
        assert_eq!(back.content, "Here are three picks.");
    }
}
