//! The bot session: one logged-in user in one conversation.
//!
//! Owns the turn ordering contract: lock, screen, enrich, classify,
//! dispatch, record. The session never writes memory for a flagged turn,
//! and a classifier outage degrades to the dispatcher's escalation path
//! instead of failing the turn.

use crate::dispatch::Dispatcher;
use crate::safety::{SafetyGate, REJECTION_REPLY};
use pagewise_core::{
    IntentClassifier, RawInput, Result, SessionContext, SessionKey, Turn,
};
use pagewise_memory::MemoryManager;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a session needs, built once at startup and shared.
pub struct BotDeps {
    pub dispatcher: Arc<Dispatcher>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub gate: Arc<SafetyGate>,
    pub memory: Arc<MemoryManager>,
    /// Most recent turns carried into prompts. Older turns stay on disk.
    pub history_cap: usize,
}

/// One user's conversation with the assistant.
pub struct BotSession {
    deps: Arc<BotDeps>,
    context: SessionContext,
    key: SessionKey,
}

impl BotSession {
    /// Bind a session to a user and conversation. The identity is fixed
    /// for the session's lifetime.
    pub fn login(
        deps: Arc<BotDeps>,
        username: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        let context = SessionContext::new(username, conversation_id);
        let key = context.key();
        info!(session = %key, "session started");
        Self { deps, context, key }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Run one full turn and return the assistant's reply.
    pub async fn process_user_input(&self, text: &str) -> Result<String> {
        // One turn at a time per conversation; other sessions are unaffected.
        let lock = self.deps.memory.turn_lock(&self.key).await;
        let _guard = lock.lock().await;

        let verdict = self.deps.gate.screen(text).await;
        if verdict.is_flagged() {
            info!(session = %self.key, "turn rejected by safety gate");
            return Ok(REJECTION_REPLY.to_string());
        }

        let mut history = self.deps.memory.history(&self.key).await?;
        if history.len() > self.deps.history_cap {
            history = history.split_off(history.len() - self.deps.history_cap);
        }
        let enriched = RawInput::new(text).enrich(history);

        let intent = match self.deps.classifier.classify(text).await {
            Ok(candidates) => candidates.first().map(|c| c.intent),
            Err(e) => {
                warn!(session = %self.key, error = %e, "classification failed, escalating");
                None
            }
        };

        let reply = self
            .deps
            .dispatcher
            .dispatch(intent, &enriched, &self.context)
            .await;

        self.deps.memory.append(&self.key, Turn::user(text)).await?;
        self.deps
            .memory
            .append(&self.key, Turn::assistant(reply.clone()))
            .await?;

        Ok(reply)
    }

    /// Persist the conversation transcript. Called explicitly; the CLI
    /// flushes on exit.
    pub async fn save_memory(&self) -> Result<()> {
        self.deps.memory.flush(&self.key).await?;
        Ok(())
    }
}
