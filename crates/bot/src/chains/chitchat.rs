//! Small talk. The one chain that is nothing but the model and the
//! conversation history.

use crate::chains::Composer;
use async_trait::async_trait;
use pagewise_core::{Chain, ChainError, EnrichedInput, Provider, SessionContext};
use std::sync::Arc;

const PERSONA: &str = "You are Pagewise, a friendly book-recommendation assistant. Reply to \
     the user's small talk warmly and briefly, and when it fits, nudge the conversation \
     toward books. Never invent facts about the user.";

/// Handles the `chitchat` intent.
pub struct ChitchatChain {
    composer: Composer,
}

impl ChitchatChain {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            composer: Composer::new(provider, model),
        }
    }
}

#[async_trait]
impl Chain for ChitchatChain {
    fn name(&self) -> &str {
        "chitchat"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        _session: &SessionContext,
    ) -> Result<String, ChainError> {
        let history = input.history_block();
        let user = if history.is_empty() {
            input.text.clone()
        } else {
            format!("Conversation so far:\n{history}\nLatest message: {}", input.text)
        };
        Ok(self.composer.compose(PERSONA, &user).await?)
    }
}
