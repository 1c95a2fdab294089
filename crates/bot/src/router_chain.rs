//! Generative fallback routing for messages the embedding classifier
//! couldn't place.
//!
//! Two tiers, each a structured-extraction prompt: a binary "is this small
//! talk" check, and a router that picks from the full intent label space
//! (or declines). Both are fallible and the dispatcher treats their
//! failures as "unresolved", so a flaky model degrades to the canned
//! fallback reply rather than an error.

use crate::dispatch::{ChitchatCheck, SecondaryRouter};
use crate::routes::route_table;
use async_trait::async_trait;
use pagewise_core::{EnrichedInput, Intent, Provider, ProviderError};
use pagewise_providers::Extractor;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

const CHITCHAT_INSTRUCTIONS: &str = "You are triaging messages for a book-recommendation \
     assistant. Decide whether the user's message is plain small talk (greetings, thanks, \
     jokes, talk unrelated to books or the service). Messages that ask for recommendations, \
     mention books, authors, genres, reading plans, or the user's account are NOT small talk.";

const ROUTER_INSTRUCTIONS: &str = "You are routing messages for a book-recommendation \
     assistant. Pick the single intent label that best matches the user's message, or null \
     if none fits. The labels and their meanings:";

#[derive(Debug, Deserialize)]
struct ChitchatReply {
    chitchat: bool,
}

#[derive(Debug, Deserialize)]
struct RouterReply {
    intent: Option<String>,
}

/// Both tiers screen follow-ups, so both see the same history rendering.
fn render_input(input: &EnrichedInput) -> String {
    let history = input.history_block();
    if history.is_empty() {
        input.text.clone()
    } else {
        format!("Conversation so far:\n{history}\nLatest message: {}", input.text)
    }
}

/// Binary small-talk check, the cheap second tier.
pub struct ChitchatClassifier {
    extractor: Extractor,
}

impl ChitchatClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            extractor: Extractor::new(provider, model),
        }
    }
}

#[async_trait]
impl ChitchatCheck for ChitchatClassifier {
    async fn is_chitchat(&self, input: &EnrichedInput) -> Result<bool, ProviderError> {
        let reply: ChitchatReply = self
            .extractor
            .extract(
                CHITCHAT_INSTRUCTIONS,
                r#"{"chitchat": true|false}"#,
                &render_input(input),
            )
            .await?;
        Ok(reply.chitchat)
    }
}

/// Full-label-space generative router, the last resolving tier.
pub struct IntentRouterChain {
    extractor: Extractor,
    instructions: String,
}

impl IntentRouterChain {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let mut instructions = String::from(ROUTER_INSTRUCTIONS);
        for route in route_table() {
            instructions.push_str("\n- ");
            instructions.push_str(route.intent.label());
            instructions.push_str(": ");
            instructions.push_str(route.description);
        }
        Self {
            extractor: Extractor::new(provider, model),
            instructions,
        }
    }
}

#[async_trait]
impl SecondaryRouter for IntentRouterChain {
    async fn resolve(&self, input: &EnrichedInput) -> Result<Option<Intent>, ProviderError> {
        let reply: RouterReply = self
            .extractor
            .extract(
                &self.instructions,
                r#"{"intent": "<label>" or null}"#,
                &render_input(input),
            )
            .await?;

        match reply.intent {
            None => Ok(None),
            Some(label) => match Intent::from_str(&label) {
                Ok(intent) => Ok(Some(intent)),
                Err(e) => {
                    // Hallucinated labels are unresolved, not errors.
                    warn!(label = %label, error = %e, "router produced unknown label");
                    Ok(None)
                }
            },
        }
    }
}
