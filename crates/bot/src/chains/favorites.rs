//! Recording favorite authors and genres.
//!
//! The extracted name is fuzzy-matched against the catalog before insert,
//! so "bradon sanderson" still lands on the right author. The final reply
//! is phrased by the model from the insert outcome; if composition fails
//! after the write already happened, a plain acknowledgment is used
//! instead.

use crate::chains::{extraction_miss, Composer};
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EnrichedInput, FavoriteKind, InsertOutcome, Provider,
    SessionContext,
};
use pagewise_providers::Extractor;
use pagewise_store::best_match;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

const EXTRACT_INSTRUCTIONS: &str = "The user wants to record a favorite author or a favorite \
     genre. Identify which kind it is and the name they mentioned.";

const FORMAT_HINT: &str = r#"{"kind": "author"|"genre", "name": "<name>"}"#;

const UNCLEAR_REPLY: &str = "I couldn't tell what you'd like to add to your favorites. Tell \
     me an author or a genre, for example \"add fantasy to my favorite genres\".";

const COMPOSE_INSTRUCTIONS: &str = "You are a friendly book-recommendation assistant. Write \
     one or two short sentences acknowledging the outcome described by the user message. Do \
     not invent details.";

#[derive(Debug, Deserialize)]
struct FavoriteRequest {
    kind: FavoriteKind,
    name: String,
}

/// Handles the `add_favorite` intent.
pub struct AddFavoriteChain {
    extractor: Extractor,
    composer: Composer,
    store: Arc<dyn BookStore>,
    fuzzy_threshold: f32,
}

impl AddFavoriteChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        store: Arc<dyn BookStore>,
        fuzzy_threshold: f32,
    ) -> Self {
        let model = model.into();
        Self {
            extractor: Extractor::new(Arc::clone(&provider), model.clone()),
            composer: Composer::new(provider, model),
            store,
            fuzzy_threshold,
        }
    }

    async fn resolve_name(
        &self,
        kind: FavoriteKind,
        name: &str,
    ) -> Result<Option<String>, ChainError> {
        let candidates: Vec<String> = match kind {
            FavoriteKind::Author => self.store.list_author_names().await?,
            FavoriteKind::Genre => self
                .store
                .list_genres()
                .await?
                .into_iter()
                .map(|g| g.name)
                .collect(),
        };
        Ok(
            best_match(name, candidates.iter().map(String::as_str), self.fuzzy_threshold)
                .map(|(matched, _)| matched.to_string()),
        )
    }

    async fn acknowledge(&self, outcome_summary: &str, fallback: &str) -> String {
        match self.composer.compose(COMPOSE_INSTRUCTIONS, outcome_summary).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => fallback.to_string(),
            Err(e) => {
                warn!(error = %e, "favorite acknowledgment composition failed");
                fallback.to_string()
            }
        }
    }
}

#[async_trait]
impl Chain for AddFavoriteChain {
    fn name(&self) -> &str {
        "add_favorite"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        let request: FavoriteRequest = match self
            .extractor
            .extract(EXTRACT_INSTRUCTIONS, FORMAT_HINT, &input.text)
            .await
        {
            Ok(request) => request,
            Err(e) if extraction_miss(&e) => return Ok(UNCLEAR_REPLY.to_string()),
            Err(e) => return Err(e.into()),
        };

        let kind_word = match request.kind {
            FavoriteKind::Author => "author",
            FavoriteKind::Genre => "genre",
        };

        let Some(resolved) = self.resolve_name(request.kind, &request.name).await? else {
            return Ok(format!(
                "I couldn't find a {kind_word} called \"{}\" in the catalog.",
                request.name
            ));
        };

        let outcome = self
            .store
            .insert_favorite(&session.username, request.kind, &resolved)
            .await?;
        info!(
            user = %session.username,
            kind = kind_word,
            name = %resolved,
            outcome = ?outcome,
            "favorite recorded"
        );

        match outcome {
            InsertOutcome::Inserted => {
                let summary = format!(
                    "The {kind_word} \"{resolved}\" was just added to the user's favorites."
                );
                let fallback = format!("Added {resolved} to your favorite {kind_word}s!");
                Ok(self.acknowledge(&summary, &fallback).await)
            }
            InsertOutcome::AlreadyPresent => {
                let summary = format!(
                    "The {kind_word} \"{resolved}\" was already on the user's favorites; \
                     nothing changed."
                );
                let fallback = format!("{resolved} is already one of your favorite {kind_word}s.");
                Ok(self.acknowledge(&summary, &fallback).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::testing::ScriptedProvider;
    use pagewise_core::RawInput;
    use pagewise_store::InMemoryStore;

    fn session() -> SessionContext {
        SessionContext::new("alice", "c1")
    }

    fn input(text: &str) -> EnrichedInput {
        RawInput::new(text).enrich(Vec::new())
    }

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.add_user("alice", "alice@example.com", "Lisboa").await;
        store.add_genre("Fantasy").await;
        store.add_author("Brandon Sanderson").await;
        store
    }

    #[tokio::test]
    async fn fuzzy_resolves_misspelled_genre() {
        let store = seeded_store().await;
        let chain = AddFavoriteChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"kind": "genre", "name": "fantasi"}"#,
                "Fantasy is now one of your favorite genres!",
            ])),
            "m",
            store.clone(),
            0.7,
        );
        let reply = chain
            .reply(&input("I love fantasi books"), &session())
            .await
            .unwrap();
        assert!(reply.contains("Fantasy"));
        let genres = store.favorite_genres("alice").await.unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].name, "Fantasy");
    }

    #[tokio::test]
    async fn unknown_name_gets_not_found_reply() {
        let store = seeded_store().await;
        let chain = AddFavoriteChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"kind": "author", "name": "Zyx Qwerty"}"#,
            ])),
            "m",
            store.clone(),
            0.8,
        );
        let reply = chain
            .reply(&input("Zyx Qwerty is my favorite"), &session())
            .await
            .unwrap();
        assert!(reply.contains("couldn't find"));
        assert!(store.favorite_authors("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_favorite_reports_no_change() {
        let store = seeded_store().await;
        store
            .insert_favorite("alice", FavoriteKind::Genre, "Fantasy")
            .await
            .unwrap();
        let chain = AddFavoriteChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"kind": "genre", "name": "Fantasy"}"#,
                "You already had Fantasy in your favorites.",
            ])),
            "m",
            store.clone(),
            0.8,
        );
        let reply = chain
            .reply(&input("add fantasy again"), &session())
            .await
            .unwrap();
        assert!(reply.to_lowercase().contains("already"));
        assert_eq!(store.favorite_genres("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn composition_failure_falls_back_to_plain_ack() {
        let store = seeded_store().await;
        // The script has the extraction reply only; the compose call fails.
        let chain = AddFavoriteChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"kind": "genre", "name": "Fantasy"}"#,
            ])),
            "m",
            store.clone(),
            0.8,
        );
        let reply = chain.reply(&input("add fantasy"), &session()).await.unwrap();
        assert!(reply.contains("Fantasy"));
        assert_eq!(store.favorite_genres("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn garbage_extraction_asks_for_clarification() {
        let chain = AddFavoriteChain::new(
            Arc::new(ScriptedProvider::new(&["not json"])),
            "m",
            seeded_store().await,
            0.8,
        );
        let reply = chain.reply(&input("favorites?"), &session()).await.unwrap();
        assert_eq!(reply, UNCLEAR_REPLY);
    }
}
