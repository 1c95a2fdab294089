//! Trope and vibe matching: embed the user's free-text description and
//! query the book index directly. No extraction stage, the whole message
//! is the query.

use crate::chains::{bullet_list, embed_one, Composer};
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EnrichedInput, Provider, SessionContext,
};
use pagewise_store::VectorIndex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Hits scoring below this are noise, not matches.
const MIN_SCORE: f32 = 0.15;

const COMPOSE_INSTRUCTIONS: &str = "You are a friendly book-recommendation assistant. The \
     user described a plot, trope, or vibe, and the listed titles matched it. Present them \
     as suggestions in a warm, short reply. Mention only these titles; do not add others.";

const NO_MATCH_REPLY: &str = "I couldn't find anything in the catalog matching that vibe. \
     Try describing it differently, or name a genre you're in the mood for.";

/// Handles the `suggest_books_by_trope` intent.
pub struct TropeSuggestChain {
    composer: Composer,
    provider: Arc<dyn Provider>,
    embedding_model: String,
    store: Arc<dyn BookStore>,
    index: Arc<VectorIndex>,
    limit: usize,
}

impl TropeSuggestChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
        store: Arc<dyn BookStore>,
        index: Arc<VectorIndex>,
        limit: usize,
    ) -> Self {
        Self {
            composer: Composer::new(Arc::clone(&provider), chat_model),
            provider,
            embedding_model: embedding_model.into(),
            store,
            index,
            limit,
        }
    }
}

#[async_trait]
impl Chain for TropeSuggestChain {
    fn name(&self) -> &str {
        "suggest_books_by_trope"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        let query = embed_one(&self.provider, &self.embedding_model, &input.text).await?;

        // Books the user already read are never suggested back.
        let exclude: HashSet<i64> = self
            .store
            .read_list(&session.username)
            .await?
            .into_iter()
            .map(|e| e.book_id)
            .collect();

        let hits = self.index.search(&query, self.limit, MIN_SCORE, &exclude);
        if hits.is_empty() {
            return Ok(NO_MATCH_REPLY.to_string());
        }

        let titles: Vec<String> = hits.into_iter().map(|h| h.payload).collect();
        let listing = titles.join("\n");
        match self.composer.compose(COMPOSE_INSTRUCTIONS, &listing).await {
            Ok(text) if !text.is_empty() => Ok(text),
            Ok(_) => Ok(bullet_list("These match what you described:", &titles)),
            Err(e) => {
                warn!(error = %e, "trope suggestion composition failed, using plain list");
                Ok(bullet_list("These match what you described:", &titles))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::testing::{DownProvider, ScriptedProvider};
    use pagewise_core::{RawInput, ReadStatus};
    use pagewise_store::InMemoryStore;

    fn session() -> SessionContext {
        SessionContext::new("alice", "c1")
    }

    fn input(text: &str) -> EnrichedInput {
        RawInput::new(text).enrich(Vec::new())
    }

    async fn fixture() -> (Arc<InMemoryStore>, Arc<VectorIndex>, i64) {
        let store = Arc::new(InMemoryStore::new());
        store.add_user("alice", "alice@example.com", "Lisboa").await;
        let genre = store.add_genre("Science Fiction").await;
        let author = store.add_author("Andy Weir").await;
        let martian = store.add_book("The Martian", author, genre, 369, 4.5).await;
        let hail_mary = store
            .add_book("Project Hail Mary", author, genre, 476, 4.7)
            .await;

        let mut index = VectorIndex::new();
        index.insert(martian, vec![1.0, 0.0], "The Martian");
        index.insert(hail_mary, vec![0.9, 0.1], "Project Hail Mary");
        (store, Arc::new(index), martian)
    }

    #[tokio::test]
    async fn matches_are_listed() {
        let (store, index, _) = fixture().await;
        let provider = ScriptedProvider::new(&[]).with_embedding(vec![1.0, 0.0]);
        let chain = TropeSuggestChain::new(Arc::new(provider), "chat", "embed", store, index, 5);
        let reply = chain
            .reply(&input("stranded alone on another planet"), &session())
            .await
            .unwrap();
        assert!(reply.contains("The Martian"));
        assert!(reply.contains("Project Hail Mary"));
    }

    #[tokio::test]
    async fn read_books_are_excluded() {
        let (store, index, martian_id) = fixture().await;
        store
            .insert_read_list("alice", martian_id, ReadStatus::Finished, Some(5))
            .await
            .unwrap();
        let provider = ScriptedProvider::new(&[]).with_embedding(vec![1.0, 0.0]);
        let chain = TropeSuggestChain::new(Arc::new(provider), "chat", "embed", store, index, 5);
        let reply = chain
            .reply(&input("space survival"), &session())
            .await
            .unwrap();
        assert!(!reply.contains("The Martian"));
        assert!(reply.contains("Project Hail Mary"));
    }

    #[tokio::test]
    async fn orthogonal_query_finds_nothing() {
        let (store, index, _) = fixture().await;
        let provider = ScriptedProvider::new(&[]).with_embedding(vec![0.0, 1.0]);
        let chain = TropeSuggestChain::new(Arc::new(provider), "chat", "embed", store, index, 5);
        let reply = chain
            .reply(&input("regency romance"), &session())
            .await
            .unwrap();
        // The closest entry scores about 0.11 against this query, below the
        // 0.15 floor.
        assert_eq!(reply, NO_MATCH_REPLY);
    }

    #[tokio::test]
    async fn embedding_outage_is_a_chain_error() {
        let (store, index, _) = fixture().await;
        let chain = TropeSuggestChain::new(Arc::new(DownProvider), "chat", "embed", store, index, 5);
        let result = chain.reply(&input("anything"), &session()).await;
        assert!(matches!(result, Err(ChainError::Provider(_))));
    }
}
