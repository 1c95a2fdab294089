//! Retrieval-backed answers about the service: features, the company, and
//! bookstore recommendations.
//!
//! The built-in documents are embedded lazily on first use and cached for
//! the life of the chain, so an embedding outage degrades one turn instead
//! of startup. Bookstore questions pull the user's district from the store
//! and fold it into the retrieval query.

use crate::chains::{embed_one, Composer};
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EmbeddingRequest, EnrichedInput, Provider, ProviderError,
    SessionContext,
};
use pagewise_store::VectorIndex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

const TOP_K: usize = 3;
const MIN_SCORE: f32 = 0.2;

const NO_ANSWER_REPLY: &str = "I don't have information about that, I'm afraid. I can tell \
     you what I can do, about the people behind Pagewise, or point you to bookstores near \
     you.";

const COMPOSE_INSTRUCTIONS: &str = "You are Pagewise, a friendly book-recommendation \
     assistant. Answer the user's question using only the reference notes provided before \
     it. If the notes don't cover the question, say you don't know.";

/// The knowledge base shipped with the assistant.
const DOCUMENTS: &[&str] = &[
    "Pagewise can suggest books and authors based on your favorite genres, favorite \
     authors, and the books you have rated highly. Ask things like \"what should I read \
     next?\" or \"suggest books like Dune\".",
    "Pagewise keeps a read list for you: tell it about books you finished, are reading, or \
     abandoned, along with a 1-5 rating, and it uses them to sharpen its suggestions.",
    "You can save favorite genres and favorite authors in Pagewise, browse the catalog by \
     genre or author, and ask for books matching a plot, trope, or vibe you describe.",
    "Pagewise builds reading plans: ask for a monthly plan (about five books) or an annual \
     plan (about forty books) and it paces them assuming roughly twenty pages a day.",
    "Your Pagewise profile stores your username, email, password, and the district you \
     live in. You can change any of these by asking in chat.",
    "Pagewise was founded in Lisbon by a small team of readers who wanted recommendations \
     that come from your own shelf rather than bestseller lists. The service is free to \
     use.",
    "For support, write to hello@pagewise.app. Feedback about wrong or odd suggestions is \
     especially welcome while the catalog grows.",
    "In Lisboa, good bookstores include Livraria Bertrand in Chiado (the world's oldest \
     operating bookstore), Ler Devagar in LX Factory, and Livraria da Travessa in \
     Príncipe Real.",
    "In Porto, visit Livraria Lello near the Clérigos Tower, Livraria Latina on Rua de \
     Santa Catarina, or the secondhand shelves of Candelabro.",
    "Outside the big cities, most Portuguese districts have a local Bertrand or Note! \
     branch in their shopping centres, and municipal libraries often run book-swap \
     shelves.",
];

/// Handles `recommend_bookstores`, `ask_about_features`, and
/// `ask_about_company`.
pub struct KnowledgeChain {
    composer: Composer,
    provider: Arc<dyn Provider>,
    embedding_model: String,
    store: Arc<dyn BookStore>,
    index: OnceCell<VectorIndex>,
}

impl KnowledgeChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
        store: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            composer: Composer::new(Arc::clone(&provider), chat_model),
            provider,
            embedding_model: embedding_model.into(),
            store,
            index: OnceCell::new(),
        }
    }

    async fn build_index(&self) -> Result<VectorIndex, ProviderError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: DOCUMENTS.iter().map(|d| d.to_string()).collect(),
            })
            .await?;
        if response.embeddings.len() != DOCUMENTS.len() {
            return Err(ProviderError::MalformedOutput(
                "embedding response shorter than document set".to_string(),
            ));
        }

        let mut index = VectorIndex::new();
        for (i, (doc, embedding)) in DOCUMENTS.iter().zip(response.embeddings).enumerate() {
            index.insert(i as i64, embedding, *doc);
        }
        debug!(documents = index.len(), "knowledge index built");
        Ok(index)
    }

    async fn retrieve(&self, query_text: &str) -> Result<Vec<String>, ProviderError> {
        let index = self.index.get_or_try_init(|| self.build_index()).await?;
        let query = embed_one(&self.provider, &self.embedding_model, query_text).await?;
        Ok(index
            .search(&query, TOP_K, MIN_SCORE, &HashSet::new())
            .into_iter()
            .map(|h| h.payload)
            .collect())
    }
}

#[async_trait]
impl Chain for KnowledgeChain {
    fn name(&self) -> &str {
        "knowledge"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        // The district makes "bookstores near me" retrievable.
        let district = self
            .store
            .get_profile(&session.username)
            .await?
            .map(|p| p.district);
        let query_text = match &district {
            Some(district) if !district.is_empty() => {
                format!("{} (the user lives in the {district} district)", input.text)
            }
            _ => input.text.clone(),
        };

        let notes = self.retrieve(&query_text).await?;
        if notes.is_empty() {
            return Ok(NO_ANSWER_REPLY.to_string());
        }

        let mut user = String::from("Reference notes:\n");
        for note in &notes {
            user.push_str("- ");
            user.push_str(note);
            user.push('\n');
        }
        user.push_str("\nQuestion: ");
        user.push_str(&input.text);
        if let Some(district) = district {
            if !district.is_empty() {
                user.push_str(&format!("\n(The user lives in the {district} district.)"));
            }
        }

        Ok(self.composer.compose(COMPOSE_INSTRUCTIONS, &user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::testing::{DownProvider, ScriptedProvider};
    use pagewise_core::RawInput;
    use pagewise_store::InMemoryStore;

    fn session() -> SessionContext {
        SessionContext::new("alice", "c1")
    }

    fn input(text: &str) -> EnrichedInput {
        RawInput::new(text).enrich(Vec::new())
    }

    async fn store_with_alice() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.add_user("alice", "alice@example.com", "Lisboa").await;
        store
    }

    #[tokio::test]
    async fn answers_from_retrieved_notes() {
        // Every text embeds to the same vector, so all documents match and
        // the scripted completion is the final answer.
        let provider = Arc::new(
            ScriptedProvider::new(&["Pagewise is free and was founded in Lisbon."])
                .with_embedding(vec![1.0, 0.0]),
        );
        let chain = KnowledgeChain::new(provider, "chat", "embed", store_with_alice().await);
        let reply = chain
            .reply(&input("is this free?"), &session())
            .await
            .unwrap();
        assert!(reply.contains("free"));
    }

    #[tokio::test]
    async fn unknown_user_still_answers() {
        let provider = Arc::new(
            ScriptedProvider::new(&["You can ask me for book suggestions."])
                .with_embedding(vec![0.5, 0.5]),
        );
        let chain = KnowledgeChain::new(
            provider,
            "chat",
            "embed",
            Arc::new(InMemoryStore::new()),
        );
        let reply = chain
            .reply(&input("what can you do?"), &session())
            .await
            .unwrap();
        assert!(reply.contains("suggestions"));
    }

    #[tokio::test]
    async fn embedding_outage_is_a_chain_error() {
        let chain = KnowledgeChain::new(
            Arc::new(DownProvider),
            "chat",
            "embed",
            store_with_alice().await,
        );
        let result = chain.reply(&input("who made you?"), &session()).await;
        assert!(matches!(result, Err(ChainError::Provider(_))));
    }

    #[tokio::test]
    async fn index_is_built_once() {
        let provider = Arc::new(
            ScriptedProvider::new(&["Answer one.", "Answer two."])
                .with_embedding(vec![1.0, 0.0]),
        );
        let chain = KnowledgeChain::new(
            Arc::clone(&provider) as Arc<dyn Provider>,
            "chat",
            "embed",
            store_with_alice().await,
        );
        let first = chain.reply(&input("features?"), &session()).await.unwrap();
        let second = chain.reply(&input("company?"), &session()).await.unwrap();
        assert_eq!(first, "Answer one.");
        assert_eq!(second, "Answer two.");
    }
}
