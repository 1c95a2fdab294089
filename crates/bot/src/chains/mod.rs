//! Capability chains, one per intent.
//!
//! Every chain follows the same split: a structured **extraction** stage
//! (typed JSON out of the model, testable with a canned provider) and an
//! **apply** stage (store queries, vector search, reply composition).
//! Expected misses (a name that doesn't resolve, an empty favorites list)
//! become friendly reply strings; `ChainError` is reserved for collaborator
//! failures the dispatcher turns into the generic error reply.

pub mod browse;
pub mod chitchat;
pub mod favorites;
pub mod knowledge;
pub mod profile;
pub mod read_list;
pub mod reading_plan;
pub mod suggest_authors;
pub mod suggest_books;
pub mod tropes;

pub use browse::BrowseChain;
pub use chitchat::ChitchatChain;
pub use favorites::AddFavoriteChain;
pub use knowledge::KnowledgeChain;
pub use profile::UpdateProfileChain;
pub use read_list::AddToReadListChain;
pub use reading_plan::ReadingPlanChain;
pub use suggest_authors::SuggestAuthorsChain;
pub use suggest_books::SuggestBooksChain;
pub use tropes::TropeSuggestChain;

use pagewise_core::{
    EmbeddingRequest, GenerationRequest, PromptMessage, Provider, ProviderError,
};
use std::sync::Arc;

/// Free-text reply composition over the provider, shared by chains that
/// phrase their answer with the model.
#[derive(Clone)]
pub(crate) struct Composer {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Composer {
    pub(crate) fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub(crate) async fn compose(
        &self,
        system: &str,
        user: &str,
    ) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(
            &self.model,
            vec![PromptMessage::system(system), PromptMessage::user(user)],
        );
        let response = self.provider.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}

/// Embed a single text, for chains that query the vector index.
pub(crate) async fn embed_one(
    provider: &Arc<dyn Provider>,
    model: &str,
    text: &str,
) -> Result<Vec<f32>, ProviderError> {
    let response = provider
        .embed(EmbeddingRequest {
            model: model.to_string(),
            inputs: vec![text.to_string()],
        })
        .await?;
    response.embeddings.into_iter().next().ok_or_else(|| {
        ProviderError::MalformedOutput("embedding response was empty".to_string())
    })
}

/// True when an extraction failure means "the model couldn't produce the
/// shape", which chains treat as a miss rather than an error.
pub(crate) fn extraction_miss(e: &ProviderError) -> bool {
    matches!(e, ProviderError::MalformedOutput(_))
}

/// Render a titles list as plain bullets, the no-model fallback reply.
pub(crate) fn bullet_list(intro: &str, items: &[String]) -> String {
    let mut out = String::from(intro);
    for item in items {
        out.push_str("\n- ");
        out.push_str(item);
    }
    out
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared mock providers for chain tests.

    use async_trait::async_trait;
    use pagewise_core::{
        EmbeddingRequest, EmbeddingResponse, GenerationRequest, GenerationResponse, Provider,
        ProviderError,
    };
    use std::sync::Mutex;

    /// Replies with a fixed sequence of canned completions, in order.
    pub struct ScriptedProvider {
        replies: Mutex<Vec<String>>,
        pub embedding: Vec<f32>,
    }

    impl ScriptedProvider {
        pub fn new(replies: &[&str]) -> Self {
            // Stored reversed so pop() yields them in call order.
            let mut replies: Vec<String> = replies.iter().map(|r| r.to_string()).collect();
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                embedding: vec![1.0, 0.0, 0.0],
            }
        }

        pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
            self.embedding = embedding;
            self
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            let mut replies = self.replies.lock().unwrap();
            let content = replies
                .pop()
                .ok_or_else(|| ProviderError::Network("script exhausted".into()))?;
            Ok(GenerationResponse {
                content,
                usage: None,
                model: "scripted".into(),
            })
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: vec![self.embedding.clone(); request.inputs.len()],
                model: request.model,
                usage: None,
            })
        }
    }

    /// Fails every call.
    pub struct DownProvider;

    #[async_trait]
    impl Provider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }

        async fn embed(
            &self,
            _request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }
}
