//! Embedding-based primary intent classification.
//!
//! At startup every route example is embedded once; classifying a message
//! is then a single embedding call plus an exact cosine scan over the
//! example vectors. A message scores against a route as the best of that
//! route's examples, so one close paraphrase is enough to match.

use crate::routes::{route_table, Route};
use async_trait::async_trait;
use pagewise_core::{
    Classification, EmbeddingRequest, Intent, IntentCandidate, IntentClassifier, Provider,
    ProviderError,
};
use pagewise_store::cosine_similarity;
use std::sync::Arc;
use tracing::{debug, info};

struct RouteVectors {
    intent: Intent,
    vectors: Vec<Vec<f32>>,
}

/// Classifies utterances by cosine similarity to pre-embedded route examples.
pub struct EmbeddingClassifier {
    provider: Arc<dyn Provider>,
    model: String,
    threshold: f32,
    routes: Vec<RouteVectors>,
}

impl EmbeddingClassifier {
    /// Embed the whole route table and build the classifier.
    ///
    /// This is the one startup step that talks to the provider; if it fails
    /// the assistant cannot route anything and the caller should abort.
    pub async fn build(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        threshold: f32,
    ) -> Result<Self, ProviderError> {
        let model = model.into();
        let table = route_table();

        // One batched request for the entire table.
        let inputs: Vec<String> = table
            .iter()
            .flat_map(|r| r.examples.iter().map(|e| e.to_string()))
            .collect();
        let response = provider
            .embed(EmbeddingRequest {
                model: model.clone(),
                inputs,
            })
            .await?;

        let mut embeddings = response.embeddings.into_iter();
        let mut routes = Vec::with_capacity(table.len());
        for Route {
            intent, examples, ..
        } in table
        {
            let mut vectors = Vec::with_capacity(examples.len());
            for _ in examples {
                let vector = embeddings.next().ok_or_else(|| {
                    ProviderError::MalformedOutput(
                        "embedding response shorter than input batch".to_string(),
                    )
                })?;
                vectors.push(vector);
            }
            routes.push(RouteVectors { intent, vectors });
        }

        info!(
            routes = routes.len(),
            model = %model,
            "intent classifier ready"
        );
        Ok(Self {
            provider,
            model,
            threshold,
            routes,
        })
    }

    fn score_routes(&self, query: &[f32]) -> Classification {
        let mut candidates: Classification = self
            .routes
            .iter()
            .map(|route| {
                let score = route
                    .vectors
                    .iter()
                    .map(|v| cosine_similarity(query, v))
                    .fold(f32::MIN, f32::max);
                IntentCandidate {
                    intent: route.intent,
                    score,
                }
            })
            .filter(|c| c.score >= self.threshold)
            .collect();
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }
}

#[async_trait]
impl IntentClassifier for EmbeddingClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ProviderError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![text.to_string()],
            })
            .await?;
        let query = response.embeddings.into_iter().next().ok_or_else(|| {
            ProviderError::MalformedOutput("embedding response was empty".to_string())
        })?;

        let candidates = self.score_routes(&query);
        debug!(
            text = %text,
            best = candidates.first().map(|c| c.intent.label()).unwrap_or("none"),
            "classified utterance"
        );
        Ok(candidates)
    }
}
