//! Adding books to the user's read list.

use crate::chains::extraction_miss;
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EnrichedInput, InsertOutcome, Provider, ReadStatus,
    SessionContext,
};
use pagewise_providers::Extractor;
use pagewise_store::best_match;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const EXTRACT_INSTRUCTIONS: &str = "The user read (or is reading) a book and wants it on \
     their read list. Identify the book title, how far they got (finished, in_progress, or \
     abandoned), and their 1-5 rating if they gave one.";

const FORMAT_HINT: &str = r#"{"title": "<book title>", "status": "finished"|"in_progress"|"abandoned", "rating": 1-5 or null}"#;

const UNCLEAR_REPLY: &str = "I couldn't tell which book you'd like to add to your read list. \
     Tell me the title and how far you got, for example \"I finished Dune, 5 stars\".";

#[derive(Debug, Deserialize)]
struct ReadListRequest {
    title: String,
    status: ReadStatus,
    #[serde(default)]
    rating: Option<u8>,
}

/// Handles the `add_to_read_list` intent.
pub struct AddToReadListChain {
    extractor: Extractor,
    store: Arc<dyn BookStore>,
    fuzzy_threshold: f32,
}

impl AddToReadListChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        store: Arc<dyn BookStore>,
        fuzzy_threshold: f32,
    ) -> Self {
        Self {
            extractor: Extractor::new(provider, model),
            store,
            fuzzy_threshold,
        }
    }
}

#[async_trait]
impl Chain for AddToReadListChain {
    fn name(&self) -> &str {
        "add_to_read_list"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        let request: ReadListRequest = match self
            .extractor
            .extract(EXTRACT_INSTRUCTIONS, FORMAT_HINT, &input.text)
            .await
        {
            Ok(request) => request,
            Err(e) if extraction_miss(&e) => return Ok(UNCLEAR_REPLY.to_string()),
            Err(e) => return Err(e.into()),
        };

        let titles = self.store.list_book_titles().await?;
        let Some((resolved, _)) = best_match(
            &request.title,
            titles.iter().map(String::as_str),
            self.fuzzy_threshold,
        ) else {
            return Ok(format!(
                "I couldn't find \"{}\" in the catalog, so I can't add it to your read list.",
                request.title
            ));
        };
        let resolved = resolved.to_string();

        let Some(book) = self.store.book_by_title(&resolved).await? else {
            return Ok(format!(
                "I couldn't find \"{}\" in the catalog, so I can't add it to your read list.",
                request.title
            ));
        };

        let rating = request.rating.map(|r| r.clamp(1, 5));
        let outcome = self
            .store
            .insert_read_list(&session.username, book.id, request.status, rating)
            .await?;
        info!(
            user = %session.username,
            book = %book.title,
            status = request.status.label(),
            outcome = ?outcome,
            "read list updated"
        );

        match outcome {
            InsertOutcome::Inserted => {
                let status_phrase = match request.status {
                    ReadStatus::Finished => "finished",
                    ReadStatus::InProgress => "in progress",
                    ReadStatus::Abandoned => "abandoned",
                };
                let rating_phrase = rating
                    .map(|r| format!(" with a rating of {r}/5"))
                    .unwrap_or_default();
                Ok(format!(
                    "Added \"{}\" to your read list as {status_phrase}{rating_phrase}.",
                    book.title
                ))
            }
            InsertOutcome::AlreadyPresent => Ok(format!(
                "\"{}\" is already on your read list, so I left it as it was.",
                book.title
            )),
        }
    }
}
