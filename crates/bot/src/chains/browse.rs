//! Catalog browsing: genres, authors in a genre, books by genre or author.
//! The replies are factual listings, rendered directly from store rows.

use crate::chains::{bullet_list, extraction_miss};
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EnrichedInput, Provider, SessionContext,
};
use pagewise_providers::Extractor;
use pagewise_store::best_match;
use serde::Deserialize;
use std::sync::Arc;

const EXTRACT_INSTRUCTIONS: &str = "The user wants to browse the book catalog. Identify \
     what they want listed: all genres, the authors in a genre, the books in a genre, or \
     the books by an author. Include the genre or author name when one is needed.";

const FORMAT_HINT: &str = r#"{"query": "list_genres"|"authors_by_genre"|"books_by_genre"|"books_by_author", "value": "<name>"|null, "limit": <number>|null}"#;

const UNCLEAR_REPLY: &str = "I can list the catalog's genres, the authors in a genre, or \
     the books by a genre or author. What would you like to see?";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BrowseQuery {
    ListGenres,
    AuthorsByGenre,
    BooksByGenre,
    BooksByAuthor,
}

#[derive(Debug, Deserialize)]
struct BrowseRequest {
    query: BrowseQuery,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Handles the `browse_catalog` intent.
pub struct BrowseChain {
    extractor: Extractor,
    store: Arc<dyn BookStore>,
    default_limit: usize,
    fuzzy_threshold: f32,
}

impl BrowseChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        store: Arc<dyn BookStore>,
        default_limit: usize,
        fuzzy_threshold: f32,
    ) -> Self {
        Self {
            extractor: Extractor::new(provider, model),
            store,
            default_limit,
            fuzzy_threshold,
        }
    }

    async fn resolve_genre(&self, name: &str) -> Result<Option<String>, ChainError> {
        let genres = self.store.list_genres().await?;
        let names: Vec<String> = genres.into_iter().map(|g| g.name).collect();
        Ok(
            best_match(name, names.iter().map(String::as_str), self.fuzzy_threshold)
                .map(|(m, _)| m.to_string()),
        )
    }

    async fn resolve_author(&self, name: &str) -> Result<Option<String>, ChainError> {
        let names = self.store.list_author_names().await?;
        Ok(
            best_match(name, names.iter().map(String::as_str), self.fuzzy_threshold)
                .map(|(m, _)| m.to_string()),
        )
    }
}

#[async_trait]
impl Chain for BrowseChain {
    fn name(&self) -> &str {
        "browse_catalog"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        _session: &SessionContext,
    ) -> Result<String, ChainError> {
        let request: BrowseRequest = match self
            .extractor
            .extract(EXTRACT_INSTRUCTIONS, FORMAT_HINT, &input.text)
            .await
        {
            Ok(request) => request,
            Err(e) if extraction_miss(&e) => return Ok(UNCLEAR_REPLY.to_string()),
            Err(e) => return Err(e.into()),
        };

        let limit = request.limit.unwrap_or(self.default_limit).clamp(1, 50);

        match request.query {
            BrowseQuery::ListGenres => {
                let genres: Vec<String> = self
                    .store
                    .list_genres()
                    .await?
                    .into_iter()
                    .map(|g| g.name)
                    .collect();
                if genres.is_empty() {
                    Ok("The catalog has no genres yet.".to_string())
                } else {
                    Ok(bullet_list("Here are the genres in the catalog:", &genres))
                }
            }
            BrowseQuery::AuthorsByGenre => {
                let Some(value) = request.value else {
                    return Ok(UNCLEAR_REPLY.to_string());
                };
                let Some(genre) = self.resolve_genre(&value).await? else {
                    return Ok(format!("I don't have a genre called \"{value}\"."));
                };
                let authors: Vec<String> = self
                    .store
                    .authors_by_genre(&genre)
                    .await?
                    .into_iter()
                    .take(limit)
                    .map(|a| a.name)
                    .collect();
                if authors.is_empty() {
                    Ok(format!("I don't have any authors listed under {genre} yet."))
                } else {
                    Ok(bullet_list(&format!("Authors writing {genre}:"), &authors))
                }
            }
            BrowseQuery::BooksByGenre => {
                let Some(value) = request.value else {
                    return Ok(UNCLEAR_REPLY.to_string());
                };
                let Some(genre) = self.resolve_genre(&value).await? else {
                    return Ok(format!("I don't have a genre called \"{value}\"."));
                };
                let books: Vec<String> = self
                    .store
                    .books_by_genre(&genre, limit)
                    .await?
                    .into_iter()
                    .map(|b| b.title)
                    .collect();
                if books.is_empty() {
                    Ok(format!("I don't have any {genre} books yet."))
                } else {
                    Ok(bullet_list(&format!("{genre} books in the catalog:"), &books))
                }
            }
            BrowseQuery::BooksByAuthor => {
                let Some(value) = request.value else {
                    return Ok(UNCLEAR_REPLY.to_string());
                };
                let Some(author) = self.resolve_author(&value).await? else {
                    return Ok(format!("I don't know an author called \"{value}\"."));
                };
                let books: Vec<String> = self
                    .store
                    .books_by_author(&author, limit)
                    .await?
                    .into_iter()
                    .map(|b| b.title)
                    .collect();
                if books.is_empty() {
                    Ok(format!("I don't have any books by {author} yet."))
                } else {
                    Ok(bullet_list(&format!("Books by {author}:"), &books))
                }
            }
        }
    }
}
