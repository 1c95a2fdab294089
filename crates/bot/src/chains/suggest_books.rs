//! Book suggestions, from the user's favorites or from a named subject.
//!
//! The favorites path tries three bases in order: favorite genres, favorite
//! authors, then the user's own highly-rated reads (embedded, averaged into
//! a taste centroid, and matched against the book index). A user with no
//! favorites at all gets a guidance reply, never an empty list dressed up
//! as a suggestion.

use crate::chains::{bullet_list, embed_one, extraction_miss, Composer};
use async_trait::async_trait;
use pagewise_core::{
    Book, BookStore, Chain, ChainError, EmbeddingRequest, EnrichedInput, Provider,
    SessionContext,
};
use pagewise_providers::Extractor;
use pagewise_store::{best_match, centroid, VectorIndex};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const EXTRACT_INSTRUCTIONS: &str = "The user wants book suggestions. Decide whether they \
     want suggestions based on their saved favorites (\"basis\": \"favorites\") or based on \
     something they named in the message (\"basis\": \"input\"). For the favorites basis, \
     note which dimension they asked for if any (their liked books, favorite genres, or \
     favorite authors). For the input basis, note what they named: a genre, an author, or \
     a specific book.";

const FORMAT_HINT: &str = r#"{"basis": "favorites"|"input", "dimension": "books"|"genres"|"authors"|null, "subject_kind": "genre"|"author"|"book"|null, "subject": "<name>"|null}"#;

/// Shown when the favorites basis finds nothing to work from.
pub const NO_FAVORITES_REPLY: &str = "You don't have any favorites or rated reads yet, so I \
     have nothing to base suggestions on. Add a favorite genre or author, or tell me about \
     a book you enjoyed, and I'll take it from there.";

const COMPOSE_INSTRUCTIONS: &str = "You are a friendly book-recommendation assistant. \
     Present the listed book titles as suggestions in a warm, short reply. Mention only \
     these titles; do not add others.";

/// Catalog rating floor for favorites-based picks.
const MIN_CATALOG_RATING: f32 = 4.0;

/// The user's own rating floor for "books they loved".
const MIN_OWN_RATING: u8 = 4;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Basis {
    Favorites,
    Input,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FavoriteDimension {
    Books,
    Genres,
    Authors,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SubjectKind {
    Genre,
    Author,
    Book,
}

#[derive(Debug, Deserialize)]
struct SuggestQuery {
    basis: Basis,
    #[serde(default)]
    dimension: Option<FavoriteDimension>,
    #[serde(default)]
    subject_kind: Option<SubjectKind>,
    #[serde(default)]
    subject: Option<String>,
}

/// Handles the `suggest_books` intent. Also feeds the reading-plan chain
/// its candidate titles.
pub struct SuggestBooksChain {
    extractor: Extractor,
    composer: Composer,
    provider: Arc<dyn Provider>,
    embedding_model: String,
    store: Arc<dyn BookStore>,
    index: Arc<VectorIndex>,
    limit: usize,
    fuzzy_threshold: f32,
}

impl SuggestBooksChain {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn Provider>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
        store: Arc<dyn BookStore>,
        index: Arc<VectorIndex>,
        limit: usize,
        fuzzy_threshold: f32,
    ) -> Self {
        let chat_model = chat_model.into();
        Self {
            extractor: Extractor::new(Arc::clone(&provider), chat_model.clone()),
            composer: Composer::new(Arc::clone(&provider), chat_model),
            provider,
            embedding_model: embedding_model.into(),
            store,
            index,
            limit,
            fuzzy_threshold,
        }
    }

    async fn read_ids(&self, username: &str) -> Result<HashSet<i64>, ChainError> {
        Ok(self
            .store
            .read_list(username)
            .await?
            .into_iter()
            .map(|e| e.book_id)
            .collect())
    }

    /// Taste-centroid path: embed the user's highly-rated reads, average
    /// them, and look up the nearest unread books in the index.
    async fn titles_from_liked_books(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Option<Vec<String>>, ChainError> {
        let liked = self
            .store
            .highly_rated_titles(username, MIN_OWN_RATING)
            .await?;
        if liked.is_empty() {
            return Ok(None);
        }

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: liked,
            })
            .await?;
        let Some(query) = centroid(&response.embeddings) else {
            return Ok(None);
        };

        let exclude = self.read_ids(username).await?;
        let hits = self.index.nearest(&query, limit, &exclude);
        Ok(Some(hits.into_iter().map(|h| h.payload).collect()))
    }

    async fn titles_from_favorite_genres(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Option<Vec<String>>, ChainError> {
        let genres = self.store.favorite_genres(username).await?;
        if genres.is_empty() {
            return Ok(None);
        }
        let names: Vec<String> = genres.into_iter().map(|g| g.name).collect();
        let books = self
            .store
            .unread_books_in_genres(username, &names, MIN_CATALOG_RATING, limit)
            .await?;
        Ok(Some(books.into_iter().map(|b| b.title).collect()))
    }

    async fn titles_from_favorite_authors(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Option<Vec<String>>, ChainError> {
        let authors = self.store.favorite_authors(username).await?;
        if authors.is_empty() {
            return Ok(None);
        }
        let names: Vec<String> = authors.into_iter().map(|a| a.name).collect();
        let books = self
            .store
            .unread_books_by_authors(username, &names, MIN_CATALOG_RATING, limit)
            .await?;
        Ok(Some(books.into_iter().map(|b| b.title).collect()))
    }

    /// Candidate titles from whatever favorites the user has, trying
    /// genres, then authors, then their liked reads. `None` means the user
    /// has no favorites at all. Reused by the reading-plan chain.
    pub async fn favorites_titles(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Option<Vec<String>>, ChainError> {
        let mut any_basis = false;
        for titles in [
            self.titles_from_favorite_genres(username, limit).await?,
            self.titles_from_favorite_authors(username, limit).await?,
            self.titles_from_liked_books(username, limit).await?,
        ] {
            if let Some(titles) = titles {
                any_basis = true;
                if !titles.is_empty() {
                    return Ok(Some(titles));
                }
            }
        }
        // The user has favorites but everything qualifying is already read.
        if any_basis {
            Ok(Some(Vec::new()))
        } else {
            Ok(None)
        }
    }

    async fn favorites_reply(
        &self,
        dimension: Option<FavoriteDimension>,
        username: &str,
    ) -> Result<String, ChainError> {
        let titles = match dimension {
            Some(FavoriteDimension::Books) => {
                self.titles_from_liked_books(username, self.limit).await?
            }
            Some(FavoriteDimension::Genres) => {
                self.titles_from_favorite_genres(username, self.limit).await?
            }
            Some(FavoriteDimension::Authors) => {
                self.titles_from_favorite_authors(username, self.limit).await?
            }
            None => self.favorites_titles(username, self.limit).await?,
        };

        match titles {
            None => Ok(NO_FAVORITES_REPLY.to_string()),
            Some(titles) if titles.is_empty() => Ok(
                "It looks like you've already read everything I'd pick from your favorites. \
                 Try telling me a genre or a mood instead."
                    .to_string(),
            ),
            Some(titles) => Ok(self.present(&titles).await),
        }
    }

    async fn input_reply(
        &self,
        kind: Option<SubjectKind>,
        subject: Option<String>,
        username: &str,
    ) -> Result<String, ChainError> {
        let (Some(kind), Some(subject)) = (kind, subject) else {
            // Nothing concrete named; fall back to favorites.
            return self.favorites_reply(None, username).await;
        };

        let titles = match kind {
            SubjectKind::Genre => {
                let genres = self.store.list_genres().await?;
                let names: Vec<String> = genres.into_iter().map(|g| g.name).collect();
                let Some((resolved, _)) = best_match(
                    &subject,
                    names.iter().map(String::as_str),
                    self.fuzzy_threshold,
                ) else {
                    return Ok(format!("I don't have a genre called \"{subject}\"."));
                };
                self.store
                    .books_by_genre(resolved, self.limit)
                    .await?
                    .into_iter()
                    .map(|b: Book| b.title)
                    .collect::<Vec<_>>()
            }
            SubjectKind::Author => {
                let names = self.store.list_author_names().await?;
                let Some((resolved, _)) = best_match(
                    &subject,
                    names.iter().map(String::as_str),
                    self.fuzzy_threshold,
                ) else {
                    return Ok(format!("I don't know an author called \"{subject}\"."));
                };
                self.store
                    .books_by_author(resolved, self.limit)
                    .await?
                    .into_iter()
                    .map(|b| b.title)
                    .collect::<Vec<_>>()
            }
            SubjectKind::Book => {
                let catalog_titles = self.store.list_book_titles().await?;
                let Some((resolved, _)) = best_match(
                    &subject,
                    catalog_titles.iter().map(String::as_str),
                    self.fuzzy_threshold,
                ) else {
                    return Ok(format!("I couldn't find \"{subject}\" in the catalog."));
                };
                let resolved = resolved.to_string();
                let anchor = self.store.book_by_title(&resolved).await?;
                let query =
                    embed_one(&self.provider, &self.embedding_model, &resolved).await?;
                let exclude: HashSet<i64> =
                    anchor.map(|b| b.id).into_iter().collect();
                self.index
                    .nearest(&query, self.limit, &exclude)
                    .into_iter()
                    .map(|h| h.payload)
                    .collect::<Vec<_>>()
            }
        };

        if titles.is_empty() {
            Ok("I couldn't find any matching books in the catalog.".to_string())
        } else {
            Ok(self.present(&titles).await)
        }
    }

    async fn present(&self, titles: &[String]) -> String {
        let listing = titles.join("\n");
        match self.composer.compose(COMPOSE_INSTRUCTIONS, &listing).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => bullet_list("Here's what I'd suggest:", titles),
            Err(e) => {
                warn!(error = %e, "suggestion composition failed, using plain list");
                bullet_list("Here's what I'd suggest:", titles)
            }
        }
    }
}

#[async_trait]
impl Chain for SuggestBooksChain {
    fn name(&self) -> &str {
        "suggest_books"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        let query: SuggestQuery = match self
            .extractor
            .extract(EXTRACT_INSTRUCTIONS, FORMAT_HINT, &input.text)
            .await
        {
            Ok(query) => query,
            Err(e) if extraction_miss(&e) => {
                // A vague ask still deserves suggestions.
                debug!("suggestion extraction missed, defaulting to favorites basis");
                SuggestQuery {
                    basis: Basis::Favorites,
                    dimension: None,
                    subject_kind: None,
                    subject: None,
                }
            }
            Err(e) => return Err(e.into()),
        };

        match query.basis {
            Basis::Favorites => self.favorites_reply(query.dimension, &session.username).await,
            Basis::Input => {
                self.input_reply(query.subject_kind, query.subject, &session.username)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::testing::ScriptedProvider;
    use pagewise_core::{FavoriteKind, RawInput, ReadStatus};
    use pagewise_store::InMemoryStore;

    fn session() -> SessionContext {
        SessionContext::new("alice", "c1")
    }

    fn input(text: &str) -> EnrichedInput {
        RawInput::new(text).enrich(Vec::new())
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        index: Arc<VectorIndex>,
        hobbit_id: i64,
        dune_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        store.add_user("alice", "alice@example.com", "Lisboa").await;
        let fantasy = store.add_genre("Fantasy").await;
        let scifi = store.add_genre("Science Fiction").await;
        let tolkien = store.add_author("J.R.R. Tolkien").await;
        let herbert = store.add_author("Frank Herbert").await;
        let hobbit_id = store.add_book("The Hobbit", tolkien, fantasy, 310, 4.7).await;
        let silmarillion = store
            .add_book("The Silmarillion", tolkien, fantasy, 365, 4.2)
            .await;
        let dune_id = store.add_book("Dune", herbert, scifi, 412, 4.6).await;

        let mut index = VectorIndex::new();
        index.insert(hobbit_id, vec![1.0, 0.0, 0.0], "The Hobbit");
        index.insert(silmarillion, vec![0.9, 0.1, 0.0], "The Silmarillion");
        index.insert(dune_id, vec![0.0, 1.0, 0.0], "Dune");

        Fixture {
            store,
            index: Arc::new(index),
            hobbit_id,
            dune_id,
        }
    }

    fn chain(fx: &Fixture, provider: ScriptedProvider) -> SuggestBooksChain {
        SuggestBooksChain::new(
            Arc::new(provider),
            "chat",
            "embed",
            fx.store.clone(),
            fx.index.clone(),
            5,
            0.7,
        )
    }

    #[tokio::test]
    async fn no_favorites_yields_guidance() {
        let fx = fixture().await;
        let chain = chain(
            &fx,
            ScriptedProvider::new(&[r#"{"basis": "favorites", "dimension": null, "subject_kind": null, "subject": null}"#]),
        );
        let reply = chain
            .reply(&input("suggest me something"), &session())
            .await
            .unwrap();
        assert_eq!(reply, NO_FAVORITES_REPLY);
    }

    #[tokio::test]
    async fn favorite_genre_drives_suggestions() {
        let fx = fixture().await;
        fx.store
            .insert_favorite("alice", FavoriteKind::Genre, "Fantasy")
            .await
            .unwrap();
        let chain = chain(
            &fx,
            ScriptedProvider::new(&[
                r#"{"basis": "favorites", "dimension": "genres", "subject_kind": null, "subject": null}"#,
                "You might enjoy The Hobbit and The Silmarillion!",
            ]),
        );
        let reply = chain
            .reply(&input("books from my favorites please"), &session())
            .await
            .unwrap();
        assert!(reply.contains("Hobbit"));
    }

    #[tokio::test]
    async fn already_read_books_are_excluded() {
        let fx = fixture().await;
        fx.store
            .insert_favorite("alice", FavoriteKind::Genre, "Fantasy")
            .await
            .unwrap();
        fx.store
            .insert_read_list("alice", fx.hobbit_id, ReadStatus::Finished, Some(5))
            .await
            .unwrap();
        let chain = chain(
            &fx,
            // Composition call intentionally missing so the plain list is used.
            ScriptedProvider::new(&[
                r#"{"basis": "favorites", "dimension": "genres", "subject_kind": null, "subject": null}"#,
            ]),
        );
        let reply = chain.reply(&input("more fantasy"), &session()).await.unwrap();
        assert!(reply.contains("The Silmarillion"));
        assert!(!reply.contains("The Hobbit"));
    }

    #[tokio::test]
    async fn liked_books_centroid_path_excludes_read() {
        let fx = fixture().await;
        fx.store
            .insert_read_list("alice", fx.hobbit_id, ReadStatus::Finished, Some(5))
            .await
            .unwrap();
        // The embedding points at the fantasy corner of the toy space.
        let provider = ScriptedProvider::new(&[
            r#"{"basis": "favorites", "dimension": "books", "subject_kind": null, "subject": null}"#,
        ])
        .with_embedding(vec![1.0, 0.0, 0.0]);
        let chain = chain(&fx, provider);
        let reply = chain
            .reply(&input("suggest from what I loved"), &session())
            .await
            .unwrap();
        assert!(reply.contains("The Silmarillion"));
        assert!(!reply.contains("The Hobbit"));
    }

    #[tokio::test]
    async fn named_author_drives_suggestions() {
        let fx = fixture().await;
        let chain = chain(
            &fx,
            ScriptedProvider::new(&[
                r#"{"basis": "input", "dimension": null, "subject_kind": "author", "subject": "frank herbert"}"#,
            ]),
        );
        let reply = chain
            .reply(&input("books by frank herbert"), &session())
            .await
            .unwrap();
        assert!(reply.contains("Dune"));
    }

    #[tokio::test]
    async fn unknown_genre_gets_not_found_reply() {
        let fx = fixture().await;
        let chain = chain(
            &fx,
            ScriptedProvider::new(&[
                r#"{"basis": "input", "dimension": null, "subject_kind": "genre", "subject": "cooking"}"#,
            ]),
        );
        let reply = chain
            .reply(&input("cooking books"), &session())
            .await
            .unwrap();
        assert!(reply.contains("don't have a genre"));
    }

    #[tokio::test]
    async fn similar_to_named_book_excludes_the_anchor() {
        let fx = fixture().await;
        let provider = ScriptedProvider::new(&[
            r#"{"basis": "input", "dimension": null, "subject_kind": "book", "subject": "the hobbit"}"#,
        ])
        .with_embedding(vec![1.0, 0.0, 0.0]);
        let chain = chain(&fx, provider);
        let reply = chain
            .reply(&input("books like the hobbit"), &session())
            .await
            .unwrap();
        assert!(reply.contains("The Silmarillion"));
        assert!(!reply.contains("The Hobbit"));
    }
}
