//! Author suggestions, from favorite genres or a named genre.

use crate::chains::{bullet_list, extraction_miss, Composer};
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EnrichedInput, Provider, SessionContext,
};
use pagewise_providers::Extractor;
use pagewise_store::best_match;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

const EXTRACT_INSTRUCTIONS: &str = "The user wants author recommendations. Decide whether \
     they want authors based on their saved favorite genres (\"basis\": \"favorites\") or \
     authors in a genre they named in the message (\"basis\": \"input\").";

const FORMAT_HINT: &str = r#"{"basis": "favorites"|"input", "genre": "<genre name>"|null}"#;

/// Shown when the user has no favorite genres to work from.
pub const NO_FAVORITE_GENRES_REPLY: &str = "You haven't saved any favorite genres yet, so I \
     can't pick authors for you. Add a favorite genre, or name one and I'll suggest authors \
     who write in it.";

const COMPOSE_INSTRUCTIONS: &str = "You are a friendly book-recommendation assistant. \
     Present the listed author names as recommendations in a warm, short reply. Mention \
     only these authors; do not add others.";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Basis {
    Favorites,
    Input,
}

#[derive(Debug, Deserialize)]
struct AuthorQuery {
    basis: Basis,
    #[serde(default)]
    genre: Option<String>,
}

/// Handles the `suggest_authors` intent.
pub struct SuggestAuthorsChain {
    extractor: Extractor,
    composer: Composer,
    store: Arc<dyn BookStore>,
    limit: usize,
    fuzzy_threshold: f32,
}

impl SuggestAuthorsChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        store: Arc<dyn BookStore>,
        limit: usize,
        fuzzy_threshold: f32,
    ) -> Self {
        let model = model.into();
        Self {
            extractor: Extractor::new(Arc::clone(&provider), model.clone()),
            composer: Composer::new(provider, model),
            store,
            limit,
            fuzzy_threshold,
        }
    }

    /// Authors who write in the user's favorite genres, minus authors the
    /// user already marked as favorites.
    async fn from_favorites(&self, username: &str) -> Result<Option<Vec<String>>, ChainError> {
        let genres = self.store.favorite_genres(username).await?;
        if genres.is_empty() {
            return Ok(None);
        }

        let already: HashSet<String> = self
            .store
            .favorite_authors(username)
            .await?
            .into_iter()
            .map(|a| a.name)
            .collect();

        let mut names = Vec::new();
        let mut seen = HashSet::new();
        for genre in genres {
            for author in self.store.authors_by_genre(&genre.name).await? {
                if already.contains(&author.name) || !seen.insert(author.name.clone()) {
                    continue;
                }
                names.push(author.name);
                if names.len() >= self.limit {
                    return Ok(Some(names));
                }
            }
        }
        Ok(Some(names))
    }

    async fn from_named_genre(&self, genre: &str) -> Result<String, ChainError> {
        let genres = self.store.list_genres().await?;
        let names: Vec<String> = genres.into_iter().map(|g| g.name).collect();
        let Some((resolved, _)) = best_match(
            genre,
            names.iter().map(String::as_str),
            self.fuzzy_threshold,
        ) else {
            return Ok(format!("I don't have a genre called \"{genre}\"."));
        };

        let authors: Vec<String> = self
            .store
            .authors_by_genre(resolved)
            .await?
            .into_iter()
            .take(self.limit)
            .map(|a| a.name)
            .collect();
        if authors.is_empty() {
            Ok(format!("I don't have any authors listed under {resolved} yet."))
        } else {
            Ok(self.present(&authors).await)
        }
    }

    async fn present(&self, authors: &[String]) -> String {
        let listing = authors.join("\n");
        match self.composer.compose(COMPOSE_INSTRUCTIONS, &listing).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => bullet_list("Authors you might enjoy:", authors),
            Err(e) => {
                warn!(error = %e, "author suggestion composition failed, using plain list");
                bullet_list("Authors you might enjoy:", authors)
            }
        }
    }
}

#[async_trait]
impl Chain for SuggestAuthorsChain {
    fn name(&self) -> &str {
        "suggest_authors"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        let query: AuthorQuery = match self
            .extractor
            .extract(EXTRACT_INSTRUCTIONS, FORMAT_HINT, &input.text)
            .await
        {
            Ok(query) => query,
            Err(e) if extraction_miss(&e) => AuthorQuery {
                basis: Basis::Favorites,
                genre: None,
            },
            Err(e) => return Err(e.into()),
        };

        match (query.basis, query.genre) {
            (Basis::Input, Some(genre)) => self.from_named_genre(&genre).await,
            _ => match self.from_favorites(&session.username).await? {
                None => Ok(NO_FAVORITE_GENRES_REPLY.to_string()),
                Some(names) if names.is_empty() => Ok(
                    "You've already favorited every author I'd suggest from your genres. \
                     Name a genre and I'll dig further."
                        .to_string(),
                ),
                Some(names) => Ok(self.present(&names).await),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::testing::ScriptedProvider;
    use pagewise_core::{FavoriteKind, RawInput};
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
        let fantasy = store.add_genre("Fantasy").await;
        let tolkien = store.add_author("J.R.R. Tolkien").await;
        let rothfuss = store.add_author("Patrick Rothfuss").await;
        store.add_book("The Hobbit", tolkien, fantasy, 310, 4.7).await;
        store
            .add_book("The Name of the Wind", rothfuss, fantasy, 662, 4.5)
            .await;
        store
    }

    #[tokio::test]
    async fn no_favorite_genres_yields_guidance() {
        let chain = SuggestAuthorsChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"basis": "favorites", "genre": null}"#,
            ])),
            "m",
            seeded_store().await,
            5,
            0.7,
        );
        let reply = chain
            .reply(&input("suggest authors"), &session())
            .await
            .unwrap();
        assert_eq!(reply, NO_FAVORITE_GENRES_REPLY);
    }

    #[tokio::test]
    async fn favorite_genres_drive_author_picks() {
        let store = seeded_store().await;
        store
            .insert_favorite("alice", FavoriteKind::Genre, "Fantasy")
            .await
            .unwrap();
        // Tolkien is already a favorite, so only Rothfuss should be new.
        store
            .insert_favorite("alice", FavoriteKind::Author, "J.R.R. Tolkien")
            .await
            .unwrap();
        let chain = SuggestAuthorsChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"basis": "favorites", "genre": null}"#,
            ])),
            "m",
            store,
            5,
            0.7,
        );
        let reply = chain
            .reply(&input("new authors for me"), &session())
            .await
            .unwrap();
        assert!(reply.contains("Patrick Rothfuss"));
        assert!(!reply.contains("Tolkien"));
    }

    #[tokio::test]
    async fn named_genre_is_fuzzy_resolved() {
        let chain = SuggestAuthorsChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"basis": "input", "genre": "fantazy"}"#,
            ])),
            "m",
            seeded_store().await,
            5,
            0.7,
        );
        let reply = chain
            .reply(&input("who writes fantazy?"), &session())
            .await
            .unwrap();
        assert!(reply.contains("Tolkien") || reply.contains("Rothfuss"));
    }

    #[tokio::test]
    async fn unknown_genre_gets_not_found_reply() {
        let chain = SuggestAuthorsChain::new(
            Arc::new(ScriptedProvider::new(&[
                r#"{"basis": "input", "genre": "gastronomy"}"#,
            ])),
            "m",
            seeded_store().await,
            5,
            0.8,
        );
        let reply = chain
            .reply(&input("gastronomy authors"), &session())
            .await
            .unwrap();
        assert!(reply.contains("don't have a genre"));
    }
}
