//! BookStore trait: the catalog and user-data access layer.
//!
//! Profiles, the book/author/genre catalog, favorites, and read lists all
//! live behind this trait. Uniqueness of (user, favorite) and (user, book)
//! pairs is the store's responsibility: a duplicate insert reports
//! `AlreadyPresent` instead of inserting a second row or erroring.
//!
//! Implementations: in-memory (tests, demos), SQLite via sqlx.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub page_count: u32,
    pub rating: f32,
}

/// An author in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// A genre in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A user's profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub district: String,
}

/// How far the user got with a read-list book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    Finished,
    InProgress,
    Abandoned,
}

impl ReadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReadStatus::Finished => "finished",
            ReadStatus::InProgress => "in_progress",
            ReadStatus::Abandoned => "abandoned",
        }
    }
}

impl std::str::FromStr for ReadStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished" => Ok(ReadStatus::Finished),
            "in_progress" => Ok(ReadStatus::InProgress),
            "abandoned" => Ok(ReadStatus::Abandoned),
            other => Err(StoreError::QueryFailed(format!(
                "unknown read status: {other}"
            ))),
        }
    }
}

/// One entry on a user's read list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadListEntry {
    pub book_id: i64,
    pub title: String,
    pub status: ReadStatus,
    /// The user's own rating, 1-5.
    pub rating: Option<u8>,
}

/// Which kind of favorite the user is recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteKind {
    Author,
    Genre,
}

/// A profile field the user may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Username,
    Email,
    Password,
    District,
}

impl ProfileField {
    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Username => "username",
            ProfileField::Email => "email",
            ProfileField::Password => "password",
            ProfileField::District => "district",
        }
    }
}

/// One catalog row with its author and genre names, for bulk export
/// (embedding index construction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub book: Book,
    pub author: String,
    pub genre: String,
}

/// The outcome of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// The row already existed; nothing changed.
    AlreadyPresent,
}

/// The catalog / user-data access trait.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    // --- Profile ---

    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn update_profile_field(
        &self,
        username: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<(), StoreError>;

    // --- Catalog ---

    async fn list_genres(&self) -> Result<Vec<Genre>, StoreError>;

    async fn list_author_names(&self) -> Result<Vec<String>, StoreError>;

    async fn authors_by_genre(&self, genre: &str) -> Result<Vec<Author>, StoreError>;

    async fn books_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Book>, StoreError>;

    async fn books_by_author(&self, author: &str, limit: usize) -> Result<Vec<Book>, StoreError>;

    async fn book_by_title(&self, title: &str) -> Result<Option<Book>, StoreError>;

    async fn list_book_titles(&self) -> Result<Vec<String>, StoreError>;

    /// The full catalog with author and genre names attached.
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    // --- Favorites ---

    async fn favorite_authors(&self, username: &str) -> Result<Vec<Author>, StoreError>;

    async fn favorite_genres(&self, username: &str) -> Result<Vec<Genre>, StoreError>;

    /// Record a favorite. Duplicate (user, favorite) pairs are detected by
    /// the store and reported as `AlreadyPresent`.
    async fn insert_favorite(
        &self,
        username: &str,
        kind: FavoriteKind,
        name: &str,
    ) -> Result<InsertOutcome, StoreError>;

    // --- Read list ---

    async fn read_list(&self, username: &str) -> Result<Vec<ReadListEntry>, StoreError>;

    /// Add a book to the user's read list, `AlreadyPresent` on duplicates.
    async fn insert_read_list(
        &self,
        username: &str,
        book_id: i64,
        status: ReadStatus,
        rating: Option<u8>,
    ) -> Result<InsertOutcome, StoreError>;

    /// Titles on the user's read list rated at or above `min_rating`.
    /// Backs the favorites-based suggestion path.
    async fn highly_rated_titles(
        &self,
        username: &str,
        min_rating: u8,
    ) -> Result<Vec<String>, StoreError>;

    /// Books in the given genres the user has not already read, with a
    /// catalog rating above `min_rating`.
    async fn unread_books_in_genres(
        &self,
        username: &str,
        genres: &[String],
        min_rating: f32,
        limit: usize,
    ) -> Result<Vec<Book>, StoreError>;

    /// Books by the given authors the user has not already read, with a
    /// catalog rating above `min_rating`.
    async fn unread_books_by_authors(
        &self,
        username: &str,
        authors: &[String],
        min_rating: f32,
        limit: usize,
    ) -> Result<Vec<Book>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn read_status_roundtrips() {
        for status in [
            ReadStatus::Finished,
            ReadStatus::InProgress,
            ReadStatus::Abandoned,
        ] {
            assert_eq!(ReadStatus::from_str(status.label()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_read_status_is_an_error() {
        assert!(ReadStatus::from_str("skimmed").is_err());
    }

    #[test]
    fn favorite_kind_serde_labels() {
        assert_eq!(
            serde_json::to_string(&FavoriteKind::Genre).unwrap(),
            "\"genre\""
        );
        let back: FavoriteKind = serde_json::from_str("\"author\"").unwrap();
        assert_eq!(back, FavoriteKind::Author);
    }
}
