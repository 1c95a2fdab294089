//! SQLite store backend.
//!
//! One database file holds the catalog (books/authors/genres), user
//! profiles, favorites, and read lists. The favorites and read-list tables
//! carry UNIQUE constraints on their (username, id) pairs, so concurrent
//! duplicate inserts collapse at the database: `INSERT OR IGNORE` plus
//! `rows_affected` tells `Inserted` apart from `AlreadyPresent`.

use async_trait::async_trait;
use pagewise_core::error::StoreError;
use pagewise_core::store::{
    Author, Book, BookStore, CatalogEntry, FavoriteKind, Genre, InsertOutcome, ProfileField,
    ReadListEntry, ReadStatus, UserProfile,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A SQLite-backed `BookStore`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and all tables are created automatically.
    /// Pass `":memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username  TEXT PRIMARY KEY,
                email     TEXT NOT NULL DEFAULT '',
                password  TEXT NOT NULL DEFAULT '',
                district  TEXT NOT NULL DEFAULT ''
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS genres (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                name  TEXT UNIQUE NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS authors (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                name  TEXT UNIQUE NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                page_count  INTEGER NOT NULL DEFAULT 0,
                rating      REAL NOT NULL DEFAULT 0.0,
                author_id   INTEGER NOT NULL REFERENCES authors(id),
                genre_id    INTEGER NOT NULL REFERENCES genres(id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS fav_authors (
                username   TEXT NOT NULL REFERENCES users(username),
                author_id  INTEGER NOT NULL REFERENCES authors(id),
                UNIQUE(username, author_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS fav_genres (
                username  TEXT NOT NULL REFERENCES users(username),
                genre_id  INTEGER NOT NULL REFERENCES genres(id),
                UNIQUE(username, genre_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS read_list (
                username  TEXT NOT NULL REFERENCES users(username),
                book_id   INTEGER NOT NULL REFERENCES books(id),
                status    TEXT NOT NULL,
                rating    INTEGER,
                UNIQUE(username, book_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_books_genre ON books(genre_id)",
            "CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id)",
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }

    // --- Seeding (used by onboarding and tests) ---

    pub async fn add_user(
        &self,
        username: &str,
        email: &str,
        district: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO users (username, email, district) VALUES (?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(district)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    pub async fn add_genre(&self, name: &str) -> Result<i64, StoreError> {
        sqlx::query("INSERT OR IGNORE INTO genres (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let row = sqlx::query("SELECT id FROM genres WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        row.try_get("id")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    pub async fn add_author(&self, name: &str) -> Result<i64, StoreError> {
        sqlx::query("INSERT OR IGNORE INTO authors (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let row = sqlx::query("SELECT id FROM authors WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        row.try_get("id")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    pub async fn add_book(
        &self,
        title: &str,
        author_id: i64,
        genre_id: i64,
        page_count: u32,
        rating: f32,
    ) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO books (title, page_count, rating, author_id, genre_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(page_count as i64)
        .bind(rating as f64)
        .bind(author_id)
        .bind(genre_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(result.last_insert_rowid())
    }

    fn row_to_book(row: &sqlx::sqlite::SqliteRow) -> Result<Book, StoreError> {
        Ok(Book {
            id: row
                .try_get("id")
                .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?,
            title: row
                .try_get("title")
                .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?,
            page_count: row
                .try_get::<i64, _>("page_count")
                .map_err(|e| StoreError::QueryFailed(format!("page_count column: {e}")))?
                as u32,
            rating: row
                .try_get::<f64, _>("rating")
                .map_err(|e| StoreError::QueryFailed(format!("rating column: {e}")))?
                as f32,
        })
    }
}

#[async_trait]
impl BookStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query("SELECT email, district FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        row.map(|row| {
            Ok(UserProfile {
                username: username.to_string(),
                email: row
                    .try_get("email")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                district: row
                    .try_get("district")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            })
        })
        .transpose()
    }

    async fn update_profile_field(
        &self,
        username: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<(), StoreError> {
        // Column names come from the closed ProfileField enum, never from
        // user text.
        let sql = match field {
            ProfileField::Username => "UPDATE users SET username = ? WHERE username = ?",
            ProfileField::Email => "UPDATE users SET email = ? WHERE username = ?",
            ProfileField::Password => "UPDATE users SET password = ? WHERE username = ?",
            ProfileField::District => "UPDATE users SET district = ? WHERE username = ?",
        };

        let result = sqlx::query(sql)
            .bind(value)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {username}")));
        }
        Ok(())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(Genre {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    name: row
                        .try_get("name")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn list_author_names(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT name FROM authors ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("name")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))
            })
            .collect()
    }

    async fn authors_by_genre(&self, genre: &str) -> Result<Vec<Author>, StoreError> {
        let rows = sqlx::query(
            "SELECT DISTINCT a.id, a.name FROM authors a \
             JOIN books b ON b.author_id = a.id \
             JOIN genres g ON g.id = b.genre_id \
             WHERE LOWER(g.name) = LOWER(?) ORDER BY a.name",
        )
        .bind(genre)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(Author {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    name: row
                        .try_get("name")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn books_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query(
            "SELECT b.id, b.title, b.page_count, b.rating FROM books b \
             JOIN genres g ON g.id = b.genre_id \
             WHERE LOWER(g.name) = LOWER(?) \
             ORDER BY b.rating DESC LIMIT ?",
        )
        .bind(genre)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_book).collect()
    }

    async fn books_by_author(&self, author: &str, limit: usize) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query(
            "SELECT b.id, b.title, b.page_count, b.rating FROM books b \
             JOIN authors a ON a.id = b.author_id \
             WHERE LOWER(a.name) = LOWER(?) \
             ORDER BY b.rating DESC LIMIT ?",
        )
        .bind(author)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_book).collect()
    }

    async fn book_by_title(&self, title: &str) -> Result<Option<Book>, StoreError> {
        let row = sqlx::query(
            "SELECT id, title, page_count, rating FROM books WHERE LOWER(title) = LOWER(?)",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        row.as_ref().map(Self::row_to_book).transpose()
    }

    async fn list_book_titles(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT title FROM books ORDER BY title")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("title")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))
            })
            .collect()
    }

    async fn catalog(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT b.id, b.title, b.page_count, b.rating, a.name AS author, g.name AS genre \
             FROM books b \
             JOIN authors a ON a.id = b.author_id \
             JOIN genres g ON g.id = b.genre_id \
             ORDER BY b.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(CatalogEntry {
                    book: Self::row_to_book(row)?,
                    author: row
                        .try_get("author")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    genre: row
                        .try_get("genre")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn favorite_authors(&self, username: &str) -> Result<Vec<Author>, StoreError> {
        let rows = sqlx::query(
            "SELECT a.id, a.name FROM authors a \
             JOIN fav_authors f ON f.author_id = a.id \
             WHERE f.username = ? ORDER BY a.name",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(Author {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    name: row
                        .try_get("name")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn favorite_genres(&self, username: &str) -> Result<Vec<Genre>, StoreError> {
        let rows = sqlx::query(
            "SELECT g.id, g.name FROM genres g \
             JOIN fav_genres f ON f.genre_id = g.id \
             WHERE f.username = ? ORDER BY g.name",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(Genre {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    name: row
                        .try_get("name")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn insert_favorite(
        &self,
        username: &str,
        kind: FavoriteKind,
        name: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let (lookup_sql, insert_sql) = match kind {
            FavoriteKind::Author => (
                "SELECT id FROM authors WHERE LOWER(name) = LOWER(?)",
                "INSERT OR IGNORE INTO fav_authors (username, author_id) VALUES (?, ?)",
            ),
            FavoriteKind::Genre => (
                "SELECT id FROM genres WHERE LOWER(name) = LOWER(?)",
                "INSERT OR IGNORE INTO fav_genres (username, genre_id) VALUES (?, ?)",
            ),
        };

        let row = sqlx::query(lookup_sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        let id: i64 = row
            .ok_or_else(|| StoreError::NotFound(format!("{} {name}", match kind {
                FavoriteKind::Author => "author",
                FavoriteKind::Genre => "genre",
            })))?
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let result = sqlx::query(insert_sql)
            .bind(username)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    async fn read_list(&self, username: &str) -> Result<Vec<ReadListEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT r.book_id, b.title, r.status, r.rating FROM read_list r \
             JOIN books b ON b.id = r.book_id \
             WHERE r.username = ?",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let status_text: String = row
                    .try_get("status")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
                Ok(ReadListEntry {
                    book_id: row
                        .try_get("book_id")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    title: row
                        .try_get("title")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?,
                    status: ReadStatus::from_str(&status_text)?,
                    rating: row
                        .try_get::<Option<i64>, _>("rating")
                        .map_err(|e| StoreError::QueryFailed(e.to_string()))?
                        .map(|r| r as u8),
                })
            })
            .collect()
    }

    async fn insert_read_list(
        &self,
        username: &str,
        book_id: i64,
        status: ReadStatus,
        rating: Option<u8>,
    ) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO read_list (username, book_id, status, rating) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(book_id)
        .bind(status.label())
        .bind(rating.map(|r| r as i64))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    async fn highly_rated_titles(
        &self,
        username: &str,
        min_rating: u8,
    ) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT b.title FROM read_list r \
             JOIN books b ON b.id = r.book_id \
             WHERE r.username = ? AND r.rating >= ?",
        )
        .bind(username)
        .bind(min_rating as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("title")
                    .map_err(|e| StoreError::QueryFailed(e.to_string()))
            })
            .collect()
    }

    async fn unread_books_in_genres(
        &self,
        username: &str,
        genres: &[String],
        min_rating: f32,
        limit: usize,
    ) -> Result<Vec<Book>, StoreError> {
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["LOWER(?)"; genres.len()].join(", ");
        let sql = format!(
            "SELECT b.id, b.title, b.page_count, b.rating FROM books b \
             JOIN genres g ON g.id = b.genre_id \
             WHERE LOWER(g.name) IN ({placeholders}) \
               AND b.rating > ? \
               AND b.id NOT IN (SELECT book_id FROM read_list WHERE username = ?) \
             ORDER BY b.rating DESC LIMIT ?"
        );

        let mut query = sqlx::query(&sql);
        for genre in genres {
            query = query.bind(genre);
        }
        let rows = query
            .bind(min_rating as f64)
            .bind(username)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_book).collect()
    }

    async fn unread_books_by_authors(
        &self,
        username: &str,
        authors: &[String],
        min_rating: f32,
        limit: usize,
    ) -> Result<Vec<Book>, StoreError> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["LOWER(?)"; authors.len()].join(", ");
        let sql = format!(
            "SELECT b.id, b.title, b.page_count, b.rating FROM books b \
             JOIN authors a ON a.id = b.author_id \
             WHERE LOWER(a.name) IN ({placeholders}) \
               AND b.rating > ? \
               AND b.id NOT IN (SELECT book_id FROM read_list WHERE username = ?) \
             ORDER BY b.rating DESC LIMIT ?"
        );

        let mut query = sqlx::query(&sql);
        for author in authors {
            query = query.bind(author);
        }
        let rows = query
            .bind(min_rating as f64)
            .bind(username)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_book).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        store
            .add_user("alice", "alice@example.com", "Lisboa")
            .await
            .unwrap();

        let fantasy = store.add_genre("Fantasy").await.unwrap();
        let scifi = store.add_genre("Science Fiction").await.unwrap();
        let tolkien = store.add_author("J.R.R. Tolkien").await.unwrap();
        let herbert = store.add_author("Frank Herbert").await.unwrap();

        store
            .add_book("The Hobbit", tolkien, fantasy, 310, 4.7)
            .await
            .unwrap();
        store
            .add_book("The Silmarillion", tolkien, fantasy, 365, 3.9)
            .await
            .unwrap();
        store
            .add_book("Dune", herbert, scifi, 412, 4.6)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn profile_roundtrip() {
        let store = seeded_store().await;

        let profile = store.get_profile("alice").await.unwrap().unwrap();
        assert_eq!(profile.email, "alice@example.com");

        store
            .update_profile_field("alice", ProfileField::District, "Porto")
            .await
            .unwrap();
        let profile = store.get_profile("alice").await.unwrap().unwrap();
        assert_eq!(profile.district, "Porto");
    }

    #[tokio::test]
    async fn update_unknown_user_is_not_found() {
        let store = seeded_store().await;
        let result = store
            .update_profile_field("nobody", ProfileField::Email, "x@example.com")
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_favorite_collapses_to_one_row() {
        let store = seeded_store().await;

        let first = store
            .insert_favorite("alice", FavoriteKind::Genre, "Fantasy")
            .await
            .unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        let second = store
            .insert_favorite("alice", FavoriteKind::Genre, "Fantasy")
            .await
            .unwrap();
        assert_eq!(second, InsertOutcome::AlreadyPresent);

        let favorites = store.favorite_genres("alice").await.unwrap();
        assert_eq!(favorites.len(), 1);
    }

    #[tokio::test]
    async fn favorite_lookup_is_case_insensitive() {
        let store = seeded_store().await;
        let outcome = store
            .insert_favorite("alice", FavoriteKind::Author, "j.r.r. tolkien")
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);
        let favorites = store.favorite_authors("alice").await.unwrap();
        assert_eq!(favorites[0].name, "J.R.R. Tolkien");
    }

    #[tokio::test]
    async fn read_list_roundtrip_and_dedupe() {
        let store = seeded_store().await;
        let dune = store.book_by_title("dune").await.unwrap().unwrap();

        let first = store
            .insert_read_list("alice", dune.id, ReadStatus::Finished, Some(5))
            .await
            .unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        let second = store
            .insert_read_list("alice", dune.id, ReadStatus::Abandoned, None)
            .await
            .unwrap();
        assert_eq!(second, InsertOutcome::AlreadyPresent);

        let entries = store.read_list("alice").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, ReadStatus::Finished);
        assert_eq!(entries[0].rating, Some(5));
    }

    #[tokio::test]
    async fn unread_books_in_genres_excludes_read_and_low_rated() {
        let store = seeded_store().await;
        let hobbit = store.book_by_title("The Hobbit").await.unwrap().unwrap();
        store
            .insert_read_list("alice", hobbit.id, ReadStatus::Finished, Some(5))
            .await
            .unwrap();

        // Silmarillion (3.9) clears a 3.5 floor, Hobbit is excluded as read
        let books = store
            .unread_books_in_genres("alice", &["Fantasy".to_string()], 3.5, 10)
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "The Silmarillion");

        // with a 4.0 floor nothing is left
        let books = store
            .unread_books_in_genres("alice", &["Fantasy".to_string()], 4.0, 10)
            .await
            .unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn unread_books_by_authors_filters() {
        let store = seeded_store().await;
        let books = store
            .unread_books_by_authors("alice", &["J.R.R. Tolkien".to_string()], 4.0, 10)
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "The Hobbit");
    }

    #[tokio::test]
    async fn catalog_listings() {
        let store = seeded_store().await;

        let genres = store.list_genres().await.unwrap();
        assert_eq!(genres.len(), 2);

        let authors = store.list_author_names().await.unwrap();
        assert_eq!(authors.len(), 2);

        let fantasy_authors = store.authors_by_genre("Fantasy").await.unwrap();
        assert_eq!(fantasy_authors.len(), 1);
        assert_eq!(fantasy_authors[0].name, "J.R.R. Tolkien");

        let books = store.books_by_author("Frank Herbert", 10).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Dune");

        let catalog = store.catalog().await.unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog
            .iter()
            .any(|e| e.book.title == "Dune" && e.author == "Frank Herbert" && e.genre == "Science Fiction"));
    }
}
