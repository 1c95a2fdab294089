//! In-memory store: useful for testing and demo catalogs.

use async_trait::async_trait;
use pagewise_core::error::StoreError;
use pagewise_core::store::{
    Author, Book, BookStore, CatalogEntry, FavoriteKind, Genre, InsertOutcome, ProfileField,
    ReadListEntry, ReadStatus, UserProfile,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct UserRecord {
    email: String,
    password: String,
    district: String,
}

#[derive(Debug, Clone)]
struct CatalogBook {
    id: i64,
    title: String,
    page_count: u32,
    rating: f32,
    author_id: i64,
    genre_id: i64,
}

impl CatalogBook {
    fn to_book(&self) -> Book {
        Book {
            id: self.id,
            title: self.title.clone(),
            page_count: self.page_count,
            rating: self.rating,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    genres: Vec<Genre>,
    authors: Vec<Author>,
    books: Vec<CatalogBook>,
    fav_genres: HashSet<(String, i64)>,
    fav_authors: HashSet<(String, i64)>,
    read_list: HashMap<String, Vec<ReadListEntry>>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn genre_by_name(&self, name: &str) -> Option<&Genre> {
        self.genres
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
    }

    fn author_by_name(&self, name: &str) -> Option<&Author> {
        self.authors
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    fn read_book_ids(&self, username: &str) -> HashSet<i64> {
        self.read_list
            .get(username)
            .map(|entries| entries.iter().map(|e| e.book_id).collect())
            .unwrap_or_default()
    }
}

/// An in-memory `BookStore` over locked maps. Seedable for tests and demos.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding ---

    pub async fn add_user(
        &self,
        username: impl Into<String>,
        email: impl Into<String>,
        district: impl Into<String>,
    ) {
        let mut inner = self.inner.write().await;
        inner.users.insert(
            username.into(),
            UserRecord {
                email: email.into(),
                password: String::new(),
                district: district.into(),
            },
        );
    }

    pub async fn add_genre(&self, name: impl Into<String>) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        inner.genres.push(Genre {
            id,
            name: name.into(),
        });
        id
    }

    pub async fn add_author(&self, name: impl Into<String>) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        inner.authors.push(Author {
            id,
            name: name.into(),
        });
        id
    }

    pub async fn add_book(
        &self,
        title: impl Into<String>,
        author_id: i64,
        genre_id: i64,
        page_count: u32,
        rating: f32,
    ) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        inner.books.push(CatalogBook {
            id,
            title: title.into(),
            page_count,
            rating,
            author_id,
            genre_id,
        });
        id
    }
}

#[async_trait]
impl BookStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get_profile(&self, username: &str) -> Result<Option<UserProfile>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(username).map(|u| UserProfile {
            username: username.to_string(),
            email: u.email.clone(),
            district: u.district.clone(),
        }))
    }

    async fn update_profile_field(
        &self,
        username: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if field == ProfileField::Username {
            let record = inner
                .users
                .remove(username)
                .ok_or_else(|| StoreError::NotFound(format!("user {username}")))?;
            inner.users.insert(value.to_string(), record);
            return Ok(());
        }

        let record = inner
            .users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(format!("user {username}")))?;
        match field {
            ProfileField::Email => record.email = value.to_string(),
            ProfileField::Password => record.password = value.to_string(),
            ProfileField::District => record.district = value.to_string(),
            ProfileField::Username => unreachable!(),
        }
        Ok(())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, StoreError> {
        Ok(self.inner.read().await.genres.clone())
    }

    async fn list_author_names(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.authors.iter().map(|a| a.name.clone()).collect())
    }

    async fn authors_by_genre(&self, genre: &str) -> Result<Vec<Author>, StoreError> {
        let inner = self.inner.read().await;
        let Some(genre) = inner.genre_by_name(genre) else {
            return Ok(Vec::new());
        };
        let author_ids: HashSet<i64> = inner
            .books
            .iter()
            .filter(|b| b.genre_id == genre.id)
            .map(|b| b.author_id)
            .collect();
        Ok(inner
            .authors
            .iter()
            .filter(|a| author_ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn books_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Book>, StoreError> {
        let inner = self.inner.read().await;
        let Some(genre) = inner.genre_by_name(genre) else {
            return Ok(Vec::new());
        };
        let mut books: Vec<Book> = inner
            .books
            .iter()
            .filter(|b| b.genre_id == genre.id)
            .map(CatalogBook::to_book)
            .collect();
        books.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
        books.truncate(limit);
        Ok(books)
    }

    async fn books_by_author(&self, author: &str, limit: usize) -> Result<Vec<Book>, StoreError> {
        let inner = self.inner.read().await;
        let Some(author) = inner.author_by_name(author) else {
            return Ok(Vec::new());
        };
        let mut books: Vec<Book> = inner
            .books
            .iter()
            .filter(|b| b.author_id == author.id)
            .map(CatalogBook::to_book)
            .collect();
        books.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
        books.truncate(limit);
        Ok(books)
    }

    async fn book_by_title(&self, title: &str) -> Result<Option<Book>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .iter()
            .find(|b| b.title.eq_ignore_ascii_case(title))
            .map(CatalogBook::to_book))
    }

    async fn list_book_titles(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.books.iter().map(|b| b.title.clone()).collect())
    }

    async fn catalog(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .iter()
            .map(|b| CatalogEntry {
                book: b.to_book(),
                author: inner
                    .authors
                    .iter()
                    .find(|a| a.id == b.author_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                genre: inner
                    .genres
                    .iter()
                    .find(|g| g.id == b.genre_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn favorite_authors(&self, username: &str) -> Result<Vec<Author>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .authors
            .iter()
            .filter(|a| inner.fav_authors.contains(&(username.to_string(), a.id)))
            .cloned()
            .collect())
    }

    async fn favorite_genres(&self, username: &str) -> Result<Vec<Genre>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .genres
            .iter()
            .filter(|g| inner.fav_genres.contains(&(username.to_string(), g.id)))
            .cloned()
            .collect())
    }

    async fn insert_favorite(
        &self,
        username: &str,
        kind: FavoriteKind,
        name: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        let key = match kind {
            FavoriteKind::Author => {
                let author = inner
                    .author_by_name(name)
                    .ok_or_else(|| StoreError::NotFound(format!("author {name}")))?;
                (username.to_string(), author.id)
            }
            FavoriteKind::Genre => {
                let genre = inner
                    .genre_by_name(name)
                    .ok_or_else(|| StoreError::NotFound(format!("genre {name}")))?;
                (username.to_string(), genre.id)
            }
        };

        let set = match kind {
            FavoriteKind::Author => &mut inner.fav_authors,
            FavoriteKind::Genre => &mut inner.fav_genres,
        };
        if set.insert(key) {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    async fn read_list(&self, username: &str) -> Result<Vec<ReadListEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.read_list.get(username).cloned().unwrap_or_default())
    }

    async fn insert_read_list(
        &self,
        username: &str,
        book_id: i64,
        status: ReadStatus,
        rating: Option<u8>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        let title = inner
            .books
            .iter()
            .find(|b| b.id == book_id)
            .map(|b| b.title.clone())
            .ok_or_else(|| StoreError::NotFound(format!("book id {book_id}")))?;

        let entries = inner.read_list.entry(username.to_string()).or_default();
        if entries.iter().any(|e| e.book_id == book_id) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        entries.push(ReadListEntry {
            book_id,
            title,
            status,
            rating,
        });
        Ok(InsertOutcome::Inserted)
    }

    async fn highly_rated_titles(
        &self,
        username: &str,
        min_rating: u8,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .read_list
            .get(username)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.rating.is_some_and(|r| r >= min_rating))
                    .map(|e| e.title.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn unread_books_in_genres(
        &self,
        username: &str,
        genres: &[String],
        min_rating: f32,
        limit: usize,
    ) -> Result<Vec<Book>, StoreError> {
        let inner = self.inner.read().await;
        let genre_ids: HashSet<i64> = genres
            .iter()
            .filter_map(|name| inner.genre_by_name(name))
            .map(|g| g.id)
            .collect();
        let read = inner.read_book_ids(username);

        let mut books: Vec<Book> = inner
            .books
            .iter()
            .filter(|b| {
                genre_ids.contains(&b.genre_id) && b.rating > min_rating && !read.contains(&b.id)
            })
            .map(CatalogBook::to_book)
            .collect();
        books.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
        books.truncate(limit);
        Ok(books)
    }

    async fn unread_books_by_authors(
        &self,
        username: &str,
        authors: &[String],
        min_rating: f32,
        limit: usize,
    ) -> Result<Vec<Book>, StoreError> {
        let inner = self.inner.read().await;
        let author_ids: HashSet<i64> = authors
            .iter()
            .filter_map(|name| inner.author_by_name(name))
            .map(|a| a.id)
            .collect();
        let read = inner.read_book_ids(username);

        let mut books: Vec<Book> = inner
            .books
            .iter()
            .filter(|b| {
                author_ids.contains(&b.author_id) && b.rating > min_rating && !read.contains(&b.id)
            })
            .map(CatalogBook::to_book)
            .collect();
        books.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
        books.truncate(limit);
        Ok(books)
    }
}
