//! Catalog and user-data storage for Pagewise.
//!
//! All backends implement `pagewise_core::BookStore`. Uniqueness of
//! favorites and read-list rows is enforced here, at the data layer, so
//! concurrent duplicate inserts collapse to one row no matter how they
//! interleave.

pub mod fuzzy;
pub mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod vector;

pub use fuzzy::best_match;
pub use in_memory::InMemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use vector::{centroid, cosine_similarity, VectorIndex};
