//! # Pagewise Core
//!
//! Domain types, traits, and error definitions for the Pagewise
//! book-recommendation assistant. This crate has **zero framework
//! dependencies**: it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod chain;
pub mod error;
pub mod intent;
pub mod memory;
pub mod provider;
pub mod store;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use chain::{Chain, IntentClassifier};
pub use error::{ChainError, Error, MemoryError, ProviderError, Result, StoreError};
pub use intent::{Classification, Intent, IntentCandidate};
pub use memory::TranscriptStore;
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, GenerationRequest, GenerationResponse, PromptMessage,
    Provider, Usage,
};
pub use store::{
    Author, Book, BookStore, CatalogEntry, FavoriteKind, Genre, InsertOutcome, ProfileField,
    ReadListEntry, ReadStatus, UserProfile,
};
pub use turn::{EnrichedInput, RawInput, Role, SafetyVerdict, SessionContext, SessionKey, Turn};
