//! TranscriptStore trait: durable conversation memory.
//!
//! Each (user, conversation) pair owns one ordered transcript. The store
//! persists and restores it; turn-level bookkeeping (append, locking,
//! explicit flush) lives in the memory crate's manager.

use crate::error::MemoryError;
use crate::turn::{SessionKey, Turn};
use async_trait::async_trait;

/// Durable persistence for conversation transcripts.
///
/// Implementations: in-memory (tests, ephemeral sessions), JSONL files.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Load the saved transcript for a session. A session that has never
    /// been saved loads as empty.
    async fn load(&self, key: &SessionKey) -> Result<Vec<Turn>, MemoryError>;

    /// Persist the full transcript for a session, replacing any previous
    /// saved state.
    async fn save(&self, key: &SessionKey, turns: &[Turn]) -> Result<(), MemoryError>;
}
