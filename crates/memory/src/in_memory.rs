//! In-memory transcript backend: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use pagewise_core::error::MemoryError;
use pagewise_core::memory::TranscriptStore;
use pagewise_core::turn::{SessionKey, Turn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A transcript store that keeps everything in a map. Nothing survives the
/// process.
#[derive(Clone, Default)]
pub struct InMemoryTranscripts {
    sessions: Arc<RwLock<HashMap<SessionKey, Vec<Turn>>>>,
}

impl InMemoryTranscripts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscripts {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, key: &SessionKey) -> Result<Vec<Turn>, MemoryError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, key: &SessionKey, turns: &[Turn]) -> Result<(), MemoryError> {
        self.sessions
            .write()
            .await
            .insert(key.clone(), turns.to_vec());
        Ok(())
    }
}
