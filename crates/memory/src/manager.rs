//! The per-conversation memory manager.
//!
//! Sits between the bot session and the `TranscriptStore`: transcripts are
//! loaded lazily on first access, appended to in-process, and written back
//! only on an explicit flush. The manager also owns the per-conversation
//! turn locks; holding a session's lock serializes its turns while leaving
//! other sessions free to run concurrently.

use pagewise_core::error::MemoryError;
use pagewise_core::memory::TranscriptStore;
use pagewise_core::turn::{SessionKey, Turn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub struct MemoryManager {
    store: Arc<dyn TranscriptStore>,
    cache: Mutex<HashMap<SessionKey, Vec<Turn>>>,
    locks: Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl MemoryManager {
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The turn lock for a session. The caller holds the returned mutex for
    /// the duration of one turn.
    pub async fn turn_lock(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Current transcript for a session, loading from the store on first
    /// access.
    pub async fn history(&self, key: &SessionKey) -> Result<Vec<Turn>, MemoryError> {
        let mut cache = self.cache.lock().await;
        if let Some(turns) = cache.get(key) {
            return Ok(turns.clone());
        }

        let turns = self.store.load(key).await?;
        debug!(session = %key, turns = turns.len(), "Loaded transcript");
        cache.insert(key.clone(), turns.clone());
        Ok(turns)
    }

    /// Append one turn to the in-process transcript. Not durable until
    /// `flush` is called.
    pub async fn append(&self, key: &SessionKey, turn: Turn) -> Result<(), MemoryError> {
        let mut cache = self.cache.lock().await;
        if !cache.contains_key(key) {
            let loaded = self.store.load(key).await?;
            cache.insert(key.clone(), loaded);
        }
        cache
            .get_mut(key)
            .ok_or_else(|| MemoryError::Storage("session cache missing after load".into()))?
            .push(turn);
        Ok(())
    }

    /// Persist a session's transcript through the store.
    pub async fn flush(&self, key: &SessionKey) -> Result<(), MemoryError> {
        let cache = self.cache.lock().await;
        let Some(turns) = cache.get(key) else {
            return Ok(()); // nothing was ever loaded or appended
        };
        debug!(session = %key, turns = turns.len(), "Flushing transcript");
        self.store.save(key, turns).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryTranscripts;

    fn manager() -> (MemoryManager, Arc<InMemoryTranscripts>) {
        let store = Arc::new(InMemoryTranscripts::new());
        (MemoryManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn history_lazily_loads_saved_transcript() {
        let (manager, store) = manager();
        let key = SessionKey::new("alice", "c1");

        store
            .save(&key, &[Turn::user("earlier"), Turn::assistant("reply")])
            .await
            .unwrap();

        let history = manager.history(&key).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "earlier");
    }

    #[tokio::test]
    async fn append_is_not_durable_until_flush() {
        let (manager, store) = manager();
        let key = SessionKey::new("alice", "c1");

        manager.append(&key, Turn::user("hi")).await.unwrap();
        manager
            .append(&key, Turn::assistant("hello"))
            .await
            .unwrap();

        assert!(store.load(&key).await.unwrap().is_empty());

        manager.flush(&key).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn append_preserves_saved_prefix() {
        let (manager, store) = manager();
        let key = SessionKey::new("alice", "c1");

        store.save(&key, &[Turn::user("old turn")]).await.unwrap();

        manager.append(&key, Turn::user("new turn")).await.unwrap();
        manager.flush(&key).await.unwrap();

        let saved = store.load(&key).await.unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].content, "old turn");
        assert_eq!(saved[1].content, "new turn");
    }

    #[tokio::test]
    async fn flush_of_untouched_session_is_a_noop() {
        let (manager, _) = manager();
        let key = SessionKey::new("bob", "never-used");
        manager.flush(&key).await.unwrap();
    }

    #[tokio::test]
    async fn turn_lock_serializes_same_session() {
        let (manager, _) = manager();
        let key = SessionKey::new("alice", "c1");

        let lock = manager.turn_lock(&key).await;
        let guard = lock.lock().await;

        // same key hands back the same mutex
        let lock2 = manager.turn_lock(&key).await;
        assert!(lock2.try_lock().is_err());

        drop(guard);
        assert!(lock2.try_lock().is_ok());
    }

    #[tokio::test]
    async fn different_sessions_do_not_share_locks() {
        let (manager, _) = manager();
        let a = manager.turn_lock(&SessionKey::new("alice", "c1")).await;
        let b = manager.turn_lock(&SessionKey::new("alice", "c2")).await;

        let _guard = a.lock().await;
        assert!(b.try_lock().is_ok());
    }
}
