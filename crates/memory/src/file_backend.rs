//! File-based transcript backend: persistent JSON-lines storage.
//!
//! One JSONL file per (user, conversation) under a root directory:
//! `<root>/<username>/<conversation_id>.jsonl`. Each line is one
//! JSON-encoded `Turn`. Simple, portable, human-inspectable.

use async_trait::async_trait;
use pagewise_core::error::MemoryError;
use pagewise_core::memory::TranscriptStore;
use pagewise_core::turn::{SessionKey, Turn};
use std::path::PathBuf;
use tracing::warn;

/// A file-backed transcript store using JSONL (one JSON object per line).
pub struct FileTranscripts {
    root: PathBuf,
}

impl FileTranscripts {
    /// Create a store rooted at `root`. Directories are created on first
    /// save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_path(&self, key: &SessionKey) -> PathBuf {
        self.root
            .join(sanitize(&key.username))
            .join(format!("{}.jsonl", sanitize(&key.conversation_id)))
    }
}

/// Session keys become path segments, so anything that isn't a plain
/// filename character is replaced.
fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl TranscriptStore for FileTranscripts {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, key: &SessionKey) -> Result<Vec<Turn>, MemoryError> {
        let path = self.file_path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Ok(Vec::new()), // never saved yet
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Turn>(line) {
                Ok(turn) => Some(turn),
                Err(e) => {
                    warn!(session = %key, error = %e, "Skipping corrupted transcript line");
                    None
                }
            })
            .collect())
    }

    async fn save(&self, key: &SessionKey, turns: &[Turn]) -> Result<(), MemoryError> {
        let path = self.file_path(key);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create transcript directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for turn in turns {
            let line = serde_json::to_string(turn)
                .map_err(|e| MemoryError::Storage(format!("Failed to serialize turn: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&path, &content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write transcript file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_roundtrip_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscripts::new(dir.path());
        let key = SessionKey::new("alice", "conv-1");

        let turns = vec![
            Turn::user("Suggest a book"),
            Turn::assistant("Try Dune."),
            Turn::user("Something lighter?"),
        ];
        store.save(&key, &turns).await.unwrap();

        let loaded = store.load(&key).await.unwrap();
        assert_eq!(loaded.len(), 3);
        for (a, b) in turns.iter().zip(loaded.iter()) {
            assert_eq!(a.role, b.role);
            assert_eq!(a.content, b.content);
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscripts::new(dir.path());
        let key = SessionKey::new("bob", "nothing-here");
        assert!(store.load(&key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscripts::new(dir.path());
        let key = SessionKey::new("alice", "conv-1");

        store.save(&key, &[Turn::user("first")]).await.unwrap();

        // append garbage by hand
        let path = store.file_path(&key);
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{ not json\n");
        let good = serde_json::to_string(&Turn::assistant("second")).unwrap();
        content.push_str(&good);
        content.push('\n');
        std::fs::write(&path, content).unwrap();

        let loaded = store.load(&key).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].content, "second");
    }

    #[tokio::test]
    async fn session_keys_become_safe_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscripts::new(dir.path());
        let key = SessionKey::new("../evil", "a/b");

        store.save(&key, &[Turn::user("hi")]).await.unwrap();

        let path = store.file_path(&key);
        assert!(path.starts_with(dir.path()));
        assert_eq!(store.load(&key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_replaces_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTranscripts::new(dir.path());
        let key = SessionKey::new("alice", "conv-1");

        store
            .save(&key, &[Turn::user("a"), Turn::assistant("b")])
            .await
            .unwrap();
        store.save(&key, &[Turn::user("only this")]).await.unwrap();

        let loaded = store.load(&key).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "only this");
    }
}
